#![forbid(unsafe_code)]

use std::fs::Metadata;
use std::ops::Range;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::tar::error::{TarError, TarResult};
use crate::tar::format::{field, Block, EntryType, BLOCK_SIZE, MAGIC, VERSION};
use crate::tar::identity::IdentityResolver;
use crate::tar::path::{stored_name, truncate_str};

/// Metadata of one archive member, as carried by its header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub uname: String,
    pub gname: String,
    pub size: u64,
    pub mtime: u64,
    pub entry_type: EntryType,
    pub devmajor: u32,
    pub devminor: u32,
}

impl Header {
    /// Stats `path` and builds the header recorded under `name`.
    pub fn from_path(name: &str, path: &Path, ids: &dyn IdentityResolver) -> TarResult<Self> {
        let meta = std::fs::metadata(path).map_err(|source| TarError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_metadata(name, &meta, ids)
    }

    pub fn from_metadata(name: &str, meta: &Metadata, ids: &dyn IdentityResolver) -> TarResult<Self> {
        let uid = meta.uid();
        let gid = meta.gid();
        let uname = ids
            .resolve_owner(uid)
            .ok_or(TarError::OwnerLookup { uid })?;
        let gname = ids
            .resolve_group(gid)
            .ok_or(TarError::GroupLookup { gid })?;

        Ok(Self {
            name: stored_name(name).to_string(),
            mode: meta.mode() & 0o7777,
            uid,
            gid,
            uname: truncate_str(&uname, field::UNAME.len()).to_string(),
            gname: truncate_str(&gname, field::GNAME.len()).to_string(),
            size: meta.len(),
            mtime: u64::try_from(meta.mtime()).unwrap_or(0),
            entry_type: EntryType::Regular,
            devmajor: 0,
            devminor: 0,
        })
    }

    /// Serializes into a header block. The checksum is filled in last,
    /// over the already populated fields.
    pub fn encode(&self) -> TarResult<Block> {
        let mut block = [0u8; BLOCK_SIZE];

        put_str(&mut block, field::NAME, &self.name);
        put_octal(&mut block, field::MODE, "mode", self.mode.into())?;
        put_octal(&mut block, field::UID, "uid", self.uid.into())?;
        put_octal(&mut block, field::GID, "gid", self.gid.into())?;
        put_octal(&mut block, field::SIZE, "size", self.size)?;
        put_octal(&mut block, field::MTIME, "mtime", self.mtime)?;
        block[field::TYPEFLAG] = self.entry_type as u8;
        block[field::MAGIC].copy_from_slice(&MAGIC);
        block[field::VERSION].copy_from_slice(&VERSION);
        put_str(&mut block, field::UNAME, &self.uname);
        put_str(&mut block, field::GNAME, &self.gname);
        put_octal(&mut block, field::DEVMAJOR, "devmajor", self.devmajor.into())?;
        put_octal(&mut block, field::DEVMINOR, "devminor", self.devminor.into())?;

        let sum = checksum(&block);
        put_octal(&mut block, field::CHKSUM, "checksum", sum.into())?;
        Ok(block)
    }

    pub fn decode(block: &Block) -> TarResult<Self> {
        if block[field::MAGIC] != MAGIC || block[field::VERSION] != VERSION {
            return Err(TarError::MalformedHeader("not a ustar header".into()));
        }

        let stored = get_octal(block, field::CHKSUM, "checksum")?;
        let computed = checksum(block);
        if stored != u64::from(computed) {
            return Err(TarError::MalformedHeader(format!(
                "checksum mismatch: stored {stored:o}, computed {computed:o}"
            )));
        }

        let flag = block[field::TYPEFLAG];
        let entry_type = EntryType::from_flag(flag)
            .ok_or_else(|| TarError::MalformedHeader(format!("unsupported type flag {flag:#04x}")))?;

        Ok(Self {
            name: get_str(block, field::NAME),
            mode: get_u32(block, field::MODE, "mode")?,
            uid: get_u32(block, field::UID, "uid")?,
            gid: get_u32(block, field::GID, "gid")?,
            uname: get_str(block, field::UNAME),
            gname: get_str(block, field::GNAME),
            size: get_octal(block, field::SIZE, "size")?,
            mtime: get_octal(block, field::MTIME, "mtime")?,
            entry_type,
            devmajor: get_u32(block, field::DEVMAJOR, "devmajor")?,
            devminor: get_u32(block, field::DEVMINOR, "devminor")?,
        })
    }
}

/// Sum of all header bytes, with the checksum field itself read as spaces.
pub fn checksum(block: &Block) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if field::CHKSUM.contains(&i) {
                u32::from(b' ')
            } else {
                u32::from(b)
            }
        })
        .sum()
}

/// Copies at most `range.len()` bytes; shorter strings stay NUL padded.
fn put_str(block: &mut Block, range: Range<usize>, s: &str) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(range.len());
    block[range.start..range.start + n].copy_from_slice(&bytes[..n]);
}

/// Zero-padded octal digits filling all but the last byte, which is NUL.
fn put_octal(block: &mut Block, range: Range<usize>, name: &'static str, value: u64) -> TarResult<()> {
    let digits = range.len() - 1;
    if value >> (3 * digits) != 0 {
        return Err(TarError::FieldOverflow { field: name, value });
    }
    let text = format!("{value:0digits$o}");
    block[range.start..range.start + digits].copy_from_slice(text.as_bytes());
    block[range.end - 1] = 0;
    Ok(())
}

fn get_str(block: &Block, range: Range<usize>) -> String {
    let raw = &block[range];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Accepts leading spaces and a NUL or space terminator.
fn get_octal(block: &Block, range: Range<usize>, name: &str) -> TarResult<u64> {
    let digits = block[range]
        .iter()
        .skip_while(|&&b| b == b' ')
        .take_while(|&&b| b != 0 && b != b' ');

    let mut value: u64 = 0;
    for &b in digits {
        if !(b'0'..=b'7').contains(&b) {
            return Err(TarError::MalformedHeader(format!("{name} is not octal")));
        }
        value = value
            .checked_mul(8)
            .map(|v| v + u64::from(b - b'0'))
            .ok_or_else(|| TarError::MalformedHeader(format!("{name} overflows")))?;
    }
    Ok(value)
}

fn get_u32(block: &Block, range: Range<usize>, name: &str) -> TarResult<u32> {
    u32::try_from(get_octal(block, range, name)?)
        .map_err(|_| TarError::MalformedHeader(format!("{name} out of range")))
}
