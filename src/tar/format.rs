#![forbid(unsafe_code)]

use std::ops::Range;

/// Every header and every content run is aligned to this.
pub const BLOCK_SIZE: usize = 512;

/// Number of all-zero blocks terminating an archive.
pub const FOOTER_BLOCKS: usize = 2;

pub const FOOTER_LEN: u64 = (BLOCK_SIZE * FOOTER_BLOCKS) as u64;

/// ustar signature and revision.
pub const MAGIC: [u8; 6] = *b"ustar\0";
pub const VERSION: [u8; 2] = *b"00";

pub type Block = [u8; BLOCK_SIZE];

/// ustar header layout (offsets into a 512-byte header block):
/// - name        0..100   NUL-padded, no NUL when exactly 100 bytes
/// - mode      100..108   octal
/// - uid       108..116   octal
/// - gid       116..124   octal
/// - size      124..136   octal
/// - mtime     136..148   octal
/// - chksum    148..156   octal
/// - typeflag  156
/// - linkname  157..257   unused
/// - magic     257..263
/// - version   263..265
/// - uname     265..297
/// - gname     297..329
/// - devmajor  329..337   octal
/// - devminor  337..345   octal
/// - prefix    345..500   unused
pub(crate) mod field {
    use super::Range;

    pub const NAME: Range<usize> = 0..100;
    pub const MODE: Range<usize> = 100..108;
    pub const UID: Range<usize> = 108..116;
    pub const GID: Range<usize> = 116..124;
    pub const SIZE: Range<usize> = 124..136;
    pub const MTIME: Range<usize> = 136..148;
    pub const CHKSUM: Range<usize> = 148..156;
    pub const TYPEFLAG: usize = 156;
    pub const MAGIC: Range<usize> = 257..263;
    pub const VERSION: Range<usize> = 263..265;
    pub const UNAME: Range<usize> = 265..297;
    pub const GNAME: Range<usize> = 297..329;
    pub const DEVMAJOR: Range<usize> = 329..337;
    pub const DEVMINOR: Range<usize> = 337..345;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryType {
    Regular = b'0',
    Directory = b'5',
}

impl EntryType {
    pub(crate) fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            // pre-POSIX archives mark regular files with NUL
            b'0' | 0 => Some(EntryType::Regular),
            b'5' => Some(EntryType::Directory),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Regular => "file",
            EntryType::Directory => "dir",
        }
    }
}

/// Public view of an archive member (for long listings, inspectors, etc.).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub entry_type: EntryType,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub uname: String,
    pub gname: String,
    pub size: u64,
    pub mtime: u64,
    /// Byte offset of the member's content within the archive.
    pub content_offset: u64,
}
