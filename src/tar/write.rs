#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::tar::error::{MemberFailure, Phase, TarError, TarResult};
use crate::tar::header::Header;
use crate::tar::identity::IdentityResolver;
use crate::tar::io::{write_footer, write_padded};
use crate::tar::path::source_path;

/// Archive layout:
/// - per member, in the order given:
///   - [header block 512]
///   - [content, zero padded to a 512 multiple]
/// - footer:
///   - [2 zero blocks]
///
/// Creation is fail-fast: the first member that cannot be encoded or read
/// aborts with that member's name. Whatever was already written stays on
/// disk without a footer.
pub fn create(
    archive: &Path,
    names: &[String],
    root: &Path,
    ids: &dyn IdentityResolver,
) -> TarResult<()> {
    info!("creating {} with {} member(s)", archive.display(), names.len());

    let mut out = BufWriter::new(File::create(archive)?);
    for name in names {
        write_member(&mut out, name, root, ids).map_err(|f| TarError::Member(Box::new(f)))?;
    }
    write_footer(&mut out)?;
    out.flush()?;
    Ok(())
}

/// Encodes one member and appends its header and content to `out`.
///
/// Content is read before anything is written, so a member that fails in
/// either phase leaves `out` untouched.
pub(crate) fn write_member(
    out: &mut dyn Write,
    name: &str,
    root: &Path,
    ids: &dyn IdentityResolver,
) -> Result<(), MemberFailure> {
    let path = source_path(root, name);

    let header = Header::from_path(name, &path, ids)
        .map_err(|e| MemberFailure::new(name, Phase::Encode, e))?;
    let block = header
        .encode()
        .map_err(|e| MemberFailure::new(name, Phase::Encode, e))?;

    let content =
        read_content(&path, header.size).map_err(|e| MemberFailure::new(name, Phase::Read, e))?;

    out.write_all(&block)
        .map_err(|e| MemberFailure::new(name, Phase::Write, e.into()))?;
    write_padded(out, &content).map_err(|e| MemberFailure::new(name, Phase::Write, e))?;

    debug!(member = %header.name, size = header.size, "wrote member");
    Ok(())
}

fn read_content(path: &Path, expected: u64) -> TarResult<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut content = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
    f.read_to_end(&mut content)?;

    if content.len() as u64 != expected {
        return Err(TarError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "{} changed size while archiving ({} -> {} bytes)",
                path.display(),
                expected,
                content.len()
            ),
        )));
    }
    Ok(content)
}
