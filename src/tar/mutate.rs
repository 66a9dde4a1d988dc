#![forbid(unsafe_code)]

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::tar::error::{TarError, TarResult};
use crate::tar::format::FOOTER_LEN;
use crate::tar::identity::IdentityResolver;
use crate::tar::io::{drop_trailing, write_footer};
use crate::tar::read::contains;
use crate::tar::write::write_member;

/// Appends `names` in place: the footer is cut off, members are written
/// after the last existing one and a fresh footer closes the archive.
///
/// Members that fail are skipped and reported together once every other
/// member and the footer have been written.
pub fn append(
    archive: &Path,
    names: &[String],
    root: &Path,
    ids: &dyn IdentityResolver,
) -> TarResult<()> {
    if !archive.exists() {
        return Err(TarError::ArchiveNotFound(archive.to_path_buf()));
    }
    info!("appending {} member(s) to {}", names.len(), archive.display());

    drop_trailing(archive, FOOTER_LEN)?;
    debug!("removed footer from {}", archive.display());

    let file = OpenOptions::new().append(true).open(archive)?;
    let mut out = BufWriter::new(file);

    let mut failures = Vec::new();
    for name in names {
        if let Err(failure) = write_member(&mut out, name, root, ids) {
            warn!("skipping {failure}");
            failures.push(failure);
        }
    }

    write_footer(&mut out)?;
    out.flush()?;

    if failures.is_empty() {
        Ok(())
    } else {
        Err(TarError::Batch(failures))
    }
}

/// Appends only the names not already recorded in the archive. Membership
/// is by name alone; an existing member is never replaced.
pub fn update(
    archive: &Path,
    names: &[String],
    root: &Path,
    ids: &dyn IdentityResolver,
) -> TarResult<()> {
    let mut missing = Vec::new();
    for name in names {
        if !contains(archive, name)? {
            missing.push(name.clone());
        }
    }

    if missing.is_empty() {
        info!("{} is up to date", archive.display());
        return Ok(());
    }

    debug!(count = missing.len(), "members to add");
    append(archive, &missing, root, ids)
}
