#![forbid(unsafe_code)]

use std::fs::{OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::tar::error::{MemberFailure, Phase, TarError, TarResult};
use crate::tar::format::EntryType;
use crate::tar::header::Header;
use crate::tar::path::extract_target;
use crate::tar::read::open;

/// Writes every regular member under `root`, restoring permission bits and
/// modification time. Parent directories are not created.
///
/// A member that cannot be written is reported and the rest still get
/// extracted; a damaged archive stops the scan.
pub fn extract(archive: &Path, root: &Path) -> TarResult<()> {
    info!("extracting {} into {}", archive.display(), root.display());

    let mut members = open(archive)?;
    let mut failures = Vec::new();
    let mut written = 0usize;

    while let Some(member) = members.next() {
        let member = member?;
        if member.header.entry_type == EntryType::Directory {
            debug!(member = %member.header.name, "skipping directory entry");
            continue;
        }

        let content = members.content(&member).map_err(|e| TarError::ArchiveRead {
            offset: member.content_offset,
            source: Box::new(e),
        })?;

        match restore(root, &member.header, &content) {
            Ok(path) => {
                written += 1;
                debug!(member = %member.header.name, path = %path.display(), "extracted");
            }
            Err(e) => {
                let failure = MemberFailure::new(member.header.name.clone(), Phase::Extract, e);
                warn!("skipping {failure}");
                failures.push(failure);
            }
        }
    }

    info!("extracted {written} member(s)");
    if failures.is_empty() {
        Ok(())
    } else {
        Err(TarError::Batch(failures))
    }
}

fn restore(root: &Path, header: &Header, content: &[u8]) -> TarResult<PathBuf> {
    let target = extract_target(root, &header.name)?;
    let write_err = |source| TarError::ExtractWrite {
        path: target.clone(),
        source,
    };

    // leftovers, symlinks included, are unlinked rather than written through
    if let Ok(meta) = std::fs::symlink_metadata(&target) {
        if !meta.is_dir() {
            std::fs::remove_file(&target).map_err(write_err)?;
        }
    }

    let mut f = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .map_err(write_err)?;
    f.write_all(content).map_err(write_err)?;
    f.set_modified(UNIX_EPOCH + Duration::from_secs(header.mtime))
        .map_err(write_err)?;
    drop(f);

    std::fs::set_permissions(&target, Permissions::from_mode(header.mode)).map_err(write_err)?;
    Ok(target)
}
