#![forbid(unsafe_code)]

use std::path::{Component, Path, PathBuf};

use crate::tar::error::{TarError, TarResult};
use crate::tar::format::field;

/// The name as it is recorded in a header: at most 100 bytes, cut at a
/// character boundary. Longer names are truncated, not rejected.
pub fn stored_name(name: &str) -> &str {
    truncate_str(name, field::NAME.len())
}

/// Longest prefix of `s` that fits in `limit` bytes without splitting a
/// character.
pub(crate) fn truncate_str(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Where a member named `name` lands when extracting under `root`.
///
/// Leading `/` and `./` are dropped so absolute names stay inside `root`;
/// `..` components are refused.
pub fn extract_target(root: &Path, name: &str) -> TarResult<PathBuf> {
    let mut rel = PathBuf::new();
    for comp in Path::new(name).components() {
        match comp {
            Component::Normal(part) => rel.push(part),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                return Err(TarError::ExtractWrite {
                    path: PathBuf::from(name),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "member name escapes the extraction directory",
                    ),
                });
            }
        }
    }

    if rel.as_os_str().is_empty() {
        return Err(TarError::ExtractWrite {
            path: PathBuf::from(name),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty member name"),
        });
    }

    Ok(root.join(rel))
}

/// Filesystem location of a name given on the command line.
pub fn source_path(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_kept() {
        assert_eq!(stored_name("a.txt"), "a.txt");
        let exact = "x".repeat(100);
        assert_eq!(stored_name(&exact), exact);
    }

    #[test]
    fn long_names_are_cut_at_char_boundary() {
        let long = "y".repeat(150);
        assert_eq!(stored_name(&long).len(), 100);

        // 99 ASCII bytes then a two-byte char straddling the limit
        let mut straddle = "z".repeat(99);
        straddle.push('é');
        straddle.push_str("tail");
        assert_eq!(stored_name(&straddle), "z".repeat(99));
    }

    #[test]
    fn extraction_stays_under_root() {
        let root = Path::new("/out");
        assert_eq!(extract_target(root, "a.txt").unwrap(), Path::new("/out/a.txt"));
        assert_eq!(extract_target(root, "/abs/b").unwrap(), Path::new("/out/abs/b"));
        assert_eq!(extract_target(root, "./c").unwrap(), Path::new("/out/c"));
    }

    #[test]
    fn parent_components_and_empty_names_are_refused() {
        let root = Path::new("/out");
        assert!(matches!(
            extract_target(root, "../evil"),
            Err(TarError::ExtractWrite { .. })
        ));
        assert!(extract_target(root, "/").is_err());
        assert!(extract_target(root, "").is_err());
    }

    #[test]
    fn source_paths_join_root() {
        assert_eq!(source_path(Path::new("dir"), "f"), Path::new("dir/f"));
        assert_eq!(source_path(Path::new("."), "f"), Path::new("./f"));
    }
}
