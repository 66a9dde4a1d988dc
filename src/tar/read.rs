#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::tar::error::{TarError, TarResult};
use crate::tar::format::{EntryInfo, BLOCK_SIZE};
use crate::tar::header::Header;
use crate::tar::io::{is_zero_block, padded_len, read_block};
use crate::tar::path::stored_name;

/// A decoded header and where it sits in the archive.
#[derive(Debug, Clone)]
pub struct Member {
    pub header: Header,
    pub header_offset: u64,
    pub content_offset: u64,
}

impl Member {
    pub fn info(&self) -> EntryInfo {
        let h = &self.header;
        EntryInfo {
            name: h.name.clone(),
            entry_type: h.entry_type,
            mode: h.mode,
            uid: h.uid,
            gid: h.gid,
            uname: h.uname.clone(),
            gname: h.gname.clone(),
            size: h.size,
            mtime: h.mtime,
            content_offset: self.content_offset,
        }
    }
}

/// Sequential header scan. Stops at the first all-zero header block or at
/// end of file; a block that is neither is an `ArchiveRead` error, after
/// which the scan yields nothing more.
pub struct Members<R> {
    inner: R,
    pos: u64,
    done: bool,
}

impl<R: Read + Seek> Members<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pos: 0,
            done: false,
        }
    }

    /// Restarts the scan from the first header.
    pub fn rewind(&mut self) -> TarResult<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.pos = 0;
        self.done = false;
        Ok(())
    }

    /// Reads the content of `member` without disturbing the scan position.
    pub fn content(&mut self, member: &Member) -> TarResult<Vec<u8>> {
        let len = usize::try_from(member.header.size)
            .map_err(|_| TarError::MalformedHeader(format!("size {} too large", member.header.size)))?;
        self.inner.seek(SeekFrom::Start(member.content_offset))?;
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        self.inner.seek(SeekFrom::Start(self.pos))?;
        Ok(buf)
    }

    fn read_next(&mut self) -> TarResult<Option<Member>> {
        let header_offset = self.pos;
        let at = |e: TarError| TarError::ArchiveRead {
            offset: header_offset,
            source: Box::new(e),
        };

        let block = match read_block(&mut self.inner).map_err(at)? {
            Some(block) => block,
            None => return Ok(None),
        };
        if is_zero_block(&block) {
            return Ok(None);
        }

        let header = Header::decode(&block).map_err(at)?;
        let content_offset = header_offset + BLOCK_SIZE as u64;
        self.pos = content_offset + padded_len(header.size);
        self.inner
            .seek(SeekFrom::Start(self.pos))
            .map_err(|e| at(e.into()))?;

        Ok(Some(Member {
            header,
            header_offset,
            content_offset,
        }))
    }
}

impl<R: Read + Seek> Iterator for Members<R> {
    type Item = TarResult<Member>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(member)) => Some(Ok(member)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub fn open(archive: &Path) -> TarResult<Members<BufReader<File>>> {
    match File::open(archive) {
        Ok(f) => Ok(Members::new(BufReader::new(f))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(TarError::ArchiveNotFound(archive.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Lazily yields member names in archive order.
pub fn list(archive: &Path) -> TarResult<impl Iterator<Item = TarResult<String>>> {
    Ok(open(archive)?.map(|m| m.map(|m| m.header.name)))
}

/// Full header views of every member.
pub fn entries(archive: &Path) -> TarResult<Vec<EntryInfo>> {
    open(archive)?.map(|m| m.map(|m| m.info())).collect()
}

/// Whether a member is recorded under `name`. A missing archive contains
/// nothing.
pub fn contains(archive: &Path, name: &str) -> TarResult<bool> {
    let members = match open(archive) {
        Ok(members) => members,
        Err(TarError::ArchiveNotFound(_)) => return Ok(false),
        Err(e) => return Err(e),
    };

    let wanted = stored_name(name);
    for member in members {
        if member?.header.name == wanted {
            debug!(member = wanted, "already archived");
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tar::format::EntryType;
    use crate::tar::io::{write_footer, write_padded};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn header(name: &str, size: u64) -> Header {
        Header {
            name: name.into(),
            mode: 0o600,
            uid: 1,
            gid: 2,
            uname: "u".into(),
            gname: "g".into(),
            size,
            mtime: 42,
            entry_type: EntryType::Regular,
            devmajor: 0,
            devminor: 0,
        }
    }

    fn archive_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, content) in members {
            out.extend_from_slice(&header(name, content.len() as u64).encode().unwrap());
            write_padded(&mut out, content).unwrap();
        }
        write_footer(&mut out).unwrap();
        out
    }

    fn names<R: Read + Seek>(members: &mut Members<R>) -> Vec<String> {
        members.map(|m| m.unwrap().header.name).collect()
    }

    #[test]
    fn scans_members_in_order_and_skips_content() {
        let bytes = archive_bytes(&[("a", &[1u8; 600]), ("b", b""), ("c", b"xyz")]);
        let mut members = Members::new(Cursor::new(bytes));
        assert_eq!(names(&mut members), vec!["a", "b", "c"]);
    }

    #[test]
    fn offsets_and_content_are_reported() {
        let bytes = archive_bytes(&[("a", &[1u8; 600]), ("b", b"xyz")]);
        let mut members = Members::new(Cursor::new(bytes));

        let a = members.next().unwrap().unwrap();
        assert_eq!((a.header_offset, a.content_offset), (0, 512));
        let b = members.next().unwrap().unwrap();
        assert_eq!((b.header_offset, b.content_offset), (1536, 2048));

        assert_eq!(members.content(&b).unwrap(), b"xyz");
        assert_eq!(members.content(&a).unwrap(), vec![1u8; 600]);
        assert!(members.next().is_none());
    }

    #[test]
    fn rewind_restarts_the_scan() {
        let bytes = archive_bytes(&[("one", b"1"), ("two", b"2")]);
        let mut members = Members::new(Cursor::new(bytes));
        assert_eq!(names(&mut members).len(), 2);
        members.rewind().unwrap();
        assert_eq!(names(&mut members), vec!["one", "two"]);
    }

    struct NoSeek(Cursor<Vec<u8>>);

    impl Read for NoSeek {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Seek for NoSeek {
        fn seek(&mut self, _: SeekFrom) -> std::io::Result<u64> {
            Err(std::io::Error::new(ErrorKind::Unsupported, "cannot seek"))
        }
    }

    #[test]
    fn failed_skip_reports_header_offset() {
        let bytes = archive_bytes(&[("a", b"1")]);
        let mut members = Members::new(NoSeek(Cursor::new(bytes)));
        match members.next().unwrap() {
            Err(TarError::ArchiveRead { offset: 0, source }) => {
                assert!(matches!(*source, TarError::Io(_)));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(members.next().is_none());
    }

    #[test]
    fn end_of_file_without_footer_ends_the_scan() {
        let mut bytes = archive_bytes(&[("a", b"1")]);
        bytes.truncate(1024);
        let mut members = Members::new(Cursor::new(bytes));
        assert_eq!(names(&mut members), vec!["a"]);
    }

    #[test]
    fn garbage_block_is_an_archive_read_error() {
        let mut bytes = archive_bytes(&[("a", b"1")]);
        bytes[1024] = b'!';
        let mut members = Members::new(Cursor::new(bytes));

        assert!(members.next().unwrap().is_ok());
        let err = members.next().unwrap().unwrap_err();
        assert!(matches!(err, TarError::ArchiveRead { offset: 1024, .. }));
        assert!(members.next().is_none());
    }

    #[test]
    fn short_trailing_block_is_an_archive_read_error() {
        let mut bytes = archive_bytes(&[("a", b"1")]);
        bytes.truncate(1024 + 100);
        bytes[1024] = b'x';
        let mut members = Members::new(Cursor::new(bytes));
        members.next().unwrap().unwrap();
        assert!(matches!(
            members.next().unwrap(),
            Err(TarError::ArchiveRead { .. })
        ));
    }

    #[test]
    fn file_level_helpers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("t.tar");
        std::fs::write(&path, archive_bytes(&[("a.txt", b"hello"), ("b.txt", b"")])).unwrap();

        let listed: Vec<String> = list(&path).unwrap().collect::<TarResult<_>>().unwrap();
        assert_eq!(listed, vec!["a.txt", "b.txt"]);

        assert!(contains(&path, "b.txt").unwrap());
        assert!(!contains(&path, "c.txt").unwrap());
        assert!(!contains(&dir.path().join("nope.tar"), "a.txt").unwrap());

        let infos = entries(&path).unwrap();
        assert_eq!(infos[0].size, 5);
        assert_eq!(infos[0].content_offset, 512);
        assert_eq!(infos[1].mtime, 42);

        assert!(matches!(
            list(&dir.path().join("nope.tar")),
            Err(TarError::ArchiveNotFound(_))
        ));
    }
}
