#![forbid(unsafe_code)]

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TarError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no user name for uid {uid}")]
    OwnerLookup { uid: u32 },

    #[error("no group name for gid {gid}")]
    GroupLookup { gid: u32 },

    #[error("{field} value {value} does not fit its header field")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("bad archive at offset {offset}: {source}")]
    ArchiveRead {
        offset: u64,
        #[source]
        source: Box<TarError>,
    },

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("cannot write {}: {source}", .path.display())]
    ExtractWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot truncate {}: {source}", .path.display())]
    Truncate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Member(Box<MemberFailure>),

    #[error("{} member(s) failed: {}", .0.len(), FailureList(.0))]
    Batch(Vec<MemberFailure>),
}

pub type TarResult<T> = Result<T, TarError>;

/// Stage of per-member processing that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Encode,
    /// Reading the source file's content.
    Read,
    /// Writing into the archive.
    Write,
    Extract,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Encode => "encode",
            Phase::Read => "read",
            Phase::Write => "write",
            Phase::Extract => "extract",
        })
    }
}

/// One member that could not be processed, and why.
#[derive(Debug)]
pub struct MemberFailure {
    pub name: String,
    pub phase: Phase,
    pub error: TarError,
}

impl MemberFailure {
    pub fn new(name: impl Into<String>, phase: Phase, error: TarError) -> Self {
        Self {
            name: name.into(),
            phase,
            error,
        }
    }
}

impl fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.phase, self.error)
    }
}

struct FailureList<'a>(&'a [MemberFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl TarError {
    /// Names of the members carried by a `Member` or `Batch` error.
    pub fn failed_members(&self) -> Vec<&str> {
        match self {
            TarError::Member(failure) => vec![failure.name.as_str()],
            TarError::Batch(failures) => failures.iter().map(|f| f.name.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}
