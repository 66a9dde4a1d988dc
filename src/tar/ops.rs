#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use crate::tar::error::TarResult;
use crate::tar::extract::extract as extract_impl;
use crate::tar::format::EntryInfo;
use crate::tar::identity::{IdentityResolver, SystemIdentity};
use crate::tar::mutate::{append as append_impl, update as update_impl};
use crate::tar::read;
use crate::tar::write::create as create_impl;

/// Entry point for the archive operations.
///
/// Member names are resolved against `root` when archiving and extraction
/// writes under it; the names themselves are stored exactly as given.
/// Nothing is cached between calls, the archive file is re-read each time.
#[derive(Debug, Clone)]
pub struct Archiver<I = SystemIdentity> {
    root: PathBuf,
    identity: I,
}

impl Default for Archiver<SystemIdentity> {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver<SystemIdentity> {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            identity: SystemIdentity::default(),
        }
    }
}

impl<I: IdentityResolver> Archiver<I> {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_identity<J: IdentityResolver>(self, identity: J) -> Archiver<J> {
        Archiver {
            root: self.root,
            identity,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a fresh archive, replacing any existing file.
    pub fn create(&self, archive: &Path, names: &[String]) -> TarResult<()> {
        create_impl(archive, names, &self.root, &self.identity)
    }

    pub fn append(&self, archive: &Path, names: &[String]) -> TarResult<()> {
        append_impl(archive, names, &self.root, &self.identity)
    }

    /// Appends the names that are not yet members.
    pub fn update(&self, archive: &Path, names: &[String]) -> TarResult<()> {
        update_impl(archive, names, &self.root, &self.identity)
    }

    pub fn list(&self, archive: &Path) -> TarResult<impl Iterator<Item = TarResult<String>>> {
        read::list(archive)
    }

    pub fn contains(&self, archive: &Path, name: &str) -> TarResult<bool> {
        read::contains(archive, name)
    }

    /// Read member headers (without extracting content).
    pub fn entries(&self, archive: &Path) -> TarResult<Vec<EntryInfo>> {
        read::entries(archive)
    }

    pub fn extract(&self, archive: &Path) -> TarResult<()> {
        extract_impl(archive, &self.root)
    }
}
