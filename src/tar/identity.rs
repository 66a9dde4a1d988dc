#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Maps numeric owner and group ids to the names stored in headers.
pub trait IdentityResolver {
    fn resolve_owner(&self, uid: u32) -> Option<String>;
    fn resolve_group(&self, gid: u32) -> Option<String>;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn resolve_owner(&self, uid: u32) -> Option<String> {
        (**self).resolve_owner(uid)
    }

    fn resolve_group(&self, gid: u32) -> Option<String> {
        (**self).resolve_group(gid)
    }
}

/// Resolves ids through the local user and group databases.
///
/// The flat files are read first. Ids they do not know are then asked of
/// `getent`, which goes through NSS (LDAP, sssd, ...).
#[derive(Debug, Clone)]
pub struct SystemIdentity {
    passwd: PathBuf,
    group: PathBuf,
    nss: bool,
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self {
            passwd: PathBuf::from("/etc/passwd"),
            group: PathBuf::from("/etc/group"),
            nss: true,
        }
    }
}

impl SystemIdentity {
    /// Reads the databases from custom locations (chroots, tests). Only
    /// these files are consulted.
    pub fn with_databases(passwd: impl Into<PathBuf>, group: impl Into<PathBuf>) -> Self {
        Self {
            passwd: passwd.into(),
            group: group.into(),
            nss: false,
        }
    }

    fn resolve(&self, file: &Path, database: &str, id: u32) -> Option<String> {
        let local = std::fs::read_to_string(file)
            .ok()
            .and_then(|db| lookup_id(&db, id));
        match local {
            Some(name) => Some(name),
            None if self.nss => getent(database, id),
            None => None,
        }
    }
}

impl IdentityResolver for SystemIdentity {
    fn resolve_owner(&self, uid: u32) -> Option<String> {
        self.resolve(&self.passwd, "passwd", uid)
    }

    fn resolve_group(&self, gid: u32) -> Option<String> {
        self.resolve(&self.group, "group", gid)
    }
}

/// `getent` answers with the same line format as the flat files.
fn getent(database: &str, id: u32) -> Option<String> {
    let output = Command::new("getent")
        .arg(database)
        .arg(id.to_string())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    lookup_id(&String::from_utf8_lossy(&output.stdout), id)
}

/// Both databases share the `name:password:id:...` prefix.
fn lookup_id(db: &str, id: u32) -> Option<String> {
    db.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .find_map(|line| {
            let mut parts = line.split(':');
            let name = parts.next()?;
            let _password = parts.next()?;
            let found: u32 = parts.next()?.trim().parse().ok()?;
            (found == id && !name.is_empty()).then(|| name.to_string())
        })
}

/// In-memory resolver for callers without an OS identity database.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    owners: HashMap<u32, String>,
    groups: HashMap<u32, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, uid: u32, name: impl Into<String>) -> Self {
        self.owners.insert(uid, name.into());
        self
    }

    pub fn with_group(mut self, gid: u32, name: impl Into<String>) -> Self {
        self.groups.insert(gid, name.into());
        self
    }
}

impl IdentityResolver for IdentityMap {
    fn resolve_owner(&self, uid: u32) -> Option<String> {
        self.owners.get(&uid).cloned()
    }

    fn resolve_group(&self, gid: u32) -> Option<String> {
        self.groups.get(&gid).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWD: &str = "\
# local accounts
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin

alice:x:1000:1000:Alice,,,:/home/alice:/bin/zsh
";

    const GROUP: &str = "\
root:x:0:
staff:x:50:alice,bob
";

    #[test]
    fn finds_names_by_id() {
        assert_eq!(lookup_id(PASSWD, 0).as_deref(), Some("root"));
        assert_eq!(lookup_id(PASSWD, 1000).as_deref(), Some("alice"));
        assert_eq!(lookup_id(GROUP, 50).as_deref(), Some("staff"));
    }

    #[test]
    fn unknown_id_and_garbage_lines_resolve_to_none() {
        assert_eq!(lookup_id(PASSWD, 4242), None);
        assert_eq!(lookup_id("broken\n:x:7:\nname:x:notanumber:", 7), None);
    }

    #[test]
    fn system_identity_reads_given_databases() {
        let dir = tempfile::tempdir().expect("tempdir");
        let passwd = dir.path().join("passwd");
        let group = dir.path().join("group");
        std::fs::write(&passwd, PASSWD).expect("write passwd");
        std::fs::write(&group, GROUP).expect("write group");

        let ids = SystemIdentity::with_databases(&passwd, &group);
        assert_eq!(ids.resolve_owner(1).as_deref(), Some("daemon"));
        assert_eq!(ids.resolve_group(0).as_deref(), Some("root"));
        assert_eq!(ids.resolve_group(1000), None);

        let missing = SystemIdentity::with_databases(dir.path().join("nope"), &group);
        assert_eq!(missing.resolve_owner(0), None);
    }

    #[test]
    fn default_resolver_knows_root_and_not_unassigned_ids() {
        let ids = SystemIdentity::default();
        assert_eq!(ids.resolve_owner(0).as_deref(), Some("root"));
        assert_eq!(ids.resolve_owner(3_999_999_999), None);
        assert_eq!(ids.resolve_group(3_999_999_999), None);
    }

    #[test]
    fn custom_databases_do_not_fall_back_to_nss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = dir.path().join("empty");
        std::fs::write(&empty, "").expect("write empty");

        let ids = SystemIdentity::with_databases(&empty, &empty);
        assert_eq!(ids.resolve_owner(0), None);
        assert_eq!(ids.resolve_group(0), None);
    }

    #[test]
    fn identity_map_answers_only_what_it_holds() {
        let ids = IdentityMap::new().with_owner(5, "five").with_group(6, "six");
        assert_eq!(ids.resolve_owner(5).as_deref(), Some("five"));
        assert_eq!(ids.resolve_owner(6), None);
        assert_eq!((&ids).resolve_group(6).as_deref(), Some("six"));
    }
}
