//! Membership store for the blacklist and whitelist
//!
//! Both lists live in one JSON file (`{"blacklist": [...], "whitelist": [...]}`)
//! that is read once at construction and fully rewritten after every mutation.
//! The monitor loop never reads the store directly; it takes a [`ListSnapshot`]
//! under a read lock at the start of each iteration.

use crate::models::{ListKind, StoreError};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Handle shared between the foreground controller and the monitor loop
pub type SharedStore = Arc<RwLock<MembershipStore>>;

/// Insertion-ordered, deduplicated list of process names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipList {
    names: Vec<String>,
}

impl MembershipList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Appends `name` unless already present. Returns whether it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Removes `name` if present. Returns whether it was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Collapse duplicates while keeping the first occurrence of each name
    fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.names.retain(|n| seen.insert(n.clone()));
    }
}

impl<S: AsRef<str>> FromIterator<S> for MembershipList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = MembershipList::new();
        for name in iter {
            list.insert(name.as_ref());
        }
        list
    }
}

/// On-disk shape of the lists file
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedLists {
    #[serde(default)]
    blacklist: MembershipList,
    #[serde(default)]
    whitelist: MembershipList,
}

/// Immutable copy of both lists, taken once per monitor iteration
#[derive(Debug, Clone, Default)]
pub struct ListSnapshot {
    blacklist: HashSet<String>,
    whitelist: HashSet<String>,
}

impl ListSnapshot {
    pub fn new<B, W>(blacklist: B, whitelist: W) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        Self {
            blacklist: blacklist.into_iter().map(Into::into).collect(),
            whitelist: whitelist.into_iter().map(Into::into).collect(),
        }
    }

    /// Blacklisted and not whitelisted. The whitelist always wins.
    pub fn should_terminate(&self, name: &str) -> bool {
        self.blacklist.contains(name) && !self.whitelist.contains(name)
    }

    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist.contains(name)
    }

    /// True when no process can ever be selected for termination
    pub fn is_inert(&self) -> bool {
        self.blacklist.iter().all(|n| self.whitelist.contains(n))
    }
}

/// Owns the lists file path and both in-memory lists
#[derive(Debug)]
pub struct MembershipStore {
    path: PathBuf,
    blacklist: MembershipList,
    whitelist: MembershipList,
}

impl MembershipStore {
    /// Create an empty store bound to `path` without touching the disk
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blacklist: MembershipList::new(),
            whitelist: MembershipList::new(),
        }
    }

    /// Create a store and load it. A load failure never aborts: the lists stay
    /// empty and the error is handed back as a warning.
    pub fn open(path: impl Into<PathBuf>) -> (Self, Option<StoreError>) {
        let mut store = Self::new(path);
        let warning = store.load().err();
        (store, warning)
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self, kind: ListKind) -> &MembershipList {
        match kind {
            ListKind::Blacklist => &self.blacklist,
            ListKind::Whitelist => &self.whitelist,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut MembershipList {
        match kind {
            ListKind::Blacklist => &mut self.blacklist,
            ListKind::Whitelist => &mut self.whitelist,
        }
    }

    /// Read the persisted lists. A missing file is an empty store, not an error.
    /// On any failure both lists are left empty.
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.blacklist.clear();
        self.whitelist.clear();

        if !self.path.exists() {
            debug!("No process lists at {}, starting empty", self.path.display());
            return Ok(());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| {
            warn!("Could not read process lists {}: {}", self.path.display(), source);
            StoreError::Read {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut persisted: PersistedLists = serde_json::from_str(&content).map_err(|source| {
            warn!("Ignoring corrupt process lists {}: {}", self.path.display(), source);
            StoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        persisted.blacklist.dedup();
        persisted.whitelist.dedup();
        self.blacklist = persisted.blacklist;
        self.whitelist = persisted.whitelist;

        info!(
            "Process lists loaded. Blacklist: {}, Whitelist: {}",
            self.blacklist.len(),
            self.whitelist.len()
        );
        Ok(())
    }

    /// Overwrite the lists file. Writes a sibling temp file and renames it over
    /// the target so a crash mid-write leaves the previous file intact.
    pub fn save(&self) -> Result<(), StoreError> {
        let persisted = PersistedLists {
            blacklist: self.blacklist.clone(),
            whitelist: self.whitelist.clone(),
        };
        let json = serde_json::to_string_pretty(&persisted)?;

        write_atomically(&self.path, json.as_bytes()).map_err(|source| {
            warn!("Failed to save process lists {}: {}", self.path.display(), source);
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!("Process lists saved to {}", self.path.display());
        Ok(())
    }

    /// Add `name` to a list. `Ok(false)` means it was already present; nothing
    /// is written in that case. A failed save keeps the in-memory insertion.
    pub fn add(&mut self, kind: ListKind, name: &str) -> Result<bool, StoreError> {
        let name = normalize_name(name)?;
        if !self.list_mut(kind).insert(name) {
            return Ok(false);
        }
        info!("Added '{}' to {}", name, kind);
        self.save()?;
        Ok(true)
    }

    /// Remove `name` from a list. Persists whether or not it was present.
    /// A blank name can never be on a list, so it is simply absent.
    pub fn remove(&mut self, kind: ListKind, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        let removed = !name.is_empty() && self.list_mut(kind).remove(name);
        if removed {
            info!("Removed '{}' from {}", name, kind);
        }
        self.save()?;
        Ok(removed)
    }

    pub fn snapshot(&self) -> ListSnapshot {
        ListSnapshot::new(
            self.blacklist.iter().map(str::to_string),
            self.whitelist.iter().map(str::to_string),
        )
    }
}

fn normalize_name(name: &str) -> Result<&str, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(name)
}

/// Write `contents` to `<path>.tmp`, sync it, then rename it over `path`
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // ==================== MembershipList tests ====================

    #[test]
    fn test_insert_reports_duplicates() {
        let mut list = MembershipList::new();
        assert!(list.insert("bad.exe"));
        assert!(!list.insert("bad.exe"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let list: MembershipList = ["c.exe", "a.exe", "b.exe", "a.exe"].into_iter().collect();
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["c.exe", "a.exe", "b.exe"]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut list = MembershipList::new();
        list.insert("Bad.exe");
        assert!(!list.contains("bad.exe"));
        assert!(list.insert("bad.exe"));
    }

    // ==================== ListSnapshot tests ====================

    #[test]
    fn test_whitelist_overrides_blacklist() {
        let snapshot = ListSnapshot::new(["bad.exe", "worse.exe"], ["bad.exe"]);
        assert!(!snapshot.should_terminate("bad.exe"));
        assert!(snapshot.should_terminate("worse.exe"));
        assert!(!snapshot.should_terminate("ok.exe"));
    }

    #[test]
    fn test_snapshot_inert_when_blacklist_fully_whitelisted() {
        assert!(ListSnapshot::new(["a.exe"], ["a.exe"]).is_inert());
        assert!(ListSnapshot::default().is_inert());
        assert!(!ListSnapshot::new(["a.exe"], Vec::<String>::new()).is_inert());
    }

    // ==================== MembershipStore tests ====================

    #[test]
    fn test_add_twice_returns_true_then_false() {
        let dir = tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));

        assert!(store.add(ListKind::Blacklist, "bad.exe").unwrap());
        assert!(!store.add(ListKind::Blacklist, "bad.exe").unwrap());
        assert_eq!(store.list(ListKind::Blacklist).len(), 1);
    }

    #[test]
    fn test_add_persists_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        let mut store = MembershipStore::new(&path);
        store.add(ListKind::Whitelist, "keep.exe").unwrap();

        let (reloaded, warning) = MembershipStore::open(&path);
        assert!(warning.is_none());
        assert!(reloaded.list(ListKind::Whitelist).contains("keep.exe"));
        assert!(reloaded.list(ListKind::Blacklist).is_empty());
    }

    #[test]
    fn test_remove_absent_still_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        let mut store = MembershipStore::new(&path);
        assert!(!path.exists());

        assert!(!store.remove(ListKind::Blacklist, "ghost.exe").unwrap());
        assert!(path.exists(), "remove must write the file even when nothing changed");
        assert!(store.list(ListKind::Blacklist).is_empty());
    }

    #[test]
    fn test_remove_blank_name_is_absent_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        let mut store = MembershipStore::new(&path);

        assert!(!store.remove(ListKind::Whitelist, "  ").unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_remove_present_returns_true() {
        let dir = tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));
        store.add(ListKind::Blacklist, "bad.exe").unwrap();

        assert!(store.remove(ListKind::Blacklist, "bad.exe").unwrap());
        assert!(!store.list(ListKind::Blacklist).contains("bad.exe"));
    }

    #[test]
    fn test_name_may_be_on_both_lists() {
        let dir = tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));
        assert!(store.add(ListKind::Blacklist, "bad.exe").unwrap());
        assert!(store.add(ListKind::Whitelist, "bad.exe").unwrap());
        assert!(!store.snapshot().should_terminate("bad.exe"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let dir = tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));
        assert!(matches!(store.add(ListKind::Blacklist, "   "), Err(StoreError::EmptyName)));
    }

    #[test]
    fn test_names_are_trimmed() {
        let dir = tempdir().unwrap();
        let mut store = MembershipStore::new(dir.path().join("lists.json"));
        store.add(ListKind::Blacklist, "  bad.exe\n").unwrap();
        assert!(store.list(ListKind::Blacklist).contains("bad.exe"));
    }

    #[test]
    fn test_missing_file_is_not_a_warning() {
        let dir = tempdir().unwrap();
        let (store, warning) = MembershipStore::open(dir.path().join("absent.json"));
        assert!(warning.is_none());
        assert!(store.list(ListKind::Blacklist).is_empty());
    }

    #[test]
    fn test_corrupt_file_yields_empty_lists_and_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        fs::write(&path, "{ not json").unwrap();

        let (store, warning) = MembershipStore::open(&path);
        assert!(matches!(warning, Some(StoreError::Parse { .. })));
        assert!(store.list(ListKind::Blacklist).is_empty());
        assert!(store.list(ListKind::Whitelist).is_empty());
    }

    #[test]
    fn test_failed_reload_clears_previous_lists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        let mut store = MembershipStore::new(&path);
        store.add(ListKind::Blacklist, "bad.exe").unwrap();

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(store.load().is_err());
        assert!(store.list(ListKind::Blacklist).is_empty());
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        fs::write(&path, r#"{"blacklist": ["bad.exe"]}"#).unwrap();

        let (store, warning) = MembershipStore::open(&path);
        assert!(warning.is_none());
        assert!(store.list(ListKind::Blacklist).contains("bad.exe"));
        assert!(store.list(ListKind::Whitelist).is_empty());
    }

    #[test]
    fn test_duplicates_in_file_are_collapsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        fs::write(&path, r#"{"blacklist": ["a.exe", "b.exe", "a.exe"], "whitelist": []}"#).unwrap();

        let (store, _) = MembershipStore::open(&path);
        assert_eq!(
            store.list(ListKind::Blacklist).iter().collect::<Vec<_>>(),
            vec!["a.exe", "b.exe"]
        );
    }

    #[test]
    fn test_saved_file_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lists.json");
        let mut store = MembershipStore::new(&path);
        store.add(ListKind::Blacklist, "b.exe").unwrap();
        store.add(ListKind::Blacklist, "a.exe").unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["blacklist"], serde_json::json!(["b.exe", "a.exe"]));
        assert_eq!(value["whitelist"], serde_json::json!([]));
    }

    #[test]
    fn test_save_creates_parent_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("lists.json");
        let mut store = MembershipStore::new(&path);
        store.add(ListKind::Blacklist, "bad.exe").unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("lists.json.tmp").exists());
    }

    #[test]
    fn test_save_failure_keeps_in_memory_change() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("lists.json");
        fs::create_dir(&path).unwrap();
        let mut store = MembershipStore::new(&path);

        let result = store.add(ListKind::Blacklist, "bad.exe");
        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(store.list(ListKind::Blacklist).contains("bad.exe"));
    }
}
