//! Process-wide handle on the current report generation

use crate::error::LoadError;
use crate::loader::{self, LoadOptions, Snapshot};
use crate::tree::Tree;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Owns the list of candidate reports and the tree built from the active
/// one. Readers get an `Arc` to a complete generation; reloads and
/// mutations swap a new generation in and never touch one that a reader
/// may still hold.
#[derive(Debug)]
pub struct TreeStore {
    files: RwLock<Vec<PathBuf>>,
    options: LoadOptions,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl TreeStore {
    /// The first file is the active one.
    pub fn new(files: Vec<PathBuf>, options: LoadOptions) -> Self {
        Self {
            files: RwLock::new(files),
            options,
            current: RwLock::new(None),
        }
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    pub fn files(&self) -> Vec<PathBuf> {
        read_lock(&self.files).clone()
    }

    pub fn active_file(&self) -> Result<PathBuf, LoadError> {
        read_lock(&self.files).first().cloned().ok_or(LoadError::NoSource)
    }

    /// The current generation, reloading first when the active report's
    /// mtime differs from the one read at the last load or a different
    /// report was selected.
    pub fn current(&self) -> Result<Arc<Snapshot>, LoadError> {
        let source = self.active_file()?;
        let modified = loader::modified_time(&source)?;
        if let Some(snapshot) = read_lock(&self.current).as_ref() {
            if !snapshot.is_stale(&source, modified) {
                return Ok(Arc::clone(snapshot));
            }
        }

        let mut slot = write_lock(&self.current);
        // Another caller may have reloaded while we waited for the lock.
        if let Some(snapshot) = slot.as_ref() {
            if !snapshot.is_stale(&source, modified) {
                return Ok(Arc::clone(snapshot));
            }
        }
        let snapshot = Arc::new(loader::load_file(&source, self.options)?);
        info!(
            path = %source.display(),
            branches = snapshot.tree.len(),
            records = snapshot.stats.records,
            "loaded report"
        );
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Makes `file` the active report and loads it.
    pub fn switch_to(&self, file: &Path) -> Result<Arc<Snapshot>, LoadError> {
        {
            let mut files = write_lock(&self.files);
            let idx = files
                .iter()
                .position(|candidate| candidate == file)
                .ok_or_else(|| LoadError::UnknownSource(file.to_path_buf()))?;
            let chosen = files.remove(idx);
            files.insert(0, chosen);
        }
        self.current()
    }

    /// Runs a mutation against the current generation.
    ///
    /// Copy-on-write: if readers still hold the generation, the tree is
    /// cloned first and the clone replaces it. Returns `None` when nothing
    /// has been loaded yet.
    pub fn modify<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Tree) -> R,
    {
        let mut slot = write_lock(&self.current);
        let snapshot = slot.as_mut()?;
        Some(f(&mut Arc::make_mut(snapshot).tree))
    }
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn store_with(reports: &[(&str, &str)]) -> (TempDir, TreeStore, Vec<PathBuf>) {
        let temp_dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = reports
            .iter()
            .map(|(name, body)| {
                let path = temp_dir.path().join(name);
                fs::write(&path, body).unwrap();
                path
            })
            .collect();
        let options = LoadOptions {
            unit: 1,
            ..LoadOptions::default()
        };
        let store = TreeStore::new(paths.clone(), options);
        (temp_dir, store, paths)
    }

    #[test]
    fn test_unchanged_file_keeps_generation() {
        let (_dir, store, _) = store_with(&[("du.txt", "10\t./a\n")]);
        let first = store.current().unwrap();
        let second = store.current().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_newer_file_triggers_reload() {
        let (_dir, store, paths) = store_with(&[("du.txt", "10\t./a\n")]);
        let first = store.current().unwrap();
        assert_eq!(first.tree.branch_size("a"), 10);

        fs::write(&paths[0], "20\t./a\n").unwrap();
        let future = SystemTime::now() + Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(&paths[0])
            .unwrap()
            .set_modified(future)
            .unwrap();

        let second = store.current().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.tree.branch_size("a"), 20);
        // The old generation is untouched.
        assert_eq!(first.tree.branch_size("a"), 10);
    }

    #[test]
    fn test_write_during_load_triggers_reload() {
        let (_dir, store, paths) = store_with(&[("du.txt", "10\t./a\n")]);
        let first = store.current().unwrap();

        // The rewrite carries an mtime older than the end of the first
        // load, as when a writer finishes while the report is parsed.
        fs::write(&paths[0], "99\t./a\n").unwrap();
        let during_load = first.modified + Duration::from_millis(1);
        fs::File::options()
            .write(true)
            .open(&paths[0])
            .unwrap()
            .set_modified(during_load)
            .unwrap();

        let second = store.current().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.tree.branch_size("a"), 99);
        assert_eq!(second.modified, during_load);

        let third = store.current().unwrap();
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[test]
    fn test_switch_to_reorders_and_reloads() {
        let (_dir, store, paths) = store_with(&[("one.txt", "1\t./x\n"), ("two.txt", "2\t./y\n")]);
        assert_eq!(store.current().unwrap().tree.branch_size("x"), 1);

        let switched = store.switch_to(&paths[1]).unwrap();
        assert_eq!(switched.source, paths[1]);
        assert_eq!(switched.tree.branch_size("y"), 2);
        assert_eq!(store.files(), vec![paths[1].clone(), paths[0].clone()]);
    }

    #[test]
    fn test_switch_to_unknown_file_fails() {
        let (dir, store, _) = store_with(&[("one.txt", "1\t./x\n")]);
        let err = store.switch_to(&dir.path().join("other.txt")).unwrap_err();
        assert!(matches!(err, LoadError::UnknownSource(_)));
    }

    #[test]
    fn test_modify_is_copy_on_write() {
        let (_dir, store, _) = store_with(&[("du.txt", "10\t./a\n")]);
        let before = store.current().unwrap();

        let changed = store.modify(|tree| tree.update_branch("a", 99, "")).unwrap();
        assert!(changed);

        let after = store.current().unwrap();
        assert_eq!(before.tree.branch_size("a"), 10);
        assert_eq!(after.tree.branch_size("a"), 99);
    }

    #[test]
    fn test_modify_before_load_is_none() {
        let (_dir, store, _) = store_with(&[("du.txt", "10\t./a\n")]);
        assert!(store.modify(|tree| tree.len()).is_none());
    }

    #[test]
    fn test_missing_report() {
        let store = TreeStore::new(vec![], LoadOptions::default());
        assert!(matches!(store.current().unwrap_err(), LoadError::NoSource));

        let store = TreeStore::new(vec![PathBuf::from("/nonexistent/du.txt")], LoadOptions::default());
        assert!(matches!(
            store.current().unwrap_err(),
            LoadError::SourceUnreadable { .. }
        ));
    }
}
