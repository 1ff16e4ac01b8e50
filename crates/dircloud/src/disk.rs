//! Listing real directories under the document root

use crate::error::DiskError;
use crate::pathkey::{PathKey, SEP};
use crate::tree::{Child, Tree};
use chrono::{DateTime, Local};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One entry of a directory read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    /// File name, directories carry a trailing separator
    pub name: String,
    pub size: u64,
    pub timestamp: String,
    pub is_dir: bool,
}

impl DiskEntry {
    pub fn to_child(&self) -> Child {
        Child::new(self.name.clone(), self.size, self.timestamp.clone())
    }
}

/// What a request path refers to on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskTarget {
    Directory(PathBuf),
    File(PathBuf),
    Missing(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DiskReader {
    document_root: PathBuf,
    ignore: GlobSet,
}

impl DiskReader {
    /// `ignore` holds glob patterns matched against bare file names.
    pub fn new(document_root: impl Into<PathBuf>, ignore: &[String]) -> Result<Self, DiskError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            document_root: document_root.into(),
            ignore: builder.build()?,
        })
    }

    pub fn document_root(&self) -> &Path {
        &self.document_root
    }

    /// Maps a tree path onto the filesystem. `..` never climbs above the
    /// document root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let key = PathKey::new(path);
        match key.as_str().trim_matches(SEP) {
            "" => self.document_root.clone(),
            relative => self.document_root.join(relative),
        }
    }

    pub fn classify(&self, path: &str) -> DiskTarget {
        let full = self.resolve(path);
        if full.is_dir() {
            DiskTarget::Directory(full)
        } else if full.is_file() {
            DiskTarget::File(full)
        } else {
            DiskTarget::Missing(full)
        }
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.is_match(name)
    }

    /// Lists the directory behind `path`, sorted by the tree's policy.
    ///
    /// Subdirectories the tree already knows report the tree's size, which
    /// covers their contents, instead of the size of the directory inode.
    /// Entries whose metadata cannot be read are skipped.
    pub fn read_directory(&self, tree: &Tree, path: &str) -> Result<Vec<DiskEntry>, DiskError> {
        let dir = self.resolve(path);
        debug!(path = %dir.display(), "reading directory from disk");
        if !dir.is_dir() {
            return Err(DiskError::NotADirectory(dir));
        }
        let read_dir = fs::read_dir(&dir).map_err(|source| DiskError::Unreadable {
            path: dir.clone(),
            source,
        })?;

        let key = PathKey::new(path);
        let mut entries = Vec::new();
        for entry in read_dir.filter_map(|e| e.ok()) {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if self.is_ignored(&file_name) {
                continue;
            }
            let full = entry.path();
            let metadata = match fs::metadata(&full).or_else(|_| fs::symlink_metadata(&full)) {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %full.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let is_dir = metadata.is_dir();
            let name = if is_dir {
                format!("{}{}", file_name, SEP)
            } else {
                file_name
            };
            let size = match tree.get_branch(&key.join(&name)) {
                Some(known) if is_dir => known.size,
                _ => metadata.len(),
            };
            entries.push(DiskEntry {
                name,
                size,
                timestamp: metadata.modified().map(format_time).unwrap_or_default(),
                is_dir,
            });
        }

        let policy = tree.sort_policy();
        entries.sort_by(|a, b| policy.compare(&a.name, &b.name));
        Ok(entries)
    }

    /// Whether `warm` would add anything to `tree`.
    pub fn needs_warming(&self, tree: &Tree, path: &str, entries: &[DiskEntry]) -> bool {
        let key = PathKey::new(path);
        entries.iter().any(|entry| !is_listed(tree, &key, entry))
    }

    /// Adds entries the tree does not list yet under `path`. Returns how
    /// many were added.
    pub fn warm(&self, tree: &mut Tree, path: &str, entries: &[DiskEntry]) -> usize {
        let key = PathKey::new(path);
        let mut added = 0;
        for entry in entries {
            if is_listed(tree, &key, entry) {
                continue;
            }
            let full = key.join(&entry.name);
            debug!(path = %full, size = entry.size, "caching disk entry");
            tree.add_branch(&full, entry.size, &entry.timestamp, entry.is_dir);
            added += 1;
        }
        added
    }

    /// Contents of `name` inside `dir`, if both are set and the file exists.
    pub fn read_file_if_exists(&self, dir: &Path, name: Option<&str>) -> Option<String> {
        let path = dir.join(name.filter(|n| !n.is_empty())?);
        if !path.is_file() {
            return None;
        }
        match fs::read(&path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read decoration file");
                None
            }
        }
    }
}

fn is_listed(tree: &Tree, key: &PathKey, entry: &DiskEntry) -> bool {
    tree.children(key.as_str()).iter().any(|c| c.name == entry.name)
}

pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIMESTAMP_FORMAT).to_string()
}
