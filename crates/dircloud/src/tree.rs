//! Path-indexed size and timestamp store, modelled after `du` output.
//!
//! Each branch key knows the names and values of its direct children
//! but nothing about itself or its grandchildren. A directory's own
//! record lives in its parent's child list, and a directory with no
//! known children has no branch of its own. In a typical Unix tree the
//! root branch `/` lists `bin/`, `boot/`, `lib/` and so on, `/boot/`
//! lists `grub/`, and the root's own record is kept apart since it has
//! no parent.
//!
//! Lookups never fail: unknown paths yield `None`, a zero size, an empty
//! timestamp or an empty child list.

use crate::pathkey::{self, PathKey, ROOT, SEP};
use crate::sort::SortPolicy;
use serde::Serialize;
use std::collections::BTreeMap;

/// One entry of a child list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Child {
    /// Segment relative to the parent, with a trailing separator for
    /// directories.
    pub name: String,
    pub size: u64,
    /// Formatted date or opaque token, empty when unknown.
    pub timestamp: String,
}

impl Child {
    pub fn new(name: impl Into<String>, size: u64, timestamp: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            timestamp: timestamp.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with(SEP)
    }

    /// Name without the trailing separator (the root keeps `/`).
    pub fn display_name(&self) -> &str {
        match self.name.trim_end_matches(SEP) {
            "" => ROOT,
            trimmed => trimmed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeOptions {
    /// Keep every directory's size as its own size plus the live sum of
    /// its descendants.
    pub aggregate: bool,
    pub sort: SortPolicy,
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    branches: BTreeMap<PathKey, Vec<Child>>,
    root: Option<Child>,
    options: TreeOptions,
}

impl Tree {
    pub fn new(options: TreeOptions) -> Self {
        Self {
            branches: BTreeMap::new(),
            root: None,
            options,
        }
    }

    pub fn options(&self) -> TreeOptions {
        self.options
    }

    pub fn sort_policy(&self) -> SortPolicy {
        self.options.sort
    }

    /// Number of branches, i.e. paths with at least one known child.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.root.is_none()
    }

    /// Inserts a record for `path`, keeping its parent's list sorted.
    ///
    /// Re-adding a known name merges into the existing record: with
    /// aggregation the size is added (the record may already hold its
    /// descendants' share), otherwise the new values replace the old. With
    /// aggregation, `size` is also added to every ancestor up to the root;
    /// ancestors missing from the tree get a zero-sized record first.
    pub fn add_branch(&mut self, path: &str, size: u64, timestamp: &str, is_dir: bool) {
        let aggregate = self.options.aggregate;
        let Some(split) = pathkey::split(path) else {
            let root = self.root.get_or_insert_with(|| Child::new(ROOT, 0, ""));
            merge(root, size, timestamp, aggregate);
            return;
        };

        let name = split.name(is_dir);
        let policy = self.options.sort;
        let children = self.branches.entry(split.parent.clone()).or_default();
        match position(children, &name, policy) {
            Ok(idx) => merge(&mut children[idx], size, timestamp, aggregate),
            Err(idx) => children.insert(idx, Child::new(name, size, timestamp)),
        }

        if aggregate {
            self.propagate(&split.parent, i128::from(size));
        }
    }

    /// Replaces the size and timestamp of an existing record.
    ///
    /// With aggregation every ancestor moves by `new_size - old_size`.
    /// Returns `false`, changing nothing, when `path` is unknown.
    pub fn update_branch(&mut self, path: &str, new_size: u64, new_timestamp: &str) -> bool {
        let Some(split) = pathkey::split(path) else {
            return match self.root.as_mut() {
                Some(root) => {
                    root.size = new_size;
                    root.timestamp = new_timestamp.to_string();
                    true
                }
                None => false,
            };
        };

        let Some(idx) = self.locate(&split) else {
            return false;
        };
        let Some(children) = self.branches.get_mut(&split.parent) else {
            return false;
        };
        let record = &mut children[idx];
        let delta = i128::from(new_size) - i128::from(record.size);
        record.size = new_size;
        record.timestamp = new_timestamp.to_string();

        if self.options.aggregate && delta != 0 {
            self.propagate(&split.parent, delta);
        }
        true
    }

    /// Removes a record together with everything known beneath it.
    ///
    /// With aggregation its size is subtracted from every ancestor.
    /// Deleting the root empties the tree. Returns `false` for unknown
    /// paths.
    pub fn del_branch(&mut self, path: &str) -> bool {
        let Some(split) = pathkey::split(path) else {
            let had_data = !self.is_empty();
            self.branches.clear();
            self.root = None;
            return had_data;
        };

        let Some(idx) = self.locate(&split) else {
            return false;
        };
        let Some(children) = self.branches.get_mut(&split.parent) else {
            return false;
        };
        let removed = children.remove(idx);
        if children.is_empty() {
            self.branches.remove(&split.parent);
        }

        if removed.is_dir() {
            let subtree = PathKey::new(&split.parent.join(&removed.name));
            let doomed: Vec<PathKey> = self
                .branches
                .range(subtree.clone()..)
                .take_while(|(key, _)| subtree.contains(key))
                .map(|(key, _)| key.clone())
                .collect();
            for key in doomed {
                self.branches.remove(&key);
            }
        }

        if self.options.aggregate && removed.size != 0 {
            self.propagate(&split.parent, -i128::from(removed.size));
        }
        true
    }

    /// The record stored for `path`, resolving both the file and the
    /// directory form of its last segment.
    pub fn get_branch(&self, path: &str) -> Option<&Child> {
        match pathkey::split(path) {
            None => self.root.as_ref(),
            Some(split) => {
                let idx = self.locate(&split)?;
                self.branches.get(&split.parent).map(|children| &children[idx])
            }
        }
    }

    pub fn branch_size(&self, path: &str) -> u64 {
        self.get_branch(path).map_or(0, |child| child.size)
    }

    pub fn branch_timestamp(&self, path: &str) -> &str {
        self.get_branch(path)
            .map_or("", |child| child.timestamp.as_str())
    }

    /// Key used to look a leaf up in an external catalogue: the timestamp
    /// field when set, the last path segment otherwise.
    pub fn branch_key(&self, path: &str) -> String {
        let timestamp = self.branch_timestamp(path);
        if !timestamp.is_empty() {
            return timestamp.to_string();
        }
        pathkey::split(path)
            .map(|split| split.segment().to_string())
            .unwrap_or_default()
    }

    /// Parent branch of `path`, `None` at the root.
    pub fn parent_name(&self, path: &str) -> Option<PathKey> {
        pathkey::split(path).map(|split| split.parent)
    }

    /// Direct children of `path`, in sort order.
    pub fn children(&self, path: &str) -> &[Child] {
        self.branches
            .get(&PathKey::new(path))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every full path known strictly beneath `start` (the root for an
    /// empty string), in branch-key order.
    pub fn iter_branch_names<'a>(&'a self, start: &str) -> impl Iterator<Item = String> + 'a {
        let start = PathKey::new(start);
        self.branches
            .range(start.clone()..)
            .take_while(move |(key, _)| start.contains(key))
            .flat_map(|(key, children)| children.iter().map(move |child| key.join(&child.name)))
    }

    /// Every full path known beneath `start`, optionally ordered by the
    /// tree's sort policy.
    pub fn branch_names(&self, start: &str, sorted: bool) -> Vec<String> {
        let mut names: Vec<String> = self.iter_branch_names(start).collect();
        if sorted {
            let policy = self.options.sort;
            names.sort_by(|a, b| policy.compare(a, b));
        }
        names
    }

    /// The deepest path known beneath `path`. Among equally deep paths the
    /// lexicographically greatest wins.
    pub fn last_descendant_branch(&self, path: &str) -> Option<String> {
        self.iter_branch_names(path).max_by(|a, b| {
            pathkey::segment_count(a)
                .cmp(&pathkey::segment_count(b))
                .then_with(|| a.cmp(b))
        })
    }

    fn locate(&self, split: &pathkey::Split) -> Option<usize> {
        let children = self.branches.get(&split.parent)?;
        split
            .candidates()
            .iter()
            .find_map(|name| position(children, name, self.options.sort).ok())
    }

    /// Adds `delta` to the record of `from` and of each of its ancestors.
    fn propagate(&mut self, from: &PathKey, delta: i128) {
        let policy = self.options.sort;
        let mut current = Some(from.clone());
        while let Some(key) = current {
            let record = match key.parent_and_name() {
                None => self.root.get_or_insert_with(|| Child::new(ROOT, 0, "")),
                Some((parent, name)) => {
                    let children = self.branches.entry(parent).or_default();
                    let idx = match position(children, name, policy) {
                        Ok(idx) => idx,
                        Err(idx) => {
                            children.insert(idx, Child::new(name, 0, ""));
                            idx
                        }
                    };
                    &mut children[idx]
                }
            };
            record.size = apply_delta(record.size, delta);
            current = key.parent();
        }
    }
}

fn position(children: &[Child], name: &str, policy: SortPolicy) -> Result<usize, usize> {
    children.binary_search_by(|child| policy.compare(&child.name, name))
}

fn merge(record: &mut Child, size: u64, timestamp: &str, aggregate: bool) {
    if aggregate {
        record.size = record.size.saturating_add(size);
        if !timestamp.is_empty() {
            record.timestamp = timestamp.to_string();
        }
    } else {
        record.size = size;
        record.timestamp = timestamp.to_string();
    }
}

fn apply_delta(size: u64, delta: i128) -> u64 {
    (i128::from(size) + delta).clamp(0, i128::from(u64::MAX)) as u64
}
