//! Path keys and parent/child splitting.
//!
//! Every branch of a [`Tree`](crate::tree::Tree) is stored under a
//! canonical, directory-form key: a leading separator, one separator
//! between segments and a trailing separator (`/`, `/boot/`,
//! `/boot/grub/`). Any incoming string, however malformed, is reduced to
//! that grammar here, independently of the host OS path rules.

use std::fmt;

/// The only separator recognised in paths.
pub const SEP: char = '/';

/// Canonical key of the topmost branch.
pub const ROOT: &str = "/";

/// A canonical directory-form path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathKey(String);

impl PathKey {
    pub fn root() -> Self {
        PathKey(ROOT.to_string())
    }

    /// Normalizes `raw` into directory form.
    ///
    /// Empty segments and `.` are dropped, `..` removes the previous
    /// segment and never climbs above the root. The empty string, `/`,
    /// `//` and `.` all map to the root key.
    pub fn new(raw: &str) -> Self {
        Self::from_segments(&segments(raw))
    }

    fn from_segments(segments: &[&str]) -> Self {
        if segments.is_empty() {
            return Self::root();
        }
        let len = segments.iter().map(|s| s.len() + 1).sum::<usize>() + 1;
        let mut key = String::with_capacity(len);
        key.push(SEP);
        for segment in segments {
            key.push_str(segment);
            key.push(SEP);
        }
        PathKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Number of segments below the root (root is 0, `/boot/` is 1).
    pub fn depth(&self) -> usize {
        self.0.matches(SEP).count() - 1
    }

    /// Key of the enclosing branch, `None` at the root.
    pub fn parent(&self) -> Option<PathKey> {
        self.parent_and_name().map(|(parent, _)| parent)
    }

    /// Splits a non-root key into its parent key and the directory name
    /// (with trailing separator) it is listed under.
    pub fn parent_and_name(&self) -> Option<(PathKey, &str)> {
        if self.is_root() {
            return None;
        }
        let trimmed = &self.0[..self.0.len() - 1];
        let cut = trimmed.rfind(SEP)? + 1;
        Some((PathKey(self.0[..cut].to_string()), &self.0[cut..]))
    }

    /// Full path of a child listed under this key.
    pub fn join(&self, name: &str) -> String {
        let mut full = String::with_capacity(self.0.len() + name.len());
        full.push_str(&self.0);
        full.push_str(name);
        full
    }

    /// True when `other` is this key or lies underneath it.
    pub fn contains(&self, other: &PathKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PathKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A non-root path split into the branch that lists it and the segment
/// it is listed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub parent: PathKey,
    segment: String,
    directory: bool,
}

impl Split {
    /// The bare last segment, without trailing separator.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Whether the raw path was written in directory form.
    pub fn is_directory_hint(&self) -> bool {
        self.directory
    }

    /// The child name for this path, directory names carry a trailing
    /// separator.
    pub fn name(&self, is_dir: bool) -> String {
        if is_dir {
            format!("{}{}", self.segment, SEP)
        } else {
            self.segment.clone()
        }
    }

    /// Child names to look for, in resolution order: the form the path
    /// was written in first, then the other one.
    pub fn candidates(&self) -> [String; 2] {
        [self.name(self.directory), self.name(!self.directory)]
    }

    /// Directory-form key of the path itself.
    pub fn key(&self) -> PathKey {
        PathKey(self.parent.join(&self.name(true)))
    }
}

/// Splits `raw` into parent key and last segment. Returns `None` when the
/// path normalizes to the root, which has no parent.
pub fn split(raw: &str) -> Option<Split> {
    let mut segments = segments(raw);
    let segment = segments.pop()?.to_string();
    let last_raw = raw.rsplit(SEP).next().unwrap_or_default();
    let directory = raw.ends_with(SEP) || last_raw == "." || last_raw == "..";
    Some(Split {
        parent: PathKey::from_segments(&segments),
        segment,
        directory,
    })
}

/// Number of segments in a full path, ignoring a trailing separator.
pub fn segment_count(path: &str) -> usize {
    path.split(SEP).filter(|s| !s.is_empty()).count()
}

fn segments(raw: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for segment in raw.split(SEP) {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_forms_collapse() {
        for raw in ["", "/", "//", ".", "./", "/./", "..", "/boot/.."] {
            assert_eq!(PathKey::new(raw), PathKey::root(), "raw {:?}", raw);
            assert!(split(raw).is_none(), "raw {:?}", raw);
        }
    }

    #[test]
    fn test_new_normalizes_separators_and_dots() {
        assert_eq!(PathKey::new("boot").as_str(), "/boot/");
        assert_eq!(PathKey::new("/boot/").as_str(), "/boot/");
        assert_eq!(PathKey::new("./boot//grub/").as_str(), "/boot/grub/");
        assert_eq!(PathKey::new("boot/./grub/../efi").as_str(), "/boot/efi/");
        assert_eq!(PathKey::new("../../etc").as_str(), "/etc/");
    }

    #[test]
    fn test_parent_and_name() {
        let key = PathKey::new("/boot/grub/locale");
        let (parent, name) = key.parent_and_name().unwrap();
        assert_eq!(parent.as_str(), "/boot/grub/");
        assert_eq!(name, "locale/");

        let top = PathKey::new("boot");
        assert_eq!(top.parent(), Some(PathKey::root()));
        assert_eq!(PathKey::root().parent(), None);
    }

    #[test]
    fn test_depth() {
        assert_eq!(PathKey::root().depth(), 0);
        assert_eq!(PathKey::new("boot").depth(), 1);
        assert_eq!(PathKey::new("boot/grub/locale").depth(), 3);
    }

    #[test]
    fn test_split_keeps_directory_hint() {
        let dir = split("/boot/grub/").unwrap();
        assert_eq!(dir.parent.as_str(), "/boot/");
        assert_eq!(dir.segment(), "grub");
        assert!(dir.is_directory_hint());
        assert_eq!(dir.candidates(), ["grub/".to_string(), "grub".to_string()]);

        let leaf = split("boot/vmlinuz").unwrap();
        assert!(!leaf.is_directory_hint());
        assert_eq!(
            leaf.candidates(),
            ["vmlinuz".to_string(), "vmlinuz/".to_string()]
        );
        assert_eq!(leaf.key().as_str(), "/boot/vmlinuz/");
    }

    #[test]
    fn test_split_top_level_parent_is_root() {
        let top = split("bin").unwrap();
        assert!(top.parent.is_root());
        assert_eq!(top.name(true), "bin/");
    }

    #[test]
    fn test_join_and_contains() {
        let boot = PathKey::new("boot");
        assert_eq!(boot.join("grub/"), "/boot/grub/");
        assert_eq!(PathKey::root().join("bin/"), "/bin/");
        assert!(boot.contains(&PathKey::new("boot/grub")));
        assert!(!boot.contains(&PathKey::new("bootstrap")));
        assert!(PathKey::root().contains(&boot));
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(segment_count("/boot/grub/"), 2);
        assert_eq!(segment_count("/boot/grub/locale/x"), 4);
        assert_eq!(segment_count("/"), 0);
    }
}
