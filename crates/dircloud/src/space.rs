//! Total, used and free space per mounted filesystem, as a [`Tree`]
//!
//! The tree has three top-level branches, `size/`, `used/` and
//! `available/`, each listing one child per filesystem. The description
//! of each metric is kept in the timestamp field, and a metric's own size
//! is the sum of its children.

use crate::pathkey::SEP;
use crate::store::{read_lock, write_lock};
use crate::tree::Tree;
use std::process::Command;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Metric branch names and their descriptions.
pub const METRICS: [(&str, &str); 3] = [
    ("size", "Total space, used and free"),
    ("used", "Used space"),
    ("available", "Free space available"),
];

/// One data line of `df -kP`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filesystem {
    pub source: String,
    pub size: u64,
    pub used: u64,
    pub available: u64,
    pub mounted_on: String,
}

impl Filesystem {
    /// Segment the filesystem is listed as: `root` for `/`, nested mount
    /// points joined with `-` so that every filesystem sits directly under
    /// its metric.
    pub fn branch_name(&self) -> String {
        let segments: Vec<&str> = self.mounted_on.split(SEP).filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            "root".to_string()
        } else {
            segments.join("-")
        }
    }

    fn metric(&self, metric: &str) -> u64 {
        match metric {
            "size" => self.size,
            "used" => self.used,
            _ => self.available,
        }
    }
}

/// Parses `df -kP` output. Header lines and lines whose size column is not
/// a number are skipped, as are filesystems named in `ignore`.
pub fn parse_df(output: &str, ignore: &[String]) -> Vec<Filesystem> {
    output
        .lines()
        .filter_map(|line| {
            let (fields, mounted_on) = split_fields(line, 5)?;
            let kb = |s: &str| s.parse::<u64>().ok().map(|n| n.saturating_mul(1024));
            Some(Filesystem {
                source: fields[0].to_string(),
                size: kb(fields[1])?,
                used: kb(fields[2])?,
                available: kb(fields[3])?,
                mounted_on: mounted_on.to_string(),
            })
        })
        .filter(|fs| !ignore.iter().any(|name| *name == fs.source))
        .collect()
}

/// Splits off `n` whitespace-separated fields and returns the rest of the
/// line, which may itself contain spaces.
fn split_fields(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(n);
    for _ in 0..n {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    (!rest.is_empty()).then_some((fields, rest.trim_end()))
}

pub fn build_tree(filesystems: &[Filesystem]) -> Tree {
    let mut tree = Tree::default();
    for (metric, description) in METRICS {
        let mut total = 0u64;
        tree.add_branch(metric, 0, description, true);
        for fs in filesystems {
            let bytes = fs.metric(metric);
            let path = format!("{}{}{}", metric, SEP, fs.branch_name());
            tree.add_branch(&path, bytes, description, true);
            total = total.saturating_add(bytes);
        }
        tree.update_branch(metric, total, description);
    }
    tree
}

/// Runs `df` and builds the space tree. A failing `df` gives an empty
/// tree.
pub fn read_df(ignore: &[String]) -> Tree {
    let output = Command::new("df").arg("-kP").env("LC_ALL", "C").output();
    match output {
        Ok(out) if out.status.success() || !out.stdout.is_empty() => {
            let text = String::from_utf8_lossy(&out.stdout);
            let filesystems = parse_df(&text, ignore);
            debug!(filesystems = filesystems.len(), "read df output");
            build_tree(&filesystems)
        }
        Ok(out) => {
            warn!(status = %out.status, "df failed, space statistics unavailable");
            Tree::default()
        }
        Err(e) => {
            warn!(error = %e, "cannot run df, space statistics unavailable");
            Tree::default()
        }
    }
}

/// Caches the space tree, rebuilding it when it is older than the report
/// generation it is shown with.
#[derive(Debug)]
pub struct SpaceStore {
    ignore: Vec<String>,
    enabled: bool,
    current: RwLock<Option<(SystemTime, Arc<Tree>)>>,
}

impl SpaceStore {
    /// A disabled store (non-disk mode) always yields an empty tree.
    pub fn new(ignore: Vec<String>, enabled: bool) -> Self {
        Self {
            ignore,
            enabled,
            current: RwLock::new(None),
        }
    }

    pub fn current(&self, generation: SystemTime) -> Arc<Tree> {
        if let Some((built_at, tree)) = read_lock(&self.current).as_ref() {
            if *built_at >= generation {
                return Arc::clone(tree);
            }
        }
        let tree = Arc::new(if self.enabled {
            read_df(&self.ignore)
        } else {
            Tree::default()
        });
        *write_lock(&self.current) = Some((SystemTime::now(), Arc::clone(&tree)));
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const DF: &str = "\
Filesystem     1024-blocks      Used Available Capacity Mounted on
/dev/sda1         10000000   4000000   6000000      40% /
udev                 10000         0     10000       0% /dev
tmpfs                 5000       100      4900       2% /run
/dev/sda2          2000000   1000000   1000000      50% /boot/efi
//nas/share        3000000   2000000   1000000      67% /mnt/my share
";

    fn ignore() -> Vec<String> {
        vec!["tmpfs".to_string(), "udev".to_string()]
    }

    #[test]
    fn test_parse_df_skips_header_and_ignored() {
        let filesystems = parse_df(DF, &ignore());
        let sources: Vec<&str> = filesystems.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(sources, vec!["/dev/sda1", "/dev/sda2", "//nas/share"]);
        assert_eq!(filesystems[0].size, 10000000 * 1024);
        assert_eq!(filesystems[2].mounted_on, "/mnt/my share");
    }

    #[test]
    fn test_branch_names() {
        let filesystems = parse_df(DF, &ignore());
        let names: Vec<String> = filesystems.iter().map(Filesystem::branch_name).collect();
        assert_eq!(names, vec!["root", "boot-efi", "mnt-my share"]);
    }

    #[test]
    fn test_tree_metrics_and_totals() {
        let tree = build_tree(&parse_df(DF, &ignore()));
        let metrics: Vec<&str> = tree.children("/").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(metrics, vec!["available/", "size/", "used/"]);

        assert_eq!(tree.branch_size("used/root"), 4000000 * 1024);
        assert_eq!(tree.branch_size("used"), (4000000 + 1000000 + 2000000) * 1024);
        assert_eq!(tree.branch_timestamp("available"), "Free space available");
        let listed: u64 = tree.children("size").iter().map(|c| c.size).sum();
        assert_eq!(tree.branch_size("size"), listed);
    }

    #[test]
    fn test_empty_output_gives_zero_metrics() {
        let tree = build_tree(&parse_df("", &[]));
        assert_eq!(tree.children("/").len(), 3);
        assert_eq!(tree.branch_size("size"), 0);
    }

    #[test]
    fn test_disabled_store_is_empty_and_cached() {
        let store = SpaceStore::new(vec![], false);
        let first = store.current(SystemTime::UNIX_EPOCH);
        assert!(first.is_empty());
        let second = store.current(SystemTime::UNIX_EPOCH);
        assert!(Arc::ptr_eq(&first, &second));

        let newer = store.current(SystemTime::now() + Duration::from_secs(60));
        assert!(!Arc::ptr_eq(&first, &newer));
    }
}
