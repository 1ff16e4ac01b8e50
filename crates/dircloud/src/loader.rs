//! Reading `du`-style reports into a [`Tree`]
//!
//! Each line is `size<TAB>[timestamp<TAB>]path`, as printed by `du` and
//! `du --time`. A path that contained a newline spills onto the next
//! line(s); such continuation lines carry no size field and are joined
//! back onto the pending record with the path separator.

use crate::error::LoadError;
use crate::pathkey::SEP;
use crate::tree::{Tree, TreeOptions};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Bytes per `du` block.
pub const DEFAULT_UNIT: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Multiplier turning report sizes into bytes
    pub unit: u64,
    pub tree: TreeOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT,
            tree: TreeOptions::default(),
        }
    }
}

/// One parsed report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub size: u64,
    pub timestamp: String,
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub records: usize,
    pub skipped: usize,
}

/// A tree together with the report generation it was built from.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tree: Tree,
    pub source: PathBuf,
    /// Modification time of `source` when it was read
    pub modified: SystemTime,
    /// Taken before `source` was opened
    pub loaded_at: SystemTime,
    pub stats: LoadStats,
}

impl Snapshot {
    /// Whether a report at `source` last modified at `modified` calls for
    /// a fresh generation: any mtime other than the one read before
    /// parsing, earlier or later.
    pub fn is_stale(&self, source: &Path, modified: SystemTime) -> bool {
        source != self.source || modified != self.modified
    }
}

/// Parses a record line. Returns `None` for lines without a tab or
/// without a leading integer size.
pub fn parse_record(line: &str) -> Option<Record> {
    let mut fields = line.splitn(3, '\t');
    let size = fields.next()?.trim().parse::<u64>().ok()?;
    let second = fields.next()?;
    let (timestamp, path) = match fields.next() {
        Some(path) => (second, path),
        None => ("", second),
    };
    let path = path.strip_prefix("./").unwrap_or(path);
    Some(Record {
        size,
        timestamp: timestamp.to_string(),
        path: path.to_string(),
    })
}

/// Builds a fresh tree from report lines. Every record is a directory.
pub fn load_reader<R: BufRead>(mut reader: R, options: LoadOptions) -> io::Result<(Tree, LoadStats)> {
    let mut tree = Tree::new(options.tree);
    let mut stats = LoadStats::default();
    let mut pending: Option<Record> = None;
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if buf.is_empty() {
            continue;
        }
        let line = String::from_utf8_lossy(&buf);

        match parse_record(&line) {
            Some(record) => {
                if let Some(done) = pending.replace(record) {
                    insert(&mut tree, done, options.unit, &mut stats);
                }
            }
            None => match pending.as_mut() {
                Some(record) => {
                    record.path.push(SEP);
                    record.path.push_str(&line);
                }
                None => {
                    warn!(line = line_no, "skipping malformed report line");
                    stats.skipped += 1;
                }
            },
        }
    }

    if let Some(done) = pending {
        insert(&mut tree, done, options.unit, &mut stats);
    }
    Ok((tree, stats))
}

fn insert(tree: &mut Tree, record: Record, unit: u64, stats: &mut LoadStats) {
    tree.add_branch(
        &record.path,
        record.size.saturating_mul(unit),
        &record.timestamp,
        true,
    );
    stats.records += 1;
}

/// Modification time of a report, as used by the reload policy.
pub fn modified_time(path: &Path) -> Result<SystemTime, LoadError> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| LoadError::SourceUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// Reads a report file into a new generation.
pub fn load_file(path: &Path, options: LoadOptions) -> Result<Snapshot, LoadError> {
    let unreadable = |source| LoadError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    };
    let loaded_at = SystemTime::now();
    let modified = modified_time(path)?;
    let file = File::open(path).map_err(unreadable)?;
    let (tree, stats) = load_reader(BufReader::new(file), options).map_err(unreadable)?;
    debug!(
        path = %path.display(),
        records = stats.records,
        skipped = stats.skipped,
        branches = tree.len(),
        "report parsed"
    );

    Ok(Snapshot {
        tree,
        source: path.to_path_buf(),
        modified,
        loaded_at,
        stats,
    })
}
