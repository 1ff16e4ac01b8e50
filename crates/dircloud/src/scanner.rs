//! Walks a directory and produces a `du`-style report

use crate::disk::TIMESTAMP_FORMAT;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Bytes per reported block, sizes are rounded up
    pub unit: u64,
    /// Also report plain files, like `du --all`
    pub all: bool,
    /// Add a modification time column, like `du --time`
    pub time: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            unit: crate::loader::DEFAULT_UNIT,
            all: false,
            time: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// `.` for the scanned root, `./relative/path` below it
    pub path: String,
    pub size: u64,
    /// Latest modification time of the entry or anything beneath it
    pub modified_at: Option<SystemTime>,
    pub is_dir: bool,
}

impl ReportEntry {
    /// Formats the entry as one report line, without the newline.
    pub fn to_line(&self, options: &ScanOptions) -> String {
        let blocks = self.size.div_ceil(options.unit.max(1));
        if options.time {
            let stamp = self
                .modified_at
                .map(|t| DateTime::<Local>::from(t).format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default();
            format!("{}\t{}\t{}", blocks, stamp, self.path)
        } else {
            format!("{}\t{}", blocks, self.path)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total_size: u64,
    pub total_files: u64,
    pub total_dirs: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub entries_scanned: u64,
    pub dirs_scanned: u64,
    pub total_size: u64,
    /// Approximate number of directories being walked in parallel
    pub active_workers: usize,
}

const PROGRESS_UPDATE_INTERVAL: u64 = 1000;
const PARALLEL_THRESHOLD: usize = 100;

#[derive(Default)]
struct Counters {
    total_size: AtomicU64,
    total_files: AtomicU64,
    total_dirs: AtomicU64,
    skipped: AtomicU64,
}

/// Result of walking one subtree: its size, its latest modification and
/// the report entries in `du` order (children before their parent).
struct Walked {
    size: u64,
    modified_at: Option<SystemTime>,
    entries: Vec<ReportEntry>,
}

pub struct Scanner {
    root_path: PathBuf,
    options: ScanOptions,
    progress_sender: Option<mpsc::UnboundedSender<ProgressUpdate>>,
    entries_processed: AtomicU64,
    active_workers: AtomicUsize,
    /// When set, the walk stops descending and returns what it has
    cancelled: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new<P: AsRef<Path>>(root_path: P, options: ScanOptions) -> Self {
        Self::with_progress(root_path, options, None, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_progress<P: AsRef<Path>>(
        root_path: P,
        options: ScanOptions,
        progress_sender: Option<mpsc::UnboundedSender<ProgressUpdate>>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            root_path: root_path.as_ref().to_path_buf(),
            options,
            progress_sender,
            entries_processed: AtomicU64::new(0),
            active_workers: AtomicUsize::new(0),
            cancelled,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Walks the root and returns the report entries in `du` order.
    pub fn scan(&self) -> Result<(Vec<ReportEntry>, ScanStats)> {
        let metadata = fs::metadata(&self.root_path)
            .with_context(|| format!("Failed to read {}", self.root_path.display()))?;
        if !metadata.is_dir() {
            bail!("{} is not a directory", self.root_path.display());
        }

        let counters = Counters::default();
        let walked = self.scan_recursive(&self.root_path, ".", &counters);

        let stats = ScanStats {
            total_size: counters.total_size.load(Ordering::Relaxed),
            total_files: counters.total_files.load(Ordering::Relaxed),
            total_dirs: counters.total_dirs.load(Ordering::Relaxed),
            skipped: counters.skipped.load(Ordering::Relaxed),
        };
        Ok((walked.entries, stats))
    }

    /// Scans and writes the report to `out`.
    pub fn write_report<W: Write>(&self, mut out: W) -> Result<ScanStats> {
        let (entries, stats) = self.scan()?;
        for entry in &entries {
            writeln!(out, "{}", entry.to_line(&self.options)).context("Failed to write report")?;
        }
        out.flush().context("Failed to write report")?;
        Ok(stats)
    }

    fn scan_recursive(&self, path: &Path, report_path: &str, counters: &Counters) -> Walked {
        let empty = Walked {
            size: 0,
            modified_at: None,
            entries: Vec::new(),
        };
        if self.cancelled.load(Ordering::Relaxed) {
            return empty;
        }

        // Symlinks are reported, not followed.
        let metadata = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(_) => {
                counters.skipped.fetch_add(1, Ordering::Relaxed);
                return empty;
            }
        };
        let modified_at = metadata.modified().ok();

        if !metadata.is_dir() {
            let size = metadata.len();
            counters.total_files.fetch_add(1, Ordering::Relaxed);
            counters.total_size.fetch_add(size, Ordering::Relaxed);
            let mut entries = Vec::new();
            if self.options.all {
                entries.push(ReportEntry {
                    path: report_path.to_string(),
                    size,
                    modified_at,
                    is_dir: false,
                });
            }
            self.tick(counters);
            return Walked {
                size,
                modified_at,
                entries,
            };
        }

        counters.total_dirs.fetch_add(1, Ordering::Relaxed);
        let children: Vec<(PathBuf, String)> = match fs::read_dir(path) {
            Ok(read_dir) => read_dir
                .filter_map(|e| e.ok())
                .map(|e| {
                    let name = e.file_name().to_string_lossy().to_string();
                    (e.path(), format!("{}/{}", report_path, name))
                })
                .collect(),
            Err(_) => {
                // Still report the directory even if we can't read it
                counters.skipped.fetch_add(1, Ordering::Relaxed);
                Vec::new()
            }
        };

        // For small directories, walk serially; for large ones, use parallelism
        let walked: Vec<Walked> = if children.len() > PARALLEL_THRESHOLD {
            self.active_workers.fetch_add(1, Ordering::Relaxed);
            let walked = children
                .par_iter()
                .map(|(child, report)| self.scan_recursive(child, report, counters))
                .collect();
            self.active_workers.fetch_sub(1, Ordering::Relaxed);
            walked
        } else {
            children
                .iter()
                .map(|(child, report)| self.scan_recursive(child, report, counters))
                .collect()
        };

        let mut size = 0u64;
        let mut latest = modified_at;
        let mut entries = Vec::new();
        for child in walked {
            size = size.saturating_add(child.size);
            latest = latest.max(child.modified_at);
            entries.extend(child.entries);
        }
        entries.push(ReportEntry {
            path: report_path.to_string(),
            size,
            modified_at: latest,
            is_dir: true,
        });
        self.tick(counters);

        Walked {
            size,
            modified_at: latest,
            entries,
        }
    }

    fn tick(&self, counters: &Counters) {
        let count = self.entries_processed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(progress_tx) = &self.progress_sender {
            if count % PROGRESS_UPDATE_INTERVAL == 0 {
                let _ = progress_tx.send(ProgressUpdate {
                    entries_scanned: count,
                    dirs_scanned: counters.total_dirs.load(Ordering::Relaxed),
                    total_size: counters.total_size.load(Ordering::Relaxed),
                    active_workers: self.active_workers.load(Ordering::Relaxed),
                });
            }
        }
    }
}
