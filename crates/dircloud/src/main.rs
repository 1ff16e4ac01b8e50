use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dircloud::format::human_readable;
use dircloud::loader::load_file;
use dircloud::scanner::{ProgressUpdate, ScanOptions, Scanner};
use dircloud::search::SearchBackendKind;
use dircloud::server::{self, AppState};
use dircloud::settings::Settings;
use dircloud::sort::SortPolicy;

#[derive(Parser)]
#[command(name = "dircloud")]
#[command(about = "Browse du reports as a size-weighted word cloud", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,

    /// Path to settings file
    #[arg(short = 'c', long, global = true)]
    config: Option<String>,

    /// Log requests and disk reads (also enabled by DIRCLOUD_DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one or more reports, the first one is shown (default)
    Serve(ServeArgs),
    /// Scan a directory and write a du-style report
    Scan {
        /// Directory to scan
        path: PathBuf,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report files too, not only directories
        #[arg(short, long)]
        all: bool,
        /// Add a modification time column
        #[arg(long)]
        time: bool,
        /// Bytes per reported block
        #[arg(long)]
        unit: Option<u64>,
    },
    /// Print the children of one branch of a report
    Show {
        /// Report file
        report: PathBuf,
        /// Branch to list
        #[arg(default_value = "/")]
        path: String,
    },
    /// Write the default settings file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options of the `serve` command. Each one overrides the settings file.
#[derive(Args, Debug, Default, Clone)]
struct ServeArgs {
    /// du report(s), output of `du` or `dircloud scan`
    files: Vec<PathBuf>,
    /// Server name
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    logo_href: Option<String>,
    #[arg(long)]
    logo_img: Option<String>,
    /// Bytes per du block
    #[arg(long = "du-units")]
    unit: Option<u64>,
    /// Sizes are abstract counts, not bytes on a disk
    #[arg(long)]
    non_disk: bool,
    /// Keep directory sizes as the sum of their descendants
    #[arg(long)]
    aggregate: bool,
    #[arg(long, value_enum)]
    sort: Option<SortPolicy>,
    #[arg(long)]
    document_root: Option<PathBuf>,
    /// File shown as header of directories read from disk
    #[arg(long)]
    header_name: Option<String>,
    /// File shown as footer of directories read from disk
    #[arg(long)]
    readme_name: Option<String>,
    /// File patterns to hide, in addition to the configured ones
    #[arg(long)]
    index_ignore: Vec<String>,
    /// Mime type for an extension, as `.ext:type`
    #[arg(long, value_parser = parse_mimetype)]
    mimetypes: Vec<(String, String)>,
    #[arg(long)]
    robots_txt: Option<String>,
    #[arg(long = "search-client", value_enum)]
    search_backend: Option<SearchBackendKind>,
    #[arg(long)]
    dict_host: Option<String>,
    #[arg(long)]
    search_tip: Option<String>,
    #[arg(long)]
    checkbox_tip: Option<String>,
    #[arg(long)]
    read_from_disk_tip: Option<String>,
    /// Filesystems left out of the space statistics
    #[arg(long)]
    ignore_filesystems: Vec<String>,
    /// Cache entries read from disk into the tree
    #[arg(long)]
    update_cache_from_disk: bool,
    /// How to open leaves: http://host/%s, file://path/%s,
    /// dict://host/d:%s[:database] or sqlite://path/db/d:%s:table:column:key
    #[arg(long)]
    openfile_fallback: Option<String>,
}

fn parse_mimetype(s: &str) -> Result<(String, String), String> {
    match s.split_once(':') {
        Some((ext, mime)) if ext.starts_with('.') && !mime.is_empty() => {
            Ok((ext.to_string(), mime.to_string()))
        }
        _ => Err(format!("expected .ext:mime/type, got {s:?}")),
    }
}

impl ServeArgs {
    fn apply(self, settings: &mut Settings) {
        let server = &mut settings.server;
        if let Some(host) = self.host {
            server.host = host;
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(href) = self.logo_href {
            server.logo_href = href;
        }
        if let Some(img) = self.logo_img {
            server.logo_img = img;
        }
        if let Some(robots) = self.robots_txt {
            server.robots_txt = robots;
        }

        let tree = &mut settings.tree;
        if let Some(unit) = self.unit {
            tree.unit = unit;
        }
        tree.non_disk |= self.non_disk;
        tree.aggregate |= self.aggregate;
        if let Some(sort) = self.sort {
            tree.sort = sort;
        }

        let disk = &mut settings.disk;
        if let Some(root) = self.document_root {
            disk.document_root = root;
        }
        if self.header_name.is_some() {
            disk.header_name = self.header_name;
        }
        if self.readme_name.is_some() {
            disk.readme_name = self.readme_name;
        }
        disk.index_ignore.extend(self.index_ignore);
        disk.mimetypes.extend(self.mimetypes);
        disk.update_cache_from_disk |= self.update_cache_from_disk;

        let search = &mut settings.search;
        if let Some(backend) = self.search_backend {
            search.backend = backend;
        }
        if let Some(host) = self.dict_host {
            search.dict_host = host;
        }
        if let Some(tip) = self.search_tip {
            search.search_tip = tip;
        }
        if let Some(tip) = self.checkbox_tip {
            search.checkbox_tip = tip;
        }
        if let Some(tip) = self.read_from_disk_tip {
            search.read_from_disk_tip = tip;
        }

        settings
            .space
            .ignore_filesystems
            .extend(self.ignore_filesystems);
        if self.openfile_fallback.is_some() {
            settings.openfile_fallback = self.openfile_fallback;
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "dircloud=debug,tower_http=debug"
    } else {
        "dircloud=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose || std::env::var_os("DIRCLOUD_DEBUG").is_some());

    let settings_path = if let Some(config) = &cli.config {
        PathBuf::from(shellexpand::tilde(config).to_string())
    } else {
        Settings::default_path()
    };

    match cli.command {
        None => serve(cli.serve, &settings_path).await?,
        Some(Commands::Serve(args)) => serve(args, &settings_path).await?,
        Some(Commands::Scan {
            path,
            output,
            all,
            time,
            unit,
        }) => {
            let settings = Settings::load(&settings_path).context("Failed to load settings")?;
            let options = ScanOptions {
                unit: unit.unwrap_or(settings.tree.unit),
                all,
                time,
            };
            scan(path, output, options).await?;
        }
        Some(Commands::Show { report, path }) => {
            let settings = Settings::load(&settings_path).context("Failed to load settings")?;
            let snapshot = tokio::task::spawn_blocking(move || {
                load_file(&report, settings.load_options()).map(|s| (s, settings.tree.non_disk))
            })
            .await??;
            let (snapshot, non_disk) = snapshot;
            let tree = &snapshot.tree;

            println!(
                "{} ({})",
                path,
                human_readable(tree.branch_size(&path), non_disk)
            );
            for child in tree.children(&path) {
                println!(
                    "  {:>12}  {:<16}  {}",
                    human_readable(child.size, non_disk),
                    child.timestamp,
                    child.name
                );
            }
        }
        Some(Commands::InitConfig { force }) => {
            if settings_path.exists() && !force {
                bail!(
                    "{} already exists, use --force to overwrite it",
                    settings_path.display()
                );
            }
            Settings::default().save(&settings_path)?;
            println!("Wrote {}", settings_path.display());
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs, settings_path: &std::path::Path) -> Result<()> {
    let mut settings = Settings::load(settings_path).context("Failed to load settings")?;
    let files: Vec<PathBuf> = args
        .files
        .iter()
        .map(|f| PathBuf::from(shellexpand::tilde(&f.to_string_lossy()).to_string()))
        .collect();
    if files.is_empty() {
        bail!("No report file given. Run 'dircloud scan <dir> -o du.txt' to create one.");
    }
    args.apply(&mut settings);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let state = AppState::new(settings, files)?;

    // Load once up front so a bad report fails at startup.
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || store.current())
        .await?
        .context("Failed to load report")?;

    server::serve(state, &host, port).await
}

async fn scan(path: PathBuf, output: Option<PathBuf>, options: ScanOptions) -> Result<()> {
    eprintln!("Scanning: {}", path.display());

    // Create channel for progress updates
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressUpdate>();

    // Spawn progress monitor task
    let progress_handle = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            eprint!(
                "\r\x1B[KProgress: {} entries, {} directories, {}",
                progress.entries_scanned,
                progress.dirs_scanned,
                human_readable(progress.total_size, false)
            );
            if progress.active_workers > 0 {
                eprint!(" | {} parallel workers", progress.active_workers);
            }
            std::io::Write::flush(&mut std::io::stderr()).ok();
        }
    });

    // Ctrl-C stops the walk; the partial report is still written
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_signal = cancelled.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancelled_signal.store(true, Ordering::Relaxed);
        }
    });

    // Scan in a blocking thread to not block the tokio runtime
    let stats = tokio::task::spawn_blocking(move || {
        let scanner = Scanner::with_progress(&path, options, Some(progress_tx), cancelled);
        let out: Box<dyn Write> = match &output {
            Some(file) => Box::new(BufWriter::new(
                File::create(file)
                    .with_context(|| format!("Failed to create {}", file.display()))?,
            )),
            None => Box::new(BufWriter::new(std::io::stdout().lock())),
        };
        scanner.write_report(out)
    })
    .await??;

    // The sender is gone with the scanner, so the monitor ends
    progress_handle.await?;

    eprint!("\r\x1B[K");
    eprintln!("Scan complete!");
    eprintln!("  Files: {}", stats.total_files);
    eprintln!("  Directories: {}", stats.total_dirs);
    eprintln!("  Total size: {}", human_readable(stats.total_size, false));
    if stats.skipped > 0 {
        eprintln!("  Skipped: {} unreadable entries", stats.skipped);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mimetype() {
        assert_eq!(
            parse_mimetype(".md:text/markdown").unwrap(),
            (".md".to_string(), "text/markdown".to_string())
        );
        assert!(parse_mimetype("md:text/markdown").is_err());
        assert!(parse_mimetype(".md").is_err());
    }

    #[test]
    fn test_serve_args_override_settings() {
        let cli = Cli::parse_from([
            "dircloud",
            "--port",
            "8080",
            "--non-disk",
            "--sort",
            "lexicographic",
            "--index-ignore",
            "*.bak",
            "--search-client",
            "string",
            "du.txt",
            "old.txt",
        ]);
        assert!(cli.command.is_none());
        assert_eq!(cli.serve.files, vec![PathBuf::from("du.txt"), PathBuf::from("old.txt")]);

        let mut settings = Settings::default();
        cli.serve.apply(&mut settings);
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "localhost");
        assert!(settings.tree.non_disk);
        assert_eq!(settings.tree.sort, SortPolicy::Lexicographic);
        assert_eq!(settings.disk.index_ignore, vec!["*~".to_string(), "*.bak".to_string()]);
        assert_eq!(settings.search.backend, SearchBackendKind::String);
    }

    #[test]
    fn test_scan_subcommand() {
        let cli = Cli::parse_from(["dircloud", "scan", "/srv", "--all", "-o", "du.txt"]);
        match cli.command {
            Some(Commands::Scan { path, output, all, time, unit }) => {
                assert_eq!(path, PathBuf::from("/srv"));
                assert_eq!(output, Some(PathBuf::from("du.txt")));
                assert!(all);
                assert!(!time);
                assert!(unit.is_none());
            }
            _ => panic!("expected scan"),
        }
    }
}
