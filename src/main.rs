//! snapdump command-line tool
//!
//! Works on capture dumps of snap-sync responses: filter them down to the
//! records that reference a hash, browse them around a point in time, and
//! check them for damage.
//!
//! ```bash
//! # Keep only records mentioning a hash
//! snapdump filter snap.dump snap.index 0x56e8...b421 out.dump out.index
//!
//! # Browse records written around a time
//! snapdump view snap.dump snap.index "2024-03-01 12:30"
//!
//! # Check a dump before trusting it
//! snapdump verify snap.dump snap.index
//! ```
//!
//! Log output goes to stderr and honours `RUST_LOG` (default `info`);
//! `--verbose` turns on debug logging.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snapdump::filter::{self, FilterJob};
use snapdump::time::parse_timestamp;
use snapdump::{DumpConfig, Hash, Navigator, Scanner, TimestampSource, View};

mod repl;

pub(crate) const PRECEDES_LOG: &str = "Time precedes the first record; showing the start of the dump";

#[derive(Parser)]
#[command(name = "snapdump")]
#[command(about = "Inspect and filter snap-sync capture dumps", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy the records referencing a hash into a new dump
    Filter {
        /// Source log file
        dump: PathBuf,
        /// Source index file
        index: PathBuf,
        /// Hash to look for (hex, optional 0x prefix)
        hash: String,
        /// Output log file
        out_dump: PathBuf,
        /// Output index file
        out_index: PathBuf,
        /// Stamp copied records with their source timestamps instead of the copy time
        #[arg(long)]
        keep_timestamps: bool,
        /// Records buffered between the scanning and writing tasks
        #[arg(long, env = "SNAPDUMP_CHANNEL_CAPACITY", default_value = "1024")]
        channel_capacity: usize,
        /// Append to an existing output dump instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Browse records interactively, starting at a point in time
    View {
        dump: PathBuf,
        index: PathBuf,
        /// RFC 3339, "YYYY-MM-DD HH:MM[:SS]" (local), or a unix timestamp
        time: String,
        /// Records shown on each side of the cursor
        #[arg(short, long, default_value = "2")]
        radius: usize,
        /// Directory for exported records
        #[arg(long, env = "SNAPDUMP_EXPORT_DIR")]
        export_dir: Option<PathBuf>,
    },
    /// Print the record written at or just before a point in time
    Locate {
        dump: PathBuf,
        index: PathBuf,
        time: String,
    },
    /// Check a dump for truncation, gaps, and undecodable records
    Verify { dump: PathBuf, index: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Filter {
            dump,
            index,
            hash,
            out_dump,
            out_index,
            keep_timestamps,
            channel_capacity,
            append,
        } => {
            let target: Hash = hash.parse().context("Invalid target hash")?;
            let source = if keep_timestamps {
                TimestampSource::Source
            } else {
                TimestampSource::WriteTime
            };
            let config = DumpConfig::new()
                .channel_capacity(channel_capacity)
                .timestamp_source(source);
            let job = FilterJob::new(dump, index, target, out_dump, out_index).append(append);

            let stats = filter::run(job, &config)
                .await
                .context("Filter failed")?;
            println!(
                "Scanned {} records, wrote {} ({} bytes)",
                stats.scanned, stats.matched, stats.written.bytes
            );
        }
        Commands::View {
            dump,
            index,
            time,
            radius,
            export_dir,
        } => {
            let timestamp = parse_timestamp(&time).context("Invalid time")?;
            let scanner = open(&dump, &index)?;
            let navigator =
                Navigator::locate(scanner, timestamp).context("Failed to locate time")?;

            let mut config = DumpConfig::new().window_radius(radius);
            if let Some(dir) = export_dir {
                config = config.export_dir(dir);
            }
            repl::Viewer::new(navigator, &config)?.run()?;
        }
        Commands::Locate { dump, index, time } => {
            let timestamp = parse_timestamp(&time).context("Invalid time")?;
            let scanner = open(&dump, &index)?;
            let navigator =
                Navigator::locate(scanner, timestamp).context("Failed to locate time")?;
            if navigator.precedes_log() {
                println!("{PRECEDES_LOG}");
                println!("{}", render(&View::StartOfLog, false));
            } else {
                println!("{}", render(&navigator.current()?, true));
            }
        }
        Commands::Verify { dump, index } => {
            let report = snapdump::verify(&dump, &index)
                .with_context(|| format!("Failed to verify {}", dump.display()))?;
            println!("Entries:      {}", report.entries);
            println!("Log size:     {} bytes", report.log_len);
            println!(
                "Time ordered: {}",
                if report.timestamps_sorted { "yes" } else { "no" }
            );
            if report.is_ok() {
                println!("No problems found");
            } else {
                for issue in &report.issues {
                    println!("  - {issue}");
                }
                bail!("{} problems found", report.issues.len());
            }
        }
    }

    Ok(())
}

fn open(dump: &Path, index: &Path) -> Result<Scanner> {
    Scanner::open(dump, index).with_context(|| {
        format!(
            "Failed to open dump {} with index {}",
            dump.display(),
            index.display()
        )
    })
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Row rendering shared by `locate` and the viewer: a title line with the
/// write time, then the record summary.
pub(crate) fn render(view: &View, current: bool) -> String {
    let marker = if current { ">" } else { " " };
    match view.title() {
        Some(title) => format!("{marker} [{title}]\n{view}"),
        None => format!("{marker} {view}"),
    }
}
