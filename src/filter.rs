//! Filtering a dump into a new dump.
//!
//! One blocking task scans the source and runs the matcher, a second one
//! writes matches to the output pair. They are connected by a single bounded
//! channel, so output order is scan order. A failure on either side stops
//! both; records already written stay written.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinError;

use crate::config::{DumpConfig, TimestampSource};
use crate::dump::{Scanned, Scanner, WriteStats, Writer};
use crate::error::Result;
use crate::matcher::Matcher;
use crate::record::Hash;
use crate::Error;

/// Input and output locations of a filter run.
#[derive(Debug, Clone)]
pub struct FilterJob {
    pub log: PathBuf,
    pub index: PathBuf,
    pub target: Hash,
    pub out_log: PathBuf,
    pub out_index: PathBuf,
    /// Append to an existing output pair instead of truncating it.
    pub append: bool,
}

impl FilterJob {
    pub fn new(
        log: impl AsRef<Path>,
        index: impl AsRef<Path>,
        target: Hash,
        out_log: impl AsRef<Path>,
        out_index: impl AsRef<Path>,
    ) -> Self {
        Self {
            log: log.as_ref().to_path_buf(),
            index: index.as_ref().to_path_buf(),
            target,
            out_log: out_log.as_ref().to_path_buf(),
            out_index: out_index.as_ref().to_path_buf(),
            append: false,
        }
    }

    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub scanned: u64,
    pub matched: u64,
    pub written: WriteStats,
}

/// Opens the files named by `job` and filters the source into the output.
pub async fn run(job: FilterJob, config: &DumpConfig) -> Result<FilterStats> {
    let matcher = Matcher::new(job.target)?;
    let scanner = Scanner::open(&job.log, &job.index)?;
    let writer = if job.append {
        Writer::resume(&job.out_log, &job.out_index)?
    } else {
        Writer::create(&job.out_log, &job.out_index)?
    };

    tracing::info!(
        source = %job.log.display(),
        output = %job.out_log.display(),
        target = %job.target,
        "Filtering dump"
    );
    filter(scanner, matcher, writer, config).await
}

/// Scans `scanner`, writing every record accepted by `matcher` to `writer`.
pub async fn filter(
    scanner: Scanner,
    mut matcher: Matcher,
    writer: Writer,
    config: &DumpConfig,
) -> Result<FilterStats> {
    let started = Instant::now();
    let (tx, rx) = mpsc::channel::<Scanned>(config.channel_capacity);
    let writer = writer.sync_on_finish(config.sync_on_finish);
    let timestamps = config.timestamp_source;

    let producer = tokio::task::spawn_blocking(move || -> Result<u64> {
        let mut scanned = 0u64;
        for item in scanner.into_iter_from(0) {
            let item = item?;
            scanned += 1;
            if matcher.matches(&item.record) {
                tracing::debug!(
                    position = item.position,
                    kind = %item.entry.kind,
                    id = item.record.id(),
                    "Record matched"
                );
                tx.blocking_send(item).map_err(|_| Error::ChannelClosed)?;
            }
        }
        Ok(scanned)
    });

    let consumer = tokio::task::spawn_blocking(move || write_matches(rx, writer, timestamps));

    let (scan_result, write_result) = tokio::join!(producer, consumer);
    let scan_result = scan_result.map_err(join_error)?;
    let write_result = write_result.map_err(join_error)?;

    // A writer failure closes the channel, which the scanner reports as
    // ChannelClosed; the writer's error is the cause.
    let (scanned, written) = match (scan_result, write_result) {
        (_, Err(e)) => return Err(e),
        (Err(e), Ok(stats)) => {
            tracing::error!(written = stats.records, error = %e, "Filter aborted");
            return Err(e);
        }
        (Ok(scanned), Ok(stats)) => (scanned, stats),
    };

    let stats = FilterStats {
        scanned,
        matched: written.records,
        written,
    };
    tracing::info!(
        scanned = stats.scanned,
        matched = stats.matched,
        bytes = stats.written.bytes,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Filter finished"
    );
    Ok(stats)
}

fn write_matches(
    mut rx: mpsc::Receiver<Scanned>,
    mut writer: Writer,
    timestamps: TimestampSource,
) -> Result<WriteStats> {
    while let Some(item) = rx.blocking_recv() {
        match timestamps {
            TimestampSource::WriteTime => writer.write(&item.record)?,
            TimestampSource::Source => writer.write_at(&item.record, item.entry.timestamp)?,
        };
    }
    writer.finish()
}

fn join_error(e: JoinError) -> Error {
    Error::InvalidState(format!("Task join error: {}", e))
}
