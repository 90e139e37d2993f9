use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use super::data::LogFile;
use super::index::{IndexEntry, IndexFile};
use crate::encoding;
use crate::error::Result;
use crate::record::Record;
use crate::Error;

/// Totals reported when a writer finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub records: u64,
    pub bytes: u64,
}

/// Appends records to a log/index pair.
///
/// The writer owns the running log offset. Each record's payload goes to the
/// log first, then an index entry pointing at it. There is no rollback: if the
/// index append fails after the payload was written, the log holds an
/// unreferenced tail and the error is returned.
#[derive(Debug)]
pub struct Writer {
    log: LogFile,
    index: IndexFile,
    offset: u64,
    last_timestamp: Option<u64>,
    stats: WriteStats,
    sync_on_finish: bool,
}

impl Writer {
    /// Starts a fresh pair, truncating both files.
    pub fn create(log_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self> {
        let log = LogFile::create(log_path)?;
        let index = IndexFile::create(index_path)?;
        Ok(Self::from_parts(log, index, 0, None))
    }

    /// Continues an existing pair. New payloads start at the current log length.
    pub fn resume(log_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<Self> {
        let log = LogFile::open_append(log_path)?;
        let index = IndexFile::open_append(index_path)?;

        let trailing = index.trailing_bytes()?;
        if trailing != 0 {
            tracing::warn!(
                path = %index.path().display(),
                trailing,
                "Index has a torn trailing entry; it will be overwritten"
            );
        }
        let offset = log.len()?;
        let mut last_timestamp = None;
        if let Some(last) = index.len()?.checked_sub(1) {
            if let Some(entry) = index.read_at(last)? {
                if entry.offset >= offset {
                    return Err(Error::IndexCorruption(format!(
                        "last index entry points at {} but the log is {} bytes",
                        entry.offset, offset
                    )));
                }
                last_timestamp = Some(entry.timestamp);
            }
        }

        tracing::info!(
            log = %log.path().display(),
            entries = index.len()?,
            offset,
            "Resuming dump"
        );
        Ok(Self::from_parts(log, index, offset, last_timestamp))
    }

    fn from_parts(
        log: LogFile,
        index: IndexFile,
        offset: u64,
        last_timestamp: Option<u64>,
    ) -> Self {
        Self {
            log,
            index,
            offset,
            last_timestamp,
            stats: WriteStats::default(),
            sync_on_finish: true,
        }
    }

    /// Whether `finish` fsyncs both files.
    pub fn sync_on_finish(mut self, enabled: bool) -> Self {
        self.sync_on_finish = enabled;
        self
    }

    /// Byte offset the next payload will be written at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Appends a record stamped with the current wall-clock time.
    pub fn write(&mut self, record: &Record) -> Result<IndexEntry> {
        self.write_at(record, now())
    }

    /// Appends a record with an explicit timestamp (nanoseconds since epoch).
    pub fn write_at(&mut self, record: &Record, timestamp: u64) -> Result<IndexEntry> {
        let kind = record.kind();
        if let Some(last) = self.last_timestamp.filter(|last| timestamp < *last) {
            tracing::warn!(
                log = %self.log.path().display(),
                timestamp,
                last,
                "Timestamp goes backwards; lookups by time will be unreliable"
            );
        }
        let bytes = encoding::encode(record).map_err(|e| Error::Encode(kind, e.to_string()))?;

        let written_at = self.log.append(&bytes)?;
        if written_at != self.offset {
            return Err(Error::InvalidState(format!(
                "log append landed at {written_at}, expected {}",
                self.offset
            )));
        }

        let entry = IndexEntry {
            timestamp,
            offset: self.offset,
            kind,
        };
        self.index.append(&entry)?;

        self.offset += bytes.len() as u64;
        self.last_timestamp = Some(timestamp);
        self.stats.records += 1;
        self.stats.bytes += bytes.len() as u64;
        Ok(entry)
    }

    /// Flushes both files to disk.
    pub fn sync(&mut self) -> Result<()> {
        self.log.sync()?;
        self.index.sync()
    }

    /// Closes the pair and reports what this writer appended.
    pub fn finish(mut self) -> Result<WriteStats> {
        if self.sync_on_finish {
            self.sync()?;
        }
        tracing::debug!(
            log = %self.log.path().display(),
            records = self.stats.records,
            bytes = self.stats.bytes,
            "Writer finished"
        );
        Ok(self.stats)
    }
}

/// Nanoseconds since the unix epoch.
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
