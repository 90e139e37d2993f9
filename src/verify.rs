//! Whole-dump integrity check.
//!
//! Scans stop silently at the first short index read, so a damaged pair can
//! look like a shorter, healthy one. Verification walks every entry and
//! reports what a scan would have glossed over.

use std::fmt;
use std::path::Path;

use crate::dump::{data::decode_error, IndexFile, LogFile, ENTRY_SIZE};
use crate::encoding;
use crate::error::Result;
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// The index length is not a multiple of the entry size.
    TrailingIndexBytes(u64),
    /// A payload does not start where the previous one ended.
    OffsetMismatch {
        position: u64,
        expected: u64,
        found: u64,
    },
    /// An entry points at or past the end of the log.
    OffsetBeyondLog { position: u64, offset: u64 },
    /// An index entry names a kind that does not exist.
    BadKind { position: u64, kind: u8 },
    /// An index entry could not be read back.
    BadEntry { position: u64, reason: String },
    /// The payload at an entry does not decode as the entry's kind.
    Undecodable { position: u64, reason: String },
    /// A timestamp is smaller than the one before it.
    TimestampRegression {
        position: u64,
        previous: u64,
        timestamp: u64,
    },
    /// Log bytes after the last referenced payload.
    TrailingLogBytes(u64),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::TrailingIndexBytes(n) => {
                write!(f, "index has {n} trailing bytes after the last entry")
            }
            Issue::OffsetMismatch {
                position,
                expected,
                found,
            } => write!(
                f,
                "entry #{position} starts at offset {found}, expected {expected}"
            ),
            Issue::OffsetBeyondLog { position, offset } => {
                write!(f, "entry #{position} points past the log at offset {offset}")
            }
            Issue::BadKind { position, kind } => {
                write!(f, "entry #{position} has unknown kind {kind}")
            }
            Issue::BadEntry { position, reason } => {
                write!(f, "entry #{position} is unreadable: {reason}")
            }
            Issue::Undecodable { position, reason } => {
                write!(f, "entry #{position} does not decode: {reason}")
            }
            Issue::TimestampRegression {
                position,
                previous,
                timestamp,
            } => write!(
                f,
                "entry #{position} has timestamp {timestamp} before its predecessor's {previous}"
            ),
            Issue::TrailingLogBytes(n) => {
                write!(f, "log has {n} unreferenced bytes after the last record")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub entries: u64,
    pub index_trailing_bytes: u64,
    pub log_len: u64,
    /// Whether timestamp lookups are meaningful on this pair.
    pub timestamps_sorted: bool,
    pub issues: Vec<Issue>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks a log/index pair for damage without modifying either file.
pub fn verify(log_path: impl AsRef<Path>, index_path: impl AsRef<Path>) -> Result<VerifyReport> {
    let index = IndexFile::open(index_path)?;
    let log = LogFile::open(log_path)?;

    let mut report = VerifyReport {
        entries: index.len()?,
        index_trailing_bytes: index.trailing_bytes()?,
        log_len: log.len()?,
        timestamps_sorted: true,
        issues: Vec::new(),
    };
    if report.index_trailing_bytes > 0 {
        report
            .issues
            .push(Issue::TrailingIndexBytes(report.index_trailing_bytes));
    }

    // Where the next payload should begin; unknown after an undecodable one.
    let mut expected = Some(0u64);
    let mut previous_ts: Option<u64> = None;

    for position in 0..report.entries {
        let entry = match index.read_at(position) {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(Error::UnknownKind(kind)) => {
                report.issues.push(Issue::BadKind { position, kind });
                expected = None;
                continue;
            }
            Err(Error::IndexCorruption(reason)) => {
                report.issues.push(Issue::BadEntry { position, reason });
                expected = None;
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(previous) = previous_ts {
            if entry.timestamp < previous {
                report.timestamps_sorted = false;
                report.issues.push(Issue::TimestampRegression {
                    position,
                    previous,
                    timestamp: entry.timestamp,
                });
            }
        }
        previous_ts = Some(entry.timestamp);

        if let Some(expected) = expected {
            if entry.offset != expected {
                report.issues.push(Issue::OffsetMismatch {
                    position,
                    expected,
                    found: entry.offset,
                });
            }
        }

        if entry.offset >= report.log_len {
            report.issues.push(Issue::OffsetBeyondLog {
                position,
                offset: entry.offset,
            });
            expected = None;
            continue;
        }

        expected = match log.read_record(entry.offset, entry.kind) {
            Ok(record) => {
                let len = encoding::encoded_len(&record)
                    .map_err(|e| decode_error(entry.kind, entry.offset, e))?;
                Some(entry.offset + len)
            }
            Err(e) => {
                report.issues.push(Issue::Undecodable {
                    position,
                    reason: e.to_string(),
                });
                None
            }
        };
    }

    if let Some(end) = expected {
        if report.log_len > end {
            report.issues.push(Issue::TrailingLogBytes(report.log_len - end));
        }
    }

    tracing::info!(
        entries = report.entries,
        log_len = report.log_len,
        issues = report.issues.len(),
        "Dump verified"
    );
    Ok(report)
}
