//! Capture dumps of snap-sync protocol responses.
//!
//! A dump is a pair of files: an append-only log of encoded payloads and a
//! fixed-width index of `(timestamp, offset, kind)` entries. This crate writes
//! dumps, scans them, finds records by time, filters them down to the records
//! referencing a hash, and drives a cursor over them for interactive viewing.

pub mod config;
pub mod dump;
pub mod encoding;
pub mod error;
pub mod export;
pub mod filter;
pub mod hasher;
pub mod locate;
pub mod matcher;
pub mod navigator;
pub mod record;
pub mod time;
pub mod verify;

pub use config::{DumpConfig, TimestampSource};
pub use dump::{IndexEntry, IndexFile, LogFile, Scanned, Scanner, Writer};
pub use error::{Error, Result};
pub use export::{Exporter, JsonExporter};
pub use filter::{FilterJob, FilterStats};
pub use hasher::Hasher;
pub use locate::locate;
pub use matcher::Matcher;
pub use navigator::{Navigator, View};
pub use record::{Hash, Kind, Record};
pub use verify::{verify, Issue, VerifyReport};
