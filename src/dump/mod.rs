//! On-disk capture dump: a log file of encoded payloads and an index file
//! locating them.
//!
//! # File Format
//!
//! The index is a headerless array of fixed-width entries:
//!
//! ```text
//! +----------------+----------------+---------+
//! |timestamp:u64 BE| offset:u64 BE  | kind:u8 |
//! +----------------+----------------+---------+
//! |    8 bytes     |    8 bytes     | 1 byte  |
//! +----------------+----------------+---------+
//! ```
//!
//! The log is the plain concatenation of payloads in append order. Entry `i`'s
//! payload occupies `[offset_i, offset_{i+1})`, or runs to end of file for the
//! last entry; the log has no gaps and no framing of its own. The payload
//! decoder is self-delimiting, so a reader only needs the start offset and kind.
//!
//! A short read of the index is the end of the dump. The format cannot tell a
//! clean end from a truncated file; [`IndexFile::trailing_bytes`] and
//! [`crate::verify`] expose what can be detected.

pub mod data;
pub mod index;
pub mod scanner;
pub mod writer;

pub use data::LogFile;
pub use index::{IndexEntry, IndexFile, ENTRY_SIZE};
pub use scanner::{IntoScanIterator, ScanIterator, Scanned, Scanner};
pub use writer::{now, WriteStats, Writer};
