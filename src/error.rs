use std::io;

use crate::record::Kind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to read {0}: {1}")]
    ReadError(&'static str, io::Error),
    #[error("Failed to write {0}: {1}")]
    WriteError(&'static str, io::Error),
    #[error("Failed to decode {kind} record at offset {offset}: {reason}")]
    Decode {
        kind: Kind,
        offset: u64,
        reason: String,
    },
    #[error("Failed to encode {0} record: {1}")]
    Encode(Kind, String),
    #[error("Unknown record kind {0}")]
    UnknownKind(u8),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Index corruption: {0}")]
    IndexCorruption(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Output channel closed before all records were handed off")]
    ChannelClosed,
}

impl Error {
    /// True for errors caused by the caller's arguments rather than the files.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}
