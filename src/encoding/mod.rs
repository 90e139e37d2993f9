pub mod bincode;
pub mod format;

pub use self::bincode::{decode, decode_from, encode, encoded_len};

/// Error type for payload encoding operations
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Invalid encoding format: {0}")]
    InvalidFormat(String),
    #[error("Truncated data")]
    TruncatedData,
    #[error("Payload exceeds the {0} byte limit")]
    TooLarge(u64),
}
