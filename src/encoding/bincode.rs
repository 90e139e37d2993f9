//! Record payload codec.
//!
//! Payloads are the bincode form of the packet inside a [`Record`], without
//! the variant tag. Fixed-width integers keep the format stable, and the
//! decoder reads exactly one payload from a reader, leaving whatever follows
//! untouched.

use super::EncodingError;
use crate::record::{
    AccountRangePacket, ByteCodesPacket, Kind, Record, StorageRangesPacket, TrieNodesPacket,
};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Upper bound on a single payload. Guards allocations when a corrupt length
/// prefix is read.
pub const MAX_PAYLOAD_SIZE: u64 = 64 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
        .allow_trailing_bytes()
        .with_limit(MAX_PAYLOAD_SIZE)
}

fn map_err(e: bincode::Error) -> EncodingError {
    match *e {
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            EncodingError::TruncatedData
        }
        bincode::ErrorKind::SizeLimit => EncodingError::TooLarge(MAX_PAYLOAD_SIZE),
        other => EncodingError::InvalidFormat(other.to_string()),
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, EncodingError> {
    options().serialize(value).map_err(map_err)
}

fn deserialize_from<T: for<'a> Deserialize<'a>, R: Read>(reader: R) -> Result<T, EncodingError> {
    options().deserialize_from(reader).map_err(map_err)
}

/// Encodes the record's packet.
pub fn encode(record: &Record) -> Result<Vec<u8>, EncodingError> {
    match record {
        Record::AccountRange(p) => serialize(p),
        Record::StorageRanges(p) => serialize(p),
        Record::ByteCodes(p) => serialize(p),
        Record::TrieNodes(p) => serialize(p),
    }
}

/// Size of the encoded payload, without encoding it.
pub fn encoded_len(record: &Record) -> Result<u64, EncodingError> {
    let opts = options();
    match record {
        Record::AccountRange(p) => opts.serialized_size(p),
        Record::StorageRanges(p) => opts.serialized_size(p),
        Record::ByteCodes(p) => opts.serialized_size(p),
        Record::TrieNodes(p) => opts.serialized_size(p),
    }
    .map_err(map_err)
}

/// Decodes one payload of the given kind from a reader.
pub fn decode_from<R: Read>(reader: R, kind: Kind) -> Result<Record, EncodingError> {
    Ok(match kind {
        Kind::AccountRange => Record::AccountRange(deserialize_from::<AccountRangePacket, _>(reader)?),
        Kind::StorageRanges => {
            Record::StorageRanges(deserialize_from::<StorageRangesPacket, _>(reader)?)
        }
        Kind::ByteCodes => Record::ByteCodes(deserialize_from::<ByteCodesPacket, _>(reader)?),
        Kind::TrieNodes => Record::TrieNodes(deserialize_from::<TrieNodesPacket, _>(reader)?),
    })
}

/// Decodes one payload of the given kind from a byte slice.
pub fn decode(bytes: &[u8], kind: Kind) -> Result<Record, EncodingError> {
    decode_from(bytes, kind)
}
