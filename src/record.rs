//! Captured snap protocol responses.
//!
//! A dump stores one of four response packets per index entry. The variant is
//! not part of the serialized payload; it lives in the index entry's `kind`
//! byte, so decoding always needs both.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

pub const HASH_LEN: usize = 32;

/// On-disk discriminator of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    AccountRange = 0,
    StorageRanges = 1,
    ByteCodes = 2,
    TrieNodes = 3,
}

impl Kind {
    pub const ALL: [Kind; 4] = [
        Kind::AccountRange,
        Kind::StorageRanges,
        Kind::ByteCodes,
        Kind::TrieNodes,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Kind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Kind::AccountRange),
            1 => Ok(Kind::StorageRanges),
            2 => Ok(Kind::ByteCodes),
            3 => Ok(Kind::TrieNodes),
            other => Err(Error::UnknownKind(other)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::AccountRange => "account-range",
            Kind::StorageRanges => "storage-ranges",
            Kind::ByteCodes => "bytecodes",
            Kind::TrieNodes => "trie-nodes",
        };
        f.write_str(name)
    }
}

/// A 32-byte content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl From<[u8; HASH_LEN]> for Hash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Hash(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Parses hex with an optional `0x` prefix. Short input is left-padded with
/// zeroes, long input keeps its trailing 32 bytes.
impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let digits = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&digits)
            .map_err(|e| Error::InvalidInput(format!("invalid hex hash {s:?}: {e}")))?;

        let mut out = [0u8; HASH_LEN];
        if bytes.len() >= HASH_LEN {
            out.copy_from_slice(&bytes[bytes.len() - HASH_LEN..]);
        } else {
            out[HASH_LEN - bytes.len()..].copy_from_slice(&bytes);
        }
        Ok(Hash(out))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            <[u8; HASH_LEN]>::deserialize(deserializer).map(Hash)
        }
    }
}

/// An opaque byte string: an encoded account body, a proof node, a contract
/// code or a trie node. Hex in human-readable formats, raw bytes otherwise.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Blob(bytes.to_vec())
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({})", crate::encoding::format::bytes(&self.0, 32))
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

struct BlobVisitor;

impl<'de> Visitor<'de> for BlobVisitor {
    type Value = Blob;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a byte string or a 0x-prefixed hex string")
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> std::result::Result<Blob, E> {
        Ok(Blob(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> std::result::Result<Blob, E> {
        Ok(Blob(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Blob, E> {
        let digits = v.strip_prefix("0x").unwrap_or(v);
        hex::decode(digits).map(Blob).map_err(E::custom)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Blob, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(Blob(bytes))
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(BlobVisitor)
        } else {
            deserializer.deserialize_byte_buf(BlobVisitor)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub hash: Hash,
    pub body: Blob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    pub hash: Hash,
    pub body: Blob,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountRangePacket {
    pub id: u64,
    pub accounts: Vec<AccountData>,
    pub proof: Vec<Blob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageRangesPacket {
    pub id: u64,
    /// One list of slots per requested account.
    pub slots: Vec<Vec<StorageData>>,
    pub proof: Vec<Blob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ByteCodesPacket {
    pub id: u64,
    pub codes: Vec<Blob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrieNodesPacket {
    pub id: u64,
    pub nodes: Vec<Blob>,
}

/// A decoded record. The variant always agrees with the index entry's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Record {
    AccountRange(AccountRangePacket),
    StorageRanges(StorageRangesPacket),
    ByteCodes(ByteCodesPacket),
    TrieNodes(TrieNodesPacket),
}

impl Record {
    pub fn kind(&self) -> Kind {
        match self {
            Record::AccountRange(_) => Kind::AccountRange,
            Record::StorageRanges(_) => Kind::StorageRanges,
            Record::ByteCodes(_) => Kind::ByteCodes,
            Record::TrieNodes(_) => Kind::TrieNodes,
        }
    }

    /// Request id the response answers.
    pub fn id(&self) -> u64 {
        match self {
            Record::AccountRange(p) => p.id,
            Record::StorageRanges(p) => p.id,
            Record::ByteCodes(p) => p.id,
            Record::TrieNodes(p) => p.id,
        }
    }
}

impl From<AccountRangePacket> for Record {
    fn from(p: AccountRangePacket) -> Self {
        Record::AccountRange(p)
    }
}

impl From<StorageRangesPacket> for Record {
    fn from(p: StorageRangesPacket) -> Self {
        Record::StorageRanges(p)
    }
}

impl From<ByteCodesPacket> for Record {
    fn from(p: ByteCodesPacket) -> Self {
        Record::ByteCodes(p)
    }
}

impl From<TrieNodesPacket> for Record {
    fn from(p: TrieNodesPacket) -> Self {
        Record::TrieNodes(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminators() {
        assert_eq!(Kind::AccountRange.as_u8(), 0);
        assert_eq!(Kind::StorageRanges.as_u8(), 1);
        assert_eq!(Kind::ByteCodes.as_u8(), 2);
        assert_eq!(Kind::TrieNodes.as_u8(), 3);

        for kind in Kind::ALL {
            assert_eq!(Kind::try_from(kind.as_u8()).unwrap(), kind);
        }
        assert!(matches!(Kind::try_from(4), Err(Error::UnknownKind(4))));
    }

    #[test]
    fn test_hash_parse_padding_and_truncation() {
        let short: Hash = "0x01ff".parse().unwrap();
        let mut expected = [0u8; HASH_LEN];
        expected[30] = 0x01;
        expected[31] = 0xff;
        assert_eq!(short, Hash(expected));

        // Odd number of digits is accepted
        let odd: Hash = "1ff".parse().unwrap();
        assert_eq!(odd, short);

        let long = format!("0xaabb{}", "11".repeat(32));
        let parsed: Hash = long.parse().unwrap();
        assert_eq!(parsed, Hash([0x11; HASH_LEN]));

        assert!("0xzz".parse::<Hash>().is_err());
    }

    #[test]
    fn test_hash_display_round_trip() {
        let hash = Hash([0xab; HASH_LEN]);
        let text = hash.to_string();
        assert!(text.starts_with("0xabab"));
        assert_eq!(text.len(), 2 + 64);
        assert_eq!(text.parse::<Hash>().unwrap(), hash);
        assert!(!hash.is_zero());
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn test_json_uses_hex() {
        let record = Record::from(AccountRangePacket {
            id: 7,
            accounts: vec![AccountData {
                hash: Hash([0x01; HASH_LEN]),
                body: Blob(vec![0xde, 0xad]),
            }],
            proof: vec![],
        });

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"AccountRange\""));
        assert!(json.contains("\"body\":\"0xdead\""));
        assert!(json.contains(&Hash([0x01; HASH_LEN]).to_string()));

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
