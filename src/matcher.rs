//! Content predicate used to filter dumps.

use crate::error::Result;
use crate::hasher::Hasher;
use crate::record::{Hash, Record, HASH_LEN};
use crate::Error;

/// Tests records for references to a target hash.
///
/// A record matches when the target appears as an entity's hash, anywhere
/// inside one of its opaque blobs, or, for trie nodes, as the Keccak-256 of
/// a node. The hashing state is reused across calls.
#[derive(Debug, Clone)]
pub struct Matcher {
    target: Hash,
    hasher: Hasher,
}

impl Matcher {
    /// Builds a matcher for `target`. The zero hash is rejected.
    pub fn new(target: Hash) -> Result<Self> {
        if target.is_zero() {
            return Err(Error::InvalidInput("target hash must not be zero".to_string()));
        }
        Ok(Self {
            target,
            hasher: Hasher::new(),
        })
    }

    pub fn target(&self) -> Hash {
        self.target
    }

    pub fn matches(&mut self, record: &Record) -> bool {
        let target = self.target;
        match record {
            Record::AccountRange(p) => p
                .accounts
                .iter()
                .any(|account| account.hash == target || contains(&account.body, &target)),
            Record::StorageRanges(p) => p
                .slots
                .iter()
                .flatten()
                .any(|slot| slot.hash == target),
            Record::ByteCodes(p) => p.codes.iter().any(|code| contains(code, &target)),
            Record::TrieNodes(p) => p
                .nodes
                .iter()
                .any(|node| contains(node, &target) || self.hasher.digest(node) == target),
        }
    }
}

/// Whether `haystack` contains the 32 bytes of `needle` contiguously.
fn contains(haystack: &[u8], needle: &Hash) -> bool {
    haystack.len() >= HASH_LEN && haystack.windows(HASH_LEN).any(|w| w == needle.as_bytes())
}
