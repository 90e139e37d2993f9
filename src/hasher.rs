use std::fmt;

use sha3::{Digest, Keccak256};

use crate::record::Hash;

/// Reusable Keccak-256 state. `sum` resets the state after producing a digest,
/// so one hasher serves any number of inputs without reallocating.
#[derive(Clone, Default)]
pub struct Hasher {
    state: Keccak256,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hasher")
    }
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            state: Keccak256::new(),
        }
    }

    pub fn write(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Returns the digest of everything written since the last reset.
    pub fn sum(&mut self) -> Hash {
        Hash(self.state.finalize_reset().into())
    }

    pub fn reset(&mut self) {
        Digest::reset(&mut self.state);
    }

    /// Hashes a single input.
    pub fn digest(&mut self, data: &[u8]) -> Hash {
        self.reset();
        self.write(data);
        self.sum()
    }
}
