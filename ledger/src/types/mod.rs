//! Core domain types used by the ledger.
//!
//! This module defines the strongly-typed content hash, the pharmaceutical
//! transaction types, and the block structures shared across the ledger
//! implementation. The goal is to avoid "naked" byte buffers and stringly
//! typed fields in public APIs and instead use domain-specific newtypes.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Block structures and content hashing.
pub mod block;
/// Transaction kinds, priorities, and payloads.
pub mod tx;

pub use block::{Block, BlockMetadata};
pub use tx::{Payload, Priority, Transaction, TransactionDraft, TxKind};

/// Length in bytes of all 256-bit hashes used by the ledger.
pub const HASH_LEN: usize = 32;

/// Strongly-typed 256-bit content hash (BLAKE3-256).
///
/// Block hashes and linkage hashes are all `Hash256`. On the wire and on
/// disk a hash is rendered as a 64-character lowercase hex string, so the
/// genesis `previousHash` is literally sixty-four `'0'` characters in the
/// persisted JSON.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// The all-zero hash, used as the `previousHash` of the genesis block.
    pub const ZERO: Hash256 = Hash256([0u8; HASH_LEN]);

    /// Computes a new [`Hash256`] as the BLAKE3-256 hash of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Renders this hash as a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hash from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, ParseHashError> {
        let bytes = hex::decode(s).map_err(|_| ParseHashError)?;
        if bytes.len() != HASH_LEN {
            return Err(ParseHashError);
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Hash256(arr))
    }

    /// Counts the leading `'0'` characters of the hex rendering.
    ///
    /// This is the quantity the proof-of-work difficulty is measured in: a
    /// sealed block must have at least `difficulty` leading zero hex digits.
    pub fn leading_zero_hex_digits(&self) -> usize {
        let mut count = 0;
        for byte in &self.0 {
            if byte >> 4 != 0 {
                return count;
            }
            count += 1;
            if byte & 0x0f != 0 {
                return count;
            }
            count += 1;
        }
        count
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when parsing a hex string into a [`Hash256`] fails.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseHashError;

impl fmt::Display for ParseHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected a 64-character hex string")
    }
}

impl std::error::Error for ParseHashError {}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns the current wall-clock time as milliseconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 0.
pub fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_renders_as_sixty_four_zeros() {
        assert_eq!(Hash256::ZERO.to_hex(), "0".repeat(64));
        assert_eq!(Hash256::ZERO.leading_zero_hex_digits(), 64);
    }

    #[test]
    fn hex_roundtrip() {
        let h = Hash256::compute(b"pharma ledger");
        let parsed = Hash256::from_hex(&h.to_hex()).expect("hex should parse");
        assert_eq!(parsed, h);
    }

    #[test]
    fn from_hex_rejects_wrong_length_and_non_hex() {
        assert!(Hash256::from_hex("abc").is_err());
        assert!(Hash256::from_hex(&"z".repeat(64)).is_err());
    }

    #[test]
    fn leading_zero_digits_counts_nibbles() {
        let mut bytes = [0xffu8; HASH_LEN];
        bytes[0] = 0x00;
        bytes[1] = 0x0f;
        let h = Hash256(bytes);
        // "000f..." -> three leading zero hex digits.
        assert_eq!(h.leading_zero_hex_digits(), 3);
    }

    #[test]
    fn serializes_as_hex_string() {
        let h = Hash256::ZERO;
        let json = serde_json::to_string(&h).expect("serialize");
        assert_eq!(json, format!("\"{}\"", "0".repeat(64)));
        let back: Hash256 = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, h);
    }
}
