// ledger/src/types/block.rs

//! Block structures and content hashing.
//!
//! A block bundles an ordered batch of transactions with chain-linkage
//! metadata and a proof-of-work hash. Serialization is canonical JSON via
//! `serde_json`: struct fields serialize in declaration order and payload
//! maps are sorted, so the same logical block always produces the same
//! bytes. The same canonical encoding is used for hashing and persistence.

use serde::{Deserialize, Serialize};

use super::{Hash256, Transaction};

/// Free-form block metadata.
///
/// `mining_time_ms` is recorded only after the nonce search finishes, so it
/// is deliberately excluded from the hash preimage (see [`Block::compute_hash`]);
/// everything else here is fixed when the candidate block is assembled.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetadata {
    /// Regulatory compliance standard this chain operates under.
    pub compliance_standard: String,
    /// Version of the block/transaction schema.
    pub schema_version: String,
    /// Identifier of the network / run this chain belongs to.
    pub network: String,
    /// Number of transactions sealed into the block.
    pub tx_count: u64,
    /// Wall-clock duration of the nonce search, in milliseconds.
    #[serde(default)]
    pub mining_time_ms: Option<u64>,
}

/// A block in the pharmaceutical ledger.
///
/// Lifecycle: assembled as a *candidate* by the sealing engine (hash not
/// yet satisfying difficulty), *sealed* once a valid nonce is found, and
/// *persisted* once durably written by the chain store. Persisted blocks
/// are never mutated in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Height in the chain; 0 for genesis.
    pub index: u64,
    /// Seal time, milliseconds since Unix epoch.
    pub timestamp: u64,
    /// Ordered transaction batch.
    pub transactions: Vec<Transaction>,
    /// Hash of the prior block; all zeros for genesis.
    pub previous_hash: Hash256,
    /// Nonce found by the proof-of-work search.
    pub nonce: u64,
    /// Content hash over the seal preimage (see [`Block::compute_hash`]).
    pub hash: Hash256,
    pub metadata: BlockMetadata,
}

/// The exact view of a block that is hashed.
///
/// Covers index, linkage, timestamp, the serialized transactions, the
/// fixed metadata fields, and the nonce. `mining_time_ms` and the stored
/// `hash` itself are excluded so the stored-hash invariant holds for the
/// life of the block.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SealPreimage<'a> {
    index: u64,
    previous_hash: &'a Hash256,
    timestamp: u64,
    transactions: &'a [Transaction],
    compliance_standard: &'a str,
    schema_version: &'a str,
    network: &'a str,
    tx_count: u64,
    nonce: u64,
}

impl Block {
    /// Returns the canonical byte representation of this block.
    ///
    /// This is the form persisted under `block_<index>` in the key-value
    /// store and returned over the API boundary.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming error,
    /// because all fields are required to be serializable.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Block should always be serializable as JSON")
    }

    /// Computes the canonical BLAKE3-256 hash for this block.
    ///
    /// The preimage is the canonical JSON encoding of [`SealPreimage`].
    /// This must stay stable across restarts for integrity verification
    /// to work.
    pub fn compute_hash(&self) -> Hash256 {
        let preimage = SealPreimage {
            index: self.index,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            compliance_standard: &self.metadata.compliance_standard,
            schema_version: &self.metadata.schema_version,
            network: &self.metadata.network,
            tx_count: self.metadata.tx_count,
            nonce: self.nonce,
        };
        let bytes =
            serde_json::to_vec(&preimage).expect("seal preimage should always be serializable");
        Hash256::compute(&bytes)
    }

    /// Returns `true` if the stored hash has at least `difficulty` leading
    /// zero hex digits.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.leading_zero_hex_digits() >= difficulty
    }

    /// Builds the genesis block for a fresh chain.
    ///
    /// Genesis carries no transactions, links to the all-zero hash, and is
    /// exempt from the difficulty requirement: its hash is computed once
    /// with nonce 0.
    pub fn genesis(metadata: BlockMetadata, timestamp: u64) -> Block {
        let mut block = Block {
            index: 0,
            timestamp,
            transactions: Vec::new(),
            previous_hash: Hash256::ZERO,
            nonce: 0,
            hash: Hash256::ZERO,
            metadata,
        };
        block.hash = block.compute_hash();
        block
    }
}
