//! Proof-of-work sealing engine.
//!
//! The sealer assembles a candidate block on top of the previous tip and
//! searches for a nonce whose hash carries the required number of leading
//! zero hex digits. The search yields back to the scheduler every
//! `yield_interval` attempts so that admissions and other tasks keep
//! running while a block is being sealed. There is no mid-seal
//! cancellation and no difficulty retargeting; both are deliberate
//! simplifications of this single-authority design.

use std::time::Instant;

use crate::config::{NetworkConfig, SealingConfig};
use crate::types::{Block, BlockMetadata, Hash256, Transaction, unix_millis_now};

/// Seals transaction batches into proof-of-work blocks.
#[derive(Clone, Debug)]
pub struct Sealer {
    difficulty: usize,
    yield_interval: u64,
    network: NetworkConfig,
}

impl Sealer {
    /// Constructs a sealer from configuration.
    pub fn new(cfg: &SealingConfig, network: NetworkConfig) -> Self {
        Self {
            difficulty: cfg.difficulty,
            yield_interval: cfg.yield_interval.max(1),
            network,
        }
    }

    /// The static difficulty this sealer targets.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Seals `batch` into a block on top of `previous`.
    ///
    /// Stamps every transaction's `processedAt` with the seal timestamp,
    /// then runs the nonce search to completion. The wall-clock mining
    /// time is recorded on the block metadata (outside the hash preimage).
    pub async fn seal(&self, mut batch: Vec<Transaction>, previous: &Block) -> Block {
        let started = Instant::now();
        let timestamp = unix_millis_now();

        for tx in &mut batch {
            tx.processed_at = Some(timestamp);
        }

        let tx_count = batch.len() as u64;
        let mut block = Block {
            index: previous.index + 1,
            timestamp,
            transactions: batch,
            previous_hash: previous.hash,
            nonce: 0,
            hash: Hash256::ZERO,
            metadata: BlockMetadata {
                compliance_standard: self.network.compliance_standard.clone(),
                schema_version: self.network.schema_version.clone(),
                network: self.network.network_id.clone(),
                tx_count,
                mining_time_ms: None,
            },
        };

        let mut attempts: u64 = 0;
        loop {
            block.hash = block.compute_hash();
            if block.hash.leading_zero_hex_digits() >= self.difficulty {
                break;
            }
            block.nonce += 1;
            attempts += 1;
            if attempts % self.yield_interval == 0 {
                // The one mandated suspension point: let admissions and
                // other tasks interleave with a long nonce search.
                tokio::task::yield_now().await;
            }
        }

        let mining_time_ms = started.elapsed().as_millis() as u64;
        block.metadata.mining_time_ms = Some(mining_time_ms);

        tracing::debug!(
            index = block.index,
            nonce = block.nonce,
            mining_time_ms,
            "sealed block"
        );

        block
    }
}
