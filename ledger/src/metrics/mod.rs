//! Metrics and instrumentation for the ledger.
//!
//! Two kinds of metrics live here:
//!
//! - [`LedgerStats`]: derived, read-only statistics recomputed on demand
//!   from the chain and pool (never persisted),
//! - Prometheus-compatible counters/histograms with a small HTTP exporter
//!   that serves `/metrics` in Prometheus text format.
//!
//! Typical usage in a node:
//!
//! ```ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use ledger::metrics::{MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let addr: SocketAddr = "127.0.0.1:9898".parse()?;
//!
//! // Spawn the HTTP exporter in the background:
//! tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
//!
//! // Elsewhere in the code:
//! registry.ledger.seal_seconds.observe(duration_secs);
//! ```

use serde::Serialize;

use crate::types::Block;

pub mod prometheus;

pub use prometheus::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};

/// Derived ledger statistics, recomputed on demand.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    /// Total transactions sealed across all blocks.
    pub total_transactions: u64,
    /// Mean delta of consecutive block timestamps, in milliseconds.
    /// `None` with fewer than two blocks.
    pub average_block_time_ms: Option<f64>,
    /// The static proof-of-work difficulty currently in force.
    pub current_difficulty: usize,
    /// Transactions waiting in the admission pool.
    pub pending_transactions: usize,
    /// Chain length, genesis included.
    pub chain_length: usize,
}

impl LedgerStats {
    /// Computes statistics from the current chain and pool state.
    pub fn derive(blocks: &[Block], pending_transactions: usize, difficulty: usize) -> Self {
        let total_transactions = blocks.iter().map(|b| b.transactions.len() as u64).sum();

        let average_block_time_ms = if blocks.len() >= 2 {
            let deltas: u64 = blocks
                .windows(2)
                .map(|w| w[1].timestamp.saturating_sub(w[0].timestamp))
                .sum();
            Some(deltas as f64 / (blocks.len() - 1) as f64)
        } else {
            None
        };

        Self {
            total_transactions,
            average_block_time_ms,
            current_difficulty: difficulty,
            pending_transactions,
            chain_length: blocks.len(),
        }
    }
}
