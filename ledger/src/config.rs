//! Top-level configuration for a ledger node.
//!
//! This module aggregates configuration for:
//!
//! - transaction admission (`PoolConfig`),
//! - proof-of-work sealing (`SealingConfig`),
//! - chain/network identity stamped into block metadata (`NetworkConfig`),
//! - persistent storage (RocksDB path and creation flags),
//! - metrics exporter (enable flag + listen address).
//!
//! The goal is to have a single `LedgerConfig` struct that higher-level
//! binaries (e.g. `main.rs`) can construct from defaults, config files,
//! or environment variables as needed.

use std::net::SocketAddr;

use crate::storage::RocksDbConfig;

/// Configuration for the transaction admission pool.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum allowed age of a transaction's `createdAt` at admission
    /// time, in milliseconds. Older submissions are rejected as stale.
    pub recency_window_ms: u64,
    /// Number of pending transactions that triggers sealing, and the hard
    /// cap on transactions per block.
    pub max_transactions_per_block: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            recency_window_ms: 5 * 60 * 1000,
            max_transactions_per_block: 10_000,
        }
    }
}

/// Configuration for the proof-of-work sealing engine.
///
/// Difficulty is static by design: the source system never retargets it
/// based on observed block times.
#[derive(Clone, Debug)]
pub struct SealingConfig {
    /// Required number of leading zero hex digits in a sealed block hash.
    pub difficulty: usize,
    /// Number of nonce attempts between cooperative yields, so the search
    /// never monopolizes the runtime.
    pub yield_interval: u64,
}

impl Default for SealingConfig {
    fn default() -> Self {
        Self {
            difficulty: 2,
            yield_interval: 1_000,
        }
    }
}

/// Identity stamped into every block's metadata.
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// Network / run identifier, e.g. `"pharma-mainnet"`.
    pub network_id: String,
    /// Regulatory compliance standard tag, e.g. `"DSCSA-2023"`.
    pub compliance_standard: String,
    /// Block/transaction schema version.
    pub schema_version: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_id: "pharma-mainnet".to_string(),
            compliance_standard: "DSCSA-2023".to_string(),
            schema_version: "1.0".to_string(),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        // Safe to unwrap: this is a fixed, valid address literal.
        let addr: SocketAddr = "127.0.0.1:9898"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}

/// Top-level configuration for a ledger node.
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    pub pool: PoolConfig,
    pub sealing: SealingConfig,
    pub network: NetworkConfig,
    pub storage: RocksDbConfig,
    pub metrics: MetricsConfig,
}
