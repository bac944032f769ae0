//! Ledger library crate.
//!
//! This crate provides the core building blocks for an append-only
//! pharmaceutical supply-chain ledger:
//!
//! - strongly-typed domain types (`types`),
//! - a validating transaction admission pool (`pool`),
//! - a cooperative proof-of-work sealing engine (`sealing`),
//! - the durable chain store and integrity verifier (`chain`),
//! - key-value storage backends (`storage`),
//! - an observable event bus (`events`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node facade + configuration (`node`, `config`).
//!
//! Higher-level binaries compose these pieces into single-authority
//! ledger nodes; the external API, signing, and document-storage layers
//! live outside this crate and talk to [`LedgerNode`] through its
//! public contract.

pub mod chain;
pub mod config;
pub mod events;
pub mod metrics;
pub mod node;
pub mod pool;
pub mod sealing;
pub mod storage;
pub mod types;

// Re-export top-level configuration types.
pub use config::{LedgerConfig, MetricsConfig, NetworkConfig, PoolConfig, SealingConfig};

// Re-export the chain store, verifier, and their errors.
pub use chain::{ChainStore, IntegrityError, StoreError, is_valid, verify_chain};

// Re-export admission and compliance types.
pub use pool::{
    AdmissionError, AdmissionPool, AdmissionReceipt, ComplianceValidator, ComplianceViolation,
    ViolationKind,
};

// Re-export the sealing engine.
pub use sealing::Sealer;

// Re-export storage backends.
pub use storage::{InMemoryKvStore, KvStore, RocksDbConfig, RocksDbKvStore, StorageError};

// Re-export the event bus and metrics registry.
pub use events::{EventBus, LedgerEvent};
pub use metrics::{LedgerMetrics, LedgerStats, MetricsRegistry, run_prometheus_http_server};

// Re-export the node facade.
pub use node::LedgerNode;

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the default durable node used by a "typical" deployment:
/// a [`LedgerNode`] over the RocksDB key-value backend.
pub type DefaultLedgerNode = LedgerNode<RocksDbKvStore>;

/// Type alias for the default chain store backend.
pub type DefaultChainStore = ChainStore<RocksDbKvStore>;
