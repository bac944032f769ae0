//! Observable ledger events.
//!
//! The source system used event-emitter callbacks; here that becomes an
//! explicit broadcast channel. Events are sent only after the state change
//! they describe is durable: `BlockSealed` fires after the store has
//! acknowledged the append, never before.

use tokio::sync::broadcast;

use crate::metrics::LedgerStats;
use crate::pool::ComplianceViolation;
use crate::types::Hash256;

/// Events emitted for external telemetry consumers.
#[derive(Clone, Debug)]
pub enum LedgerEvent {
    /// A transaction passed admission and entered the pool.
    TransactionAdded { id: String, queue_depth: usize },
    /// A transaction was refused admission.
    TransactionRejected { id: String, reason: String },
    /// A block was sealed and durably appended.
    BlockSealed {
        index: u64,
        hash: Hash256,
        tx_count: usize,
        mining_time_ms: u64,
    },
    /// Periodic derived statistics snapshot.
    PerformanceMetrics(LedgerStats),
    /// A cold-chain envelope violation was detected at admission.
    TemperatureViolation(ComplianceViolation),
    /// A per-transaction processing failure or a failed append.
    ProcessingError { context: String, reason: String },
}

/// Broadcast bus for [`LedgerEvent`]s.
///
/// Subscribers that fall behind lose the oldest events (standard
/// `broadcast` semantics); the ledger itself never blocks on delivery.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Opens a new subscription receiving all events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Emits an event. A send with no live subscribers is not an error.
    pub fn emit(&self, event: LedgerEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
