//! The ledger node facade.
//!
//! [`LedgerNode`] wires the admission pool, sealing engine, and chain
//! store together and exposes the inbound surface the (external) API
//! layer calls: submit, chain/block queries, integrity validation, and
//! derived statistics. Chain and pool mutations are each serialized
//! through a single async mutex, so the ledger's own logic runs as one
//! logical owner even when hosted on a multi-threaded runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::{Mutex, broadcast};

use crate::chain::{ChainStore, StoreError, verify};
use crate::config::LedgerConfig;
use crate::events::{EventBus, LedgerEvent};
use crate::metrics::{LedgerStats, MetricsRegistry};
use crate::pool::{AdmissionError, AdmissionPool, AdmissionReceipt};
use crate::sealing::Sealer;
use crate::storage::KvStore;
use crate::types::{Block, Transaction, TransactionDraft, unix_millis_now};

/// A single-authority pharmaceutical ledger node.
///
/// Wrap it in an [`Arc`] and share it across tasks; all methods take
/// `&self`.
pub struct LedgerNode<K: KvStore> {
    config: LedgerConfig,
    chain: Mutex<ChainStore<K>>,
    pool: Mutex<AdmissionPool>,
    sealer: Sealer,
    /// Reentrancy guard: only one sealing operation may be in flight.
    sealing: AtomicBool,
    events: EventBus,
    metrics: Arc<MetricsRegistry>,
}

impl<K: KvStore> LedgerNode<K> {
    /// Builds a node around an already-loaded chain store.
    ///
    /// The admission pool's duplicate index is seeded from every
    /// transaction id sealed in the chain.
    pub fn new(config: LedgerConfig, chain: ChainStore<K>, metrics: Arc<MetricsRegistry>) -> Self {
        let pool = AdmissionPool::new(&config.pool, chain.sealed_tx_ids());
        let sealer = Sealer::new(&config.sealing, config.network.clone());
        Self {
            config,
            chain: Mutex::new(chain),
            pool: Mutex::new(pool),
            sealer,
            sealing: AtomicBool::new(false),
            events: EventBus::default(),
            metrics,
        }
    }

    /// Opens a subscription to the node's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Submits a transaction for admission.
    ///
    /// On success the transaction is queued for sealing and a receipt is
    /// returned. Admission auto-triggers sealing when the pool reaches
    /// `max_transactions_per_block` or the transaction is urgent; a seal
    /// failure after a successful admission is surfaced through events
    /// and logs, not through this result.
    pub async fn submit_transaction(
        &self,
        draft: TransactionDraft,
    ) -> Result<AdmissionReceipt, AdmissionError> {
        let now = unix_millis_now();
        let submitted_id = draft.id.clone();

        let outcome = {
            let mut pool = self.pool.lock().await;
            let result = pool.submit(draft, now);
            match result {
                Ok(ok) => Ok((ok, pool.len(), pool.has_urgent())),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(((receipt, violation), depth, has_urgent)) => {
                self.metrics.ledger.transactions_admitted.inc();
                self.metrics.ledger.pending_transactions.set(depth as i64);
                self.events.emit(LedgerEvent::TransactionAdded {
                    id: receipt.id.clone(),
                    queue_depth: receipt.queue_depth,
                });

                if let Some(violation) = violation {
                    tracing::warn!(
                        batch_id = %violation.batch_id,
                        observed = violation.observed,
                        threshold = violation.threshold,
                        "cold-chain envelope violation"
                    );
                    self.metrics.ledger.compliance_violations.inc();
                    self.events
                        .emit(LedgerEvent::TemperatureViolation(violation));
                }

                if depth >= self.config.pool.max_transactions_per_block || has_urgent {
                    if let Err(e) = self.seal_pending().await {
                        tracing::error!("sealing after admission failed: {e}");
                        self.events.emit(LedgerEvent::ProcessingError {
                            context: "seal".to_string(),
                            reason: e.to_string(),
                        });
                    }
                }

                Ok(receipt)
            }
            Err(e) => {
                self.metrics.ledger.admissions_rejected.inc();
                tracing::debug!(id = %submitted_id, "admission rejected: {e}");
                self.events.emit(LedgerEvent::TransactionRejected {
                    id: submitted_id,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Seals the pending pool into a new block (manual trigger).
    ///
    /// Returns `Ok(None)` when there is nothing to seal or when another
    /// sealing operation is already in flight (the second trigger is a
    /// no-op, not queued).
    pub async fn seal_pending(&self) -> Result<Option<Block>, StoreError> {
        if self
            .sealing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("seal trigger ignored: sealing already in flight");
            return Ok(None);
        }

        let result = self.seal_once().await;
        self.sealing.store(false, Ordering::SeqCst);
        result
    }

    async fn seal_once(&self) -> Result<Option<Block>, StoreError> {
        let batch = {
            let mut pool = self.pool.lock().await;
            pool.drain_batch(self.config.pool.max_transactions_per_block)
        };
        if batch.is_empty() {
            return Ok(None);
        }

        let batch = self.prepare_batch(batch);
        if batch.is_empty() {
            return Ok(None);
        }

        let previous = { self.chain.lock().await.latest().clone() };

        let started = Instant::now();
        let block = self.sealer.seal(batch, &previous).await;

        let append_result = {
            let mut chain = self.chain.lock().await;
            chain.append(block.clone())
        };
        if let Err(e) = append_result {
            // Nothing was written. Return the batch to the pool so the
            // next seal retries it; the transactions are in exactly one
            // place (the pool) and their ids stay in the duplicate index.
            tracing::error!(
                index = block.index,
                "append failed, returning batch to pool: {e}"
            );
            let mut batch = block.transactions;
            for tx in &mut batch {
                tx.processed_at = None;
            }
            let depth = {
                let mut pool = self.pool.lock().await;
                pool.requeue_front(batch);
                pool.len()
            };
            self.metrics.ledger.pending_transactions.set(depth as i64);
            return Err(e);
        }

        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.ledger.seal_seconds.observe(elapsed);
        self.metrics.ledger.blocks_sealed.inc();
        let depth = self.pool.lock().await.len();
        self.metrics.ledger.pending_transactions.set(depth as i64);

        let mining_time_ms = block.metadata.mining_time_ms.unwrap_or_default();
        tracing::info!(
            index = block.index,
            hash = %block.hash,
            tx_count = block.transactions.len(),
            mining_time_ms,
            "sealed and appended block"
        );
        self.events.emit(LedgerEvent::BlockSealed {
            index: block.index,
            hash: block.hash,
            tx_count: block.transactions.len(),
            mining_time_ms,
        });

        Ok(Some(block))
    }

    /// Final per-transaction preparation before sealing.
    ///
    /// A transaction that fails here is dropped from the batch with a
    /// logged cause and a `ProcessingError` event; the rest of the batch
    /// proceeds.
    fn prepare_batch(&self, batch: Vec<Transaction>) -> Vec<Transaction> {
        let mut prepared = Vec::with_capacity(batch.len());
        for tx in batch {
            match serde_json::to_vec(&tx) {
                Ok(_) => prepared.push(tx),
                Err(e) => {
                    tracing::warn!(id = %tx.id, "dropping transaction from batch: {e}");
                    self.events.emit(LedgerEvent::ProcessingError {
                        context: format!("transaction {}", tx.id),
                        reason: e.to_string(),
                    });
                }
            }
        }
        prepared
    }

    /// Returns a snapshot of the full chain.
    pub async fn chain_snapshot(&self) -> Vec<Block> {
        self.chain.lock().await.blocks().to_vec()
    }

    /// Returns the block at `index`, if present.
    pub async fn block(&self, index: u64) -> Option<Block> {
        self.chain.lock().await.block(index).cloned()
    }

    /// Returns the current tip.
    pub async fn latest_block(&self) -> Block {
        self.chain.lock().await.latest().clone()
    }

    /// Walks the whole chain validating hashes and linkage.
    pub async fn validate_chain(&self) -> bool {
        verify::is_valid(self.chain.lock().await.blocks())
    }

    /// Recomputes derived statistics from the chain and pool.
    pub async fn stats(&self) -> LedgerStats {
        let pending = self.pool.lock().await.len();
        let chain = self.chain.lock().await;
        LedgerStats::derive(chain.blocks(), pending, self.sealer.difficulty())
    }

    /// Number of transactions waiting in the pool.
    pub async fn pending_transactions(&self) -> usize {
        self.pool.lock().await.len()
    }

    /// Emits a `PerformanceMetrics` event with a fresh stats snapshot.
    pub async fn emit_performance_metrics(&self) {
        let stats = self.stats().await;
        self.events.emit(LedgerEvent::PerformanceMetrics(stats));
    }
}
