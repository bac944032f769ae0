//! Transaction admission pool.
//!
//! The pool buffers validated transactions until they are drained into a
//! sealing batch. Admission applies the full check sequence from the
//! domain rules: structural shape, recognized kind, required payload
//! fields, GTIN-14 batch-id format, cold-chain compliance (signal only),
//! duplicate detection across pool and chain, and a recency window as a
//! replay defense.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::config::PoolConfig;
use crate::types::{Priority, Transaction, TransactionDraft, TxKind};

use super::compliance::{ComplianceValidator, ComplianceViolation};

/// Payload keys every transaction must carry.
const REQUIRED_PAYLOAD_FIELDS: [&str; 3] = ["batchId", "manufacturerId", "timestamp"];

/// Additional payload keys required of temperature logs.
const TEMPERATURE_LOG_FIELDS: [&str; 3] = ["temperature", "humidity", "location"];

/// Reasons a transaction is refused admission.
///
/// Every variant is rejected locally and synchronously; the transaction
/// never enters the pool.
#[derive(Debug)]
pub enum AdmissionError {
    /// Missing/empty id, non-object payload, or non-numeric `createdAt`.
    MalformedTransaction(&'static str),
    /// `kind` is not one of the seven recognized transaction kinds.
    UnknownKind(String),
    /// A required payload field is absent.
    MissingField(&'static str),
    /// `batchId` is not a 14-digit numeric string.
    InvalidBatchId(String),
    /// The id already exists in the pool or anywhere in the chain.
    Duplicate(String),
    /// `createdAt` is older than the recency window.
    Stale { age_ms: u64, window_ms: u64 },
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionError::MalformedTransaction(msg) => {
                write!(f, "malformed transaction: {msg}")
            }
            AdmissionError::UnknownKind(kind) => write!(f, "unknown transaction kind: {kind:?}"),
            AdmissionError::MissingField(field) => {
                write!(f, "missing required payload field: {field}")
            }
            AdmissionError::InvalidBatchId(id) => {
                write!(f, "batchId {id:?} is not a 14-digit GTIN")
            }
            AdmissionError::Duplicate(id) => write!(f, "duplicate transaction id: {id}"),
            AdmissionError::Stale { age_ms, window_ms } => write!(
                f,
                "transaction is {age_ms}ms old, exceeds recency window of {window_ms}ms"
            ),
        }
    }
}

impl std::error::Error for AdmissionError {}

/// Returned to the caller on successful admission.
#[derive(Clone, Debug)]
pub struct AdmissionReceipt {
    pub id: String,
    /// Pool depth after this transaction was enqueued.
    pub queue_depth: usize,
}

/// Buffers incoming transactions between admission and sealing.
///
/// The pool owns the pending queue exclusively; sealing drains it through
/// [`AdmissionPool::drain_batch`], which pulls urgent transactions to the
/// front while preserving FIFO order within each priority class.
pub struct AdmissionPool {
    queue: VecDeque<Transaction>,
    /// Ids seen in the pool or anywhere in the chain. Ids are never
    /// removed: a drained transaction moves into a sealed block, where it
    /// must still shadow future duplicates.
    seen_ids: HashSet<String>,
    recency_window_ms: u64,
    validator: ComplianceValidator,
}

impl AdmissionPool {
    /// Creates a pool seeded with the ids of every transaction already
    /// sealed in the chain.
    pub fn new(cfg: &PoolConfig, sealed_ids: HashSet<String>) -> Self {
        Self {
            queue: VecDeque::new(),
            seen_ids: sealed_ids,
            recency_window_ms: cfg.recency_window_ms,
            validator: ComplianceValidator,
        }
    }

    /// Validates and enqueues a transaction.
    ///
    /// On success the transaction is appended to the pending queue and a
    /// receipt is returned, together with a compliance violation signal if
    /// the reading fell outside its envelope. The violation never causes
    /// rejection; the caller is responsible for surfacing it.
    pub fn submit(
        &mut self,
        draft: TransactionDraft,
        now: u64,
    ) -> Result<(AdmissionReceipt, Option<ComplianceViolation>), AdmissionError> {
        if draft.id.is_empty() {
            return Err(AdmissionError::MalformedTransaction("id is required"));
        }
        let payload = match draft.payload {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(AdmissionError::MalformedTransaction(
                    "payload must be an object",
                ))
            }
        };
        let created_at = draft
            .created_at
            .as_u64()
            .ok_or(AdmissionError::MalformedTransaction(
                "createdAt must be a unix-millisecond number",
            ))?;

        let kind =
            TxKind::parse(&draft.kind).ok_or_else(|| AdmissionError::UnknownKind(draft.kind))?;

        for field in REQUIRED_PAYLOAD_FIELDS {
            if !payload.contains_key(field) {
                return Err(AdmissionError::MissingField(field));
            }
        }

        let batch_id = payload
            .get("batchId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if !is_gtin14(batch_id) {
            return Err(AdmissionError::InvalidBatchId(batch_id.to_string()));
        }

        let mut violation = None;
        if kind == TxKind::TemperatureLog {
            for field in TEMPERATURE_LOG_FIELDS {
                if !payload.contains_key(field) {
                    return Err(AdmissionError::MissingField(field));
                }
            }
            violation = self.validator.check(&payload, now);
        }

        if self.seen_ids.contains(&draft.id) {
            return Err(AdmissionError::Duplicate(draft.id));
        }

        let age_ms = now.saturating_sub(created_at);
        if age_ms > self.recency_window_ms {
            return Err(AdmissionError::Stale {
                age_ms,
                window_ms: self.recency_window_ms,
            });
        }

        let tx = Transaction {
            id: draft.id.clone(),
            kind,
            payload,
            priority: draft.priority,
            created_at,
            processed_at: None,
            signature: draft.signature,
            public_key: draft.public_key,
        };

        self.seen_ids.insert(tx.id.clone());
        self.queue.push_back(tx);

        Ok((
            AdmissionReceipt {
                id: draft.id,
                queue_depth: self.queue.len(),
            },
            violation,
        ))
    }

    /// Number of transactions waiting to be sealed.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns `true` if any pending transaction is urgent.
    pub fn has_urgent(&self) -> bool {
        self.queue.iter().any(|tx| tx.priority == Priority::Urgent)
    }

    /// Returns a drained batch to the front of the queue, preserving its
    /// internal order.
    ///
    /// Used when a sealed batch could not be durably appended: the
    /// transactions go back ahead of anything admitted in the meantime and
    /// are picked up by the next seal. Their ids are already in the
    /// duplicate index and stay there, so each transaction remains
    /// admitted exactly once.
    pub fn requeue_front(&mut self, batch: Vec<Transaction>) {
        for tx in batch.into_iter().rev() {
            self.queue.push_front(tx);
        }
    }

    /// Removes and returns up to `max` transactions for sealing.
    ///
    /// Urgent transactions come first (FIFO among themselves), then
    /// normals in admission order. Anything beyond `max` stays queued for
    /// the next batch.
    pub fn drain_batch(&mut self, max: usize) -> Vec<Transaction> {
        let mut batch = Vec::with_capacity(max.min(self.queue.len()));
        let mut rest = VecDeque::with_capacity(self.queue.len());

        for tx in self.queue.drain(..) {
            if batch.len() < max && tx.priority == Priority::Urgent {
                batch.push(tx);
            } else {
                rest.push_back(tx);
            }
        }
        while batch.len() < max {
            match rest.pop_front() {
                Some(tx) => batch.push(tx),
                None => break,
            }
        }

        self.queue = rest;
        batch
    }
}

/// A GTIN-14-style batch identifier: exactly 14 ASCII digits.
fn is_gtin14(s: &str) -> bool {
    s.len() == 14 && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payload;

    const NOW: u64 = 1_700_000_000_000;

    fn pool() -> AdmissionPool {
        AdmissionPool::new(&PoolConfig::default(), HashSet::new())
    }

    fn valid_payload() -> Payload {
        let mut p = Payload::new();
        p.insert("batchId".into(), "12345678901234".into());
        p.insert("manufacturerId".into(), "MFR-001".into());
        p.insert("timestamp".into(), NOW.into());
        p
    }

    fn draft(id: &str) -> TransactionDraft {
        TransactionDraft::new(id, "batch-transfer", valid_payload(), NOW)
    }

    #[test]
    fn valid_transaction_is_admitted_with_receipt() {
        let mut pool = pool();
        let (receipt, violation) = pool.submit(draft("tx-1"), NOW).expect("admitted");
        assert_eq!(receipt.id, "tx-1");
        assert_eq!(receipt.queue_depth, 1);
        assert!(violation.is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn empty_id_is_malformed() {
        let mut pool = pool();
        let err = pool.submit(draft(""), NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::MalformedTransaction(_)));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let mut pool = pool();
        let mut d = draft("tx-1");
        d.payload = serde_json::Value::String("not an object".into());
        let err = pool.submit(d, NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::MalformedTransaction(_)));
    }

    #[test]
    fn non_numeric_created_at_is_malformed() {
        let mut pool = pool();
        let mut d = draft("tx-1");
        d.created_at = serde_json::Value::String("yesterday".into());
        let err = pool.submit(d, NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::MalformedTransaction(_)));
    }

    #[test]
    fn unrecognized_kind_is_rejected() {
        let mut pool = pool();
        let mut d = draft("tx-1");
        d.kind = "smart-contract-call".into();
        let err = pool.submit(d, NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::UnknownKind(_)));
    }

    #[test]
    fn missing_manufacturer_is_rejected() {
        let mut pool = pool();
        let mut payload = valid_payload();
        payload.remove("manufacturerId");
        let d = TransactionDraft::new("tx-1", "batch-transfer", payload, NOW);
        let err = pool.submit(d, NOW).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::MissingField("manufacturerId")
        ));
    }

    #[test]
    fn batch_id_must_be_fourteen_digits() {
        let mut pool = pool();
        for bad in ["1234", "1234567890123X", "123456789012345"] {
            let mut payload = valid_payload();
            payload.insert("batchId".into(), bad.into());
            let d = TransactionDraft::new(format!("tx-{bad}"), "batch-transfer", payload, NOW);
            let err = pool.submit(d, NOW).unwrap_err();
            assert!(matches!(err, AdmissionError::InvalidBatchId(_)), "{bad}");
        }
        // Exactly 14 digits is accepted.
        assert!(pool.submit(draft("tx-ok"), NOW).is_ok());
    }

    #[test]
    fn duplicate_id_is_rejected_on_second_submit() {
        let mut pool = pool();
        pool.submit(draft("tx-1"), NOW).expect("first admitted");
        let err = pool.submit(draft("tx-1"), NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::Duplicate(_)));
    }

    #[test]
    fn ids_sealed_in_the_chain_are_duplicates_too() {
        let sealed: HashSet<String> = ["tx-chain".to_string()].into_iter().collect();
        let mut pool = AdmissionPool::new(&PoolConfig::default(), sealed);
        let err = pool.submit(draft("tx-chain"), NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::Duplicate(_)));
    }

    #[test]
    fn stale_transaction_is_rejected() {
        let mut pool = pool();
        let six_minutes = 6 * 60 * 1000;
        let err = pool.submit(draft("tx-old"), NOW + six_minutes).unwrap_err();
        assert!(matches!(err, AdmissionError::Stale { .. }));
    }

    #[test]
    fn temperature_log_requires_reading_fields() {
        let mut pool = pool();
        let d = TransactionDraft::new("tx-1", "temperature-log", valid_payload(), NOW);
        let err = pool.submit(d, NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::MissingField("temperature")));
    }

    #[test]
    fn envelope_violation_is_signalled_but_admitted() {
        let mut pool = pool();
        let mut payload = valid_payload();
        payload.insert("temperature".into(), 10.0.into());
        payload.insert("humidity".into(), 50.0.into());
        payload.insert("location".into(), "warehouse-7".into());
        payload.insert("drugCategory".into(), "VACCINE".into());

        let d = TransactionDraft::new("tx-hot", "temperature-log", payload, NOW);
        let (receipt, violation) = pool.submit(d, NOW).expect("admitted despite violation");
        assert_eq!(receipt.queue_depth, 1);
        let violation = violation.expect("10C breaches the vaccine envelope");
        assert_eq!(violation.threshold, 8.0);
    }

    #[test]
    fn drain_pulls_urgent_to_the_front() {
        let mut pool = pool();
        pool.submit(draft("n1"), NOW).expect("admit");
        pool.submit(draft("n2"), NOW).expect("admit");
        pool.submit(
            draft("u1").with_priority(Priority::Urgent),
            NOW,
        )
        .expect("admit");

        assert!(pool.has_urgent());
        let batch = pool.drain_batch(10);
        let ids: Vec<&str> = batch.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, ["u1", "n1", "n2"]);
        assert!(pool.is_empty());
    }

    #[test]
    fn requeue_front_restores_order_ahead_of_new_admissions() {
        let mut pool = pool();
        pool.submit(draft("a"), NOW).expect("admit");
        pool.submit(draft("b"), NOW).expect("admit");
        let batch = pool.drain_batch(10);
        assert_eq!(batch.len(), 2);

        pool.submit(draft("c"), NOW).expect("admit");
        pool.requeue_front(batch);

        // Requeued ids are still in the duplicate index.
        let err = pool.submit(draft("a"), NOW).unwrap_err();
        assert!(matches!(err, AdmissionError::Duplicate(_)));

        let ids: Vec<String> = pool.drain_batch(10).into_iter().map(|tx| tx.id).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn drain_respects_max_and_keeps_the_rest() {
        let mut pool = pool();
        for i in 0..5 {
            pool.submit(draft(&format!("tx-{i}")), NOW).expect("admit");
        }

        let batch = pool.drain_batch(3);
        assert_eq!(batch.len(), 3);
        assert_eq!(pool.len(), 2);

        // FIFO order is preserved across batches.
        let next = pool.drain_batch(3);
        let ids: Vec<&str> = next.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, ["tx-3", "tx-4"]);
    }
}
