// ledger/src/types/tx.rs

//! Transaction types for the admission and sealing layers.
//!
//! Transactions arrive from the (external) API layer as loosely-typed
//! [`TransactionDraft`]s so that unrecognized kinds and malformed shapes
//! can be rejected with a precise admission error instead of a generic
//! deserialization failure. Once admitted they become strongly-typed
//! [`Transaction`]s, which is the form that appears in blocks and on disk.

use serde::{Deserialize, Serialize};

/// Free-form transaction payload: a JSON object with camelCase keys.
///
/// `serde_json::Map` is backed by a sorted map, which keeps the canonical
/// JSON encoding (and therefore block hashes) deterministic.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// The seven recognized pharmaceutical transaction kinds.
///
/// Anything else is rejected at admission with
/// [`AdmissionError::UnknownKind`](crate::pool::AdmissionError::UnknownKind).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TxKind {
    DrugManufacture,
    BatchTransfer,
    QualityCheck,
    TemperatureLog,
    RecallNotice,
    ExpiryUpdate,
    DistributionRecord,
}

impl TxKind {
    /// Parses the wire form of a kind (e.g. `"temperature-log"`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "drug-manufacture" => Some(TxKind::DrugManufacture),
            "batch-transfer" => Some(TxKind::BatchTransfer),
            "quality-check" => Some(TxKind::QualityCheck),
            "temperature-log" => Some(TxKind::TemperatureLog),
            "recall-notice" => Some(TxKind::RecallNotice),
            "expiry-update" => Some(TxKind::ExpiryUpdate),
            "distribution-record" => Some(TxKind::DistributionRecord),
            _ => None,
        }
    }

    /// Returns the wire form of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::DrugManufacture => "drug-manufacture",
            TxKind::BatchTransfer => "batch-transfer",
            TxKind::QualityCheck => "quality-check",
            TxKind::TemperatureLog => "temperature-log",
            TxKind::RecallNotice => "recall-notice",
            TxKind::ExpiryUpdate => "expiry-update",
            TxKind::DistributionRecord => "distribution-record",
        }
    }
}

/// Admission priority of a transaction.
///
/// `Urgent` transactions are pulled to the front of the next sealing batch
/// and trigger sealing immediately on admission, regardless of how full
/// the pool is.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

/// A transaction as submitted by a client, before admission.
///
/// Every field the admission pool validates is deliberately loose here:
/// `kind` is a plain string and `created_at` an arbitrary JSON value, so
/// that a bad submission surfaces as the right `AdmissionError` variant
/// rather than a serde error at the API boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub priority: Priority,
    /// Submission timestamp in milliseconds since Unix epoch. Must be a
    /// JSON number; anything else is a malformed transaction.
    #[serde(default)]
    pub created_at: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl TransactionDraft {
    /// Convenience constructor used by tests and tooling.
    pub fn new(id: impl Into<String>, kind: &str, payload: Payload, created_at: u64) -> Self {
        Self {
            id: id.into(),
            kind: kind.to_string(),
            payload: serde_json::Value::Object(payload),
            priority: Priority::Normal,
            created_at: serde_json::Value::from(created_at),
            signature: None,
            public_key: None,
        }
    }

    /// Sets the priority, builder-style.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}

/// A validated, admitted transaction.
///
/// The `signature`/`public_key` pair is opaque to the ledger core;
/// cryptographic proof of authorship is delegated to an external verifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier, checked against the pool and the whole chain.
    pub id: String,
    pub kind: TxKind,
    /// Domain payload; always carries `batchId`, `manufacturerId`, and
    /// `timestamp`, plus kind-specific fields.
    pub payload: Payload,
    pub priority: Priority,
    /// Ledger-side submission timestamp (milliseconds since Unix epoch).
    pub created_at: u64,
    /// Set when the transaction is included in a sealed block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl Transaction {
    /// Returns the `batchId` payload field, if present and a string.
    pub fn batch_id(&self) -> Option<&str> {
        self.payload.get("batchId").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_and_as_str_are_inverses() {
        for s in [
            "drug-manufacture",
            "batch-transfer",
            "quality-check",
            "temperature-log",
            "recall-notice",
            "expiry-update",
            "distribution-record",
        ] {
            let kind = TxKind::parse(s).expect("recognized kind");
            assert_eq!(kind.as_str(), s);
        }
        assert!(TxKind::parse("smart-contract-call").is_none());
    }

    #[test]
    fn kind_serializes_in_kebab_case() {
        let json = serde_json::to_string(&TxKind::TemperatureLog).expect("serialize");
        assert_eq!(json, "\"temperature-log\"");
    }

    #[test]
    fn draft_tolerates_missing_fields() {
        // An empty object must deserialize; admission rejects it later.
        let draft: TransactionDraft = serde_json::from_str("{}").expect("deserialize");
        assert!(draft.id.is_empty());
        assert!(draft.kind.is_empty());
        assert!(draft.created_at.is_null());
        assert_eq!(draft.priority, Priority::Normal);
    }

    #[test]
    fn transaction_json_uses_camel_case_keys() {
        let mut payload = Payload::new();
        payload.insert("batchId".into(), "12345678901234".into());

        let tx = Transaction {
            id: "tx-1".into(),
            kind: TxKind::QualityCheck,
            payload,
            priority: Priority::Normal,
            created_at: 1_700_000_000_000,
            processed_at: None,
            signature: None,
            public_key: None,
        };

        let json = serde_json::to_value(&tx).expect("serialize");
        assert_eq!(json["createdAt"], 1_700_000_000_000u64);
        assert_eq!(json["kind"], "quality-check");
        // Absent optionals are omitted entirely.
        assert!(json.get("processedAt").is_none());
    }
}
