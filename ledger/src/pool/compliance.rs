//! Pharmaceutical compliance rule engine.
//!
//! Each drug category has a temperature/humidity envelope. Temperature-log
//! payloads are checked against the envelope for their `drugCategory`; a
//! reading outside the envelope produces a [`ComplianceViolation`] signal.
//! Violations are surfaced by the caller (logged, emitted as events) but
//! never block the transaction: the reading itself is valuable evidence
//! and belongs on the ledger.

use serde::{Deserialize, Serialize};

use crate::types::Payload;

/// Which bound of the envelope was exceeded.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationKind {
    Temperature,
    Humidity,
}

/// A cold-chain envelope violation derived from a temperature log.
///
/// This is a signal, not a chain entity: it is emitted for telemetry and
/// alerting but never persisted in a block.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceViolation {
    pub kind: ViolationKind,
    pub batch_id: String,
    /// The observed reading (°C or %RH).
    pub observed: f64,
    /// The envelope bound that was exceeded.
    pub threshold: f64,
    /// When the violation was detected (milliseconds since Unix epoch).
    pub timestamp: u64,
}

/// Permitted storage conditions for a drug category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub humidity_min_pct: f64,
    pub humidity_max_pct: f64,
}

/// Cold-chain envelopes per drug category, checked during admission.
#[derive(Clone, Copy, Debug, Default)]
pub struct ComplianceValidator;

impl ComplianceValidator {
    /// Resolves the envelope for a `drugCategory` value.
    ///
    /// Unknown or absent categories map to no envelope at all: nothing is
    /// enforced and no violation is possible.
    pub fn envelope_for(category: &str) -> Option<Envelope> {
        match category {
            "VACCINE" | "INSULIN" => Some(Envelope {
                temp_min_c: 2.0,
                temp_max_c: 8.0,
                humidity_min_pct: 35.0,
                humidity_max_pct: 65.0,
            }),
            "ANTIBIOTIC" | "ANTIBIOTICS" => Some(Envelope {
                temp_min_c: 15.0,
                temp_max_c: 25.0,
                humidity_min_pct: 30.0,
                humidity_max_pct: 60.0,
            }),
            "CONTROLLED_SUBSTANCE" => Some(Envelope {
                temp_min_c: 20.0,
                temp_max_c: 25.0,
                humidity_min_pct: 30.0,
                humidity_max_pct: 60.0,
            }),
            _ => None,
        }
    }

    /// Checks a temperature-log payload against its category envelope.
    ///
    /// Returns the first violated bound, temperature before humidity.
    /// `now` is the detection timestamp recorded on the violation.
    pub fn check(&self, payload: &Payload, now: u64) -> Option<ComplianceViolation> {
        let category = payload
            .get("drugCategory")
            .and_then(|v| v.as_str())
            .unwrap_or("unspecified");
        let envelope = Self::envelope_for(category)?;

        let batch_id = payload
            .get("batchId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if let Some(temperature) = payload.get("temperature").and_then(|v| v.as_f64()) {
            let exceeded = if temperature > envelope.temp_max_c {
                Some(envelope.temp_max_c)
            } else if temperature < envelope.temp_min_c {
                Some(envelope.temp_min_c)
            } else {
                None
            };
            if let Some(threshold) = exceeded {
                return Some(ComplianceViolation {
                    kind: ViolationKind::Temperature,
                    batch_id,
                    observed: temperature,
                    threshold,
                    timestamp: now,
                });
            }
        }

        if let Some(humidity) = payload.get("humidity").and_then(|v| v.as_f64()) {
            let exceeded = if humidity > envelope.humidity_max_pct {
                Some(envelope.humidity_max_pct)
            } else if humidity < envelope.humidity_min_pct {
                Some(envelope.humidity_min_pct)
            } else {
                None
            };
            if let Some(threshold) = exceeded {
                return Some(ComplianceViolation {
                    kind: ViolationKind::Humidity,
                    batch_id,
                    observed: humidity,
                    threshold,
                    timestamp: now,
                });
            }
        }

        None
    }
}
