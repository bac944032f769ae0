//! Transaction admission and pharmaceutical compliance checking.
//!
//! Incoming transactions pass through structural and domain validation in
//! [`admission::AdmissionPool`]; temperature logs additionally run through
//! the [`compliance::ComplianceValidator`], which can flag cold-chain
//! violations without ever blocking admission.

pub mod admission;
pub mod compliance;

pub use admission::{AdmissionError, AdmissionPool, AdmissionReceipt};
pub use compliance::{ComplianceValidator, ComplianceViolation, Envelope, ViolationKind};
