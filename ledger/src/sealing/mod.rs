//! Proof-of-work block sealing.

pub mod engine;

pub use engine::Sealer;
