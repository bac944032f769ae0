//! The chain store and integrity verification.
//!
//! This module owns the ordered sequence of sealed blocks. No other
//! component appends to or reorders the chain directly; everything goes
//! through [`ChainStore`].

pub mod store;
pub mod verify;

pub use store::{ChainStore, StoreError};
pub use verify::{IntegrityError, is_valid, verify_chain};
