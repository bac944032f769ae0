//! End-to-end chain integrity verification.
//!
//! The verifier walks the chain once, fail-fast: for every block after
//! genesis it recomputes the content hash (tamper detection) and checks
//! `previousHash` linkage (splice detection). There is no notion of a
//! partially valid chain.

use std::fmt;

use crate::types::Block;

/// The first integrity failure found in a chain walk.
#[derive(Debug)]
pub enum IntegrityError {
    /// Stored hash does not match the recomputed content hash.
    HashMismatch { index: u64 },
    /// Block does not link to its predecessor's hash.
    BrokenLink { index: u64 },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::HashMismatch { index } => {
                write!(f, "block {index}: stored hash does not match contents")
            }
            IntegrityError::BrokenLink { index } => {
                write!(f, "block {index}: previousHash does not match parent")
            }
        }
    }
}

impl std::error::Error for IntegrityError {}

/// Walks `blocks` and returns the first integrity failure, if any.
pub fn verify_chain(blocks: &[Block]) -> Result<(), IntegrityError> {
    for i in 1..blocks.len() {
        let block = &blocks[i];
        let parent = &blocks[i - 1];

        if block.hash != block.compute_hash() {
            return Err(IntegrityError::HashMismatch { index: block.index });
        }
        if block.previous_hash != parent.hash {
            return Err(IntegrityError::BrokenLink { index: block.index });
        }
    }
    Ok(())
}

/// Convenience predicate over [`verify_chain`].
pub fn is_valid(blocks: &[Block]) -> bool {
    verify_chain(blocks).is_ok()
}
