//! Nullable signature verifier.

use std::collections::HashSet;
use std::sync::Mutex;

use tokenchain_transactions::{ProgramVerifier, Transaction};
use tokenchain_types::TxHash;

/// Accepts every transaction except those explicitly marked as forged.
#[derive(Default)]
pub struct NullVerifier {
    rejected: Mutex<HashSet<TxHash>>,
}

impl NullVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make verification of `hash` fail.
    pub fn reject(&self, hash: TxHash) {
        self.rejected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(hash);
    }
}

impl ProgramVerifier for NullVerifier {
    fn verify(&self, tx: &Transaction) -> bool {
        !self
            .rejected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&tx.hash())
    }
}
