//! The signature verification capability.

use crate::Transaction;

/// Checks a transaction's unlocking programs against the outputs it spends.
///
/// Signature schemes live outside the ledger core; the node supplies an
/// implementation at construction time.
pub trait ProgramVerifier: Send + Sync {
    fn verify(&self, tx: &Transaction) -> bool;
}
