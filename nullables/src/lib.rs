//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (storage, signature verification) are abstracted
//! behind traits. This crate provides test-friendly implementations, plus
//! builders for transactions and blocks. The implementations:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod fixtures;
pub mod store;
pub mod verifier;

pub use store::NullStore;
pub use verifier::NullVerifier;
