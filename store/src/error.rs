use thiserror::Error;

/// Failures of a [`KvStore`](crate::KvStore) backend or of the bytes it holds.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record encoding error: {0}")]
    Serialization(String),

    /// Stored bytes do not match the layout their key tag implies.
    #[error("corrupt record: {0}")]
    Corruption(String),
}
