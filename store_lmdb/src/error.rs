use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database '{0}' is missing")]
    MissingDatabase(&'static str),

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<LmdbError> for tokenchain_store::StoreError {
    fn from(e: LmdbError) -> Self {
        tokenchain_store::StoreError::Backend(e.to_string())
    }
}
