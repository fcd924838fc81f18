use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("empty key")]
    EmptyKey,
}

pub type Result<T> = std::result::Result<T, Error>;
