//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No allowance exists for the requested pair.
    #[error("no fee allowance from {granter} to {grantee}")]
    NoAllowance { granter: String, grantee: String },

    /// Neither an expiration height nor time was given.
    #[error("an expiration is required: pass --expires-height or --expires-time")]
    MissingExpiration,

    /// Configuration is invalid or unreadable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An error occurred in the fee grant layer.
    #[error(transparent)]
    FeeGrant(#[from] feegrant::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// A genesis file could not be encoded or decoded.
    #[error("genesis file: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
