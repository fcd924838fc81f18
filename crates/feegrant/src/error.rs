//! Fee grant error types.

use crate::{Address, Coins};
use thiserror::Error;

/// Fee grant errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No allowance exists for the granter/grantee pair.
    #[error("no fee allowance from {granter} to {grantee}")]
    NotFound { granter: Address, grantee: Address },

    /// The allowance deadline has passed. The record has been removed.
    #[error("fee allowance expired")]
    Expired,

    /// The requested fee is not covered by the remaining spend limit.
    #[error("fee limit exceeded: requested {requested}, remaining {remaining}")]
    InsufficientAllowance { requested: Coins, remaining: Coins },

    /// Input failed validation.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// A stored record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

impl Error {
    /// Whether this error means "the allowance does not pay for this fee".
    ///
    /// A fee payer can fall back to charging the grantee directly on these.
    /// Storage and codec failures are never rejections.
    pub fn is_allowance_rejection(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::Expired | Error::InsufficientAllowance { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
