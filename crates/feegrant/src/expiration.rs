//! Allowance deadlines.

use crate::{BlockInfo, Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The point after which an allowance is void.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    /// Expires once the chain reaches this block height.
    AtHeight(u64),
    /// Expires once block time reaches this instant.
    AtTime(DateTime<Utc>),
}

impl Expiration {
    pub fn at_height(height: u64) -> Self {
        Expiration::AtHeight(height)
    }

    pub fn at_time(time: DateTime<Utc>) -> Self {
        Expiration::AtTime(time)
    }

    /// True once `block` is at or past the deadline.
    pub fn is_expired(&self, block: &BlockInfo) -> bool {
        match self {
            Expiration::AtHeight(height) => block.height >= *height,
            Expiration::AtTime(time) => block.time >= *time,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Expiration::AtHeight(0) => {
                Err(Error::Invalid("expiration height must be positive".into()))
            }
            Expiration::AtTime(time) if time.timestamp() <= 0 => {
                Err(Error::Invalid("expiration time must be after the epoch".into()))
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for Expiration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expiration::AtHeight(height) => write!(f, "height {height}"),
            Expiration::AtTime(time) => write!(f, "{}", time.to_rfc3339()),
        }
    }
}
