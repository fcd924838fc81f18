//! Execution context threaded through keeper calls.

use chrono::{DateTime, Utc};
use storage::KvStore;

/// Where the chain is when a call executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockInfo {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// A block at `height` with time pinned to the epoch.
    pub fn at_height(height: u64) -> Self {
        Self::new(height, DateTime::UNIX_EPOCH)
    }
}

/// The current block plus the store the call reads and writes.
pub struct Context<S: KvStore> {
    pub block: BlockInfo,
    pub store: S,
}

impl<S: KvStore> Context<S> {
    pub fn new(store: S, block: BlockInfo) -> Self {
        Self { block, store }
    }
}
