//! The ordered key-value abstraction consumed by state modules.

use crate::Result;

/// An ordered byte-keyed store.
///
/// Keys compare byte-wise. Reads take `&self`; writes take `&mut self`, so a
/// store has exactly one writer at a time.
pub trait KvStore {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Every entry whose key starts with `prefix`, ascending by key.
    fn iter_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// The smallest key greater than every key starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty prefix, or all `0xff`).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
