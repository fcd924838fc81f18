//! Ordered key-value storage for feegrant state.
//!
//! This crate provides the persistence layer the fee allowance keeper runs
//! on: a byte-keyed store with point reads, writes, deletes and ordered
//! prefix scans.
//!
//! # Core Concepts
//!
//! ## KvStore
//!
//! The [`KvStore`] trait is the only interface state modules see. Keys
//! compare byte-wise and [`KvStore::iter_prefix`] returns entries in
//! ascending key order, which lets a module lay out its keys so that a
//! related group of records forms one contiguous range.
//!
//! ## SqliteStore
//!
//! [`SqliteStore`] implements [`KvStore`] on a single SQLite table with a
//! BLOB primary key. It can live on disk or in memory.
//!
//! # Example
//!
//! ```no_run
//! use storage::{KvStore, SqliteStore};
//!
//! let mut store = SqliteStore::open("state.db")?;
//! store.set(b"\x00alice", b"1")?;
//! store.set(b"\x00bob", b"2")?;
//!
//! for (key, value) in store.iter_prefix(b"\x00")? {
//!     println!("{key:?} => {value:?}");
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod kv;
mod store;

pub use error::{Error, Result};
pub use kv::{prefix_end, KvStore};
pub use store::SqliteStore;
