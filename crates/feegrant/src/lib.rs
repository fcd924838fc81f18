//! Revocable, bounded fee allowances.
//!
//! A *granter* lets a *grantee* spend up to a fixed budget on its behalf
//! until a deadline. This crate keeps those allowances in a [`storage::KvStore`]
//! and decides, for each fee a grantee wants to charge, whether the
//! allowance pays for it.
//!
//! # Core Concepts
//!
//! ## Allowance
//!
//! An [`Allowance`] is a sum type of allowance variants. The only variant
//! today is [`BasicFeeAllowance`]: a per-denomination spend limit
//! ([`Coins`]) plus an [`Expiration`] at a block height or time.
//! [`Allowance::accept`] returns a [`Decision`] telling the caller whether
//! to update, delete, or keep the stored record.
//!
//! ## Keeper
//!
//! The [`Keeper`] owns the key layout and every store access: grant,
//! revoke, lookup, per-grantee iteration, and [`Keeper::use_granted_fees`],
//! the one read-modify-write operation. Every call takes a [`Context`]
//! with the current [`BlockInfo`] and the store.
//!
//! Expired allowances are deleted the first time a spend discovers them,
//! and the spend still fails with [`Error::Expired`].
//!
//! # Example
//!
//! ```no_run
//! use feegrant::{Address, Allowance, BlockInfo, Coins, Context, Expiration, FeeAllowanceGrant, Keeper};
//! use storage::SqliteStore;
//!
//! let mut ctx = Context::new(SqliteStore::in_memory()?, BlockInfo::at_height(100));
//! let keeper = Keeper::new();
//!
//! let granter: Address = "a6f22a0bfd03e18d97a4c1c37b82fb446ce85720".parse()?;
//! let grantee: Address = "1c8cedbc6e4f3f6c43ef0269f5ab4e308841a0d4".parse()?;
//! let limit: Coins = "555atom".parse()?;
//! let fee: Coins = "1atom".parse()?;
//! let allowance = Allowance::basic(limit, Expiration::at_height(5678));
//!
//! keeper.grant_fee_allowance(&mut ctx, &FeeAllowanceGrant::new(granter, grantee, allowance))?;
//! keeper.use_granted_fees(&mut ctx, &granter, &grantee, &fee)?;
//!
//! let left = keeper.get_fee_allowance(&ctx, &granter, &grantee)?;
//! println!("{left:?}");
//! # Ok::<(), feegrant::Error>(())
//! ```

mod address;
mod allowance;
mod coins;
mod context;
mod error;
mod expiration;
mod genesis;
mod grant;
mod keeper;
pub mod keys;

pub use address::{Address, ADDRESS_LEN};
pub use allowance::{Allowance, BasicFeeAllowance, Decision};
pub use coins::{validate_denom, Coin, Coins};
pub use context::{BlockInfo, Context};
pub use error::{Error, Result};
pub use expiration::Expiration;
pub use genesis::GenesisState;
pub use grant::FeeAllowanceGrant;
pub use keeper::Keeper;
