//! Multi-denomination amounts.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

/// Amounts travel as decimal strings so they stay exact past `u64`.
mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = Error;

    /// Parse `<amount><denom>`, e.g. `555atom`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::Invalid(format!("coin '{s}' has no denom")))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(Error::Invalid(format!("coin '{s}' has no amount")));
        }
        let amount = amount
            .parse()
            .map_err(|e| Error::Invalid(format!("coin '{s}': {e}")))?;
        validate_denom(denom)?;
        Ok(Coin::new(amount, denom))
    }
}

/// Check a denomination: 3 to 128 characters, a leading letter, then ascii
/// alphanumerics or `/`.
pub fn validate_denom(denom: &str) -> Result<()> {
    let valid_len = (3..=128).contains(&denom.len());
    let mut chars = denom.chars();
    let valid_head = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_tail = chars.all(|c| c.is_ascii_alphanumeric() || c == '/');

    if valid_len && valid_head && valid_tail {
        Ok(())
    } else {
        Err(Error::Invalid(format!("invalid denom '{denom}'")))
    }
}

/// A normalized set of coins: sorted by denom, one entry per denom, and no
/// zero amounts. The empty set is the zero amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Build a normalized set. Zero amounts are dropped; duplicate or
    /// malformed denoms are rejected.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Result<Self> {
        let mut coins: Vec<Coin> = coins.into_iter().filter(|c| c.amount > 0).collect();
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));

        for coin in &coins {
            validate_denom(&coin.denom)?;
        }
        if let Some(pair) = coins.windows(2).find(|w| w[0].denom == w[1].denom) {
            return Err(Error::Invalid(format!("duplicate denom '{}'", pair[0].denom)));
        }

        Ok(Self(coins))
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|i| self.0[i].amount)
            .unwrap_or(0)
    }

    /// Whether every denomination in `other` is available here in an equal
    /// or greater amount.
    pub fn covers(&self, other: &Coins) -> bool {
        other.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    /// Per-denomination subtraction. `None` if any denomination would go
    /// negative.
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            let slot = out
                .binary_search_by(|c| c.denom.cmp(&coin.denom))
                .ok()?;
            out[slot].amount = out[slot].amount.checked_sub(coin.amount)?;
        }
        out.retain(|c| c.amount > 0);
        Some(Coins(out))
    }

    /// Per-denomination addition. `None` on overflow.
    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            match out.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
                Ok(slot) => out[slot].amount = out[slot].amount.checked_add(coin.amount)?,
                Err(slot) => out.insert(slot, coin.clone()),
            }
        }
        Some(Coins(out))
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        if coin.amount == 0 {
            Coins::zero()
        } else {
            Coins(vec![coin])
        }
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = Error;

    fn try_from(coins: Vec<Coin>) -> Result<Self> {
        Coins::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = Error;

    /// Parse a comma-separated list, e.g. `555atom,10eth`.
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Coins::zero());
        }
        let coins = s
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Coin>>>()?;
        Coins::new(coins)
    }
}
