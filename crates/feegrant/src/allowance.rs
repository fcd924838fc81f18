//! Fee allowance variants and their accept logic.

use crate::{BlockInfo, Coins, Error, Expiration, Result};
use serde::{Deserialize, Serialize};

/// Outcome of asking an allowance to pay a fee.
///
/// Exactly one of these applies to every request; the keeper maps each to a
/// single store action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Fee paid, budget remains. Persist the updated allowance.
    Accept,
    /// Fee paid and the budget is now zero. Delete the record.
    Exhausted,
    /// The deadline has passed. Delete the record and reject.
    Expired,
    /// The fee exceeds the remaining budget. Leave the record alone.
    Insufficient { requested: Coins, remaining: Coins },
}

impl Decision {
    /// Whether the stored record must be deleted.
    pub fn removes_record(&self) -> bool {
        matches!(self, Decision::Exhausted | Decision::Expired)
    }

    /// The error reported to the caller, if any.
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Accept | Decision::Exhausted => Ok(()),
            Decision::Expired => Err(Error::Expired),
            Decision::Insufficient {
                requested,
                remaining,
            } => Err(Error::InsufficientAllowance {
                requested,
                remaining,
            }),
        }
    }
}

/// A spend limit that lapses at a deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicFeeAllowance {
    pub spend_limit: Coins,
    pub expiration: Expiration,
}

impl BasicFeeAllowance {
    pub fn new(spend_limit: Coins, expiration: Expiration) -> Self {
        Self {
            spend_limit,
            expiration,
        }
    }

    /// Try to pay `fee` at `block`, decrementing the spend limit on success.
    ///
    /// Expiry is checked before the budget: an expired allowance is rejected
    /// even when it could cover the fee.
    pub fn accept(&mut self, fee: &Coins, block: &BlockInfo) -> Decision {
        if self.expiration.is_expired(block) {
            return Decision::Expired;
        }

        let Some(left) = self.spend_limit.checked_sub(fee) else {
            return Decision::Insufficient {
                requested: fee.clone(),
                remaining: self.spend_limit.clone(),
            };
        };

        self.spend_limit = left;
        if self.spend_limit.is_zero() {
            Decision::Exhausted
        } else {
            Decision::Accept
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.spend_limit.is_zero() {
            return Err(Error::Invalid("spend limit must be positive".into()));
        }
        self.expiration.validate()
    }
}

/// A capability to pay fees on a granter's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Allowance {
    Basic(BasicFeeAllowance),
}

impl Allowance {
    /// Convenience constructor for a basic allowance.
    pub fn basic(spend_limit: Coins, expiration: Expiration) -> Self {
        Allowance::Basic(BasicFeeAllowance::new(spend_limit, expiration))
    }

    /// Decide whether `fee` can be paid at `block`. Only the allowance's own
    /// budget is touched; persisting the result is up to the caller.
    pub fn accept(&mut self, fee: &Coins, block: &BlockInfo) -> Decision {
        match self {
            Allowance::Basic(basic) => basic.accept(fee, block),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Allowance::Basic(basic) => basic.validate(),
        }
    }

    pub fn expiration(&self) -> Expiration {
        match self {
            Allowance::Basic(basic) => basic.expiration,
        }
    }
}

impl From<BasicFeeAllowance> for Allowance {
    fn from(basic: BasicFeeAllowance) -> Self {
        Allowance::Basic(basic)
    }
}
