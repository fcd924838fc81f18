use crate::{Address, Allowance, Error, Result};
use serde::{Deserialize, Serialize};

/// A persisted allowance from `granter` to `grantee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAllowanceGrant {
    pub granter: Address,
    pub grantee: Address,
    pub allowance: Allowance,
}

impl FeeAllowanceGrant {
    pub fn new(granter: Address, grantee: Address, allowance: impl Into<Allowance>) -> Self {
        Self {
            granter,
            grantee,
            allowance: allowance.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.granter == self.grantee {
            return Err(Error::Invalid(format!(
                "cannot grant a fee allowance to self ({})",
                self.granter
            )));
        }
        self.allowance.validate()
    }
}
