//! Bulk import and export of every grant.

use crate::{Context, FeeAllowanceGrant, Keeper, Result};
use serde::{Deserialize, Serialize};
use storage::KvStore;

/// A snapshot of all fee allowances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub fee_allowances: Vec<FeeAllowanceGrant>,
}

impl GenesisState {
    pub fn new(fee_allowances: Vec<FeeAllowanceGrant>) -> Self {
        Self { fee_allowances }
    }

    pub fn validate(&self) -> Result<()> {
        self.fee_allowances.iter().try_for_each(FeeAllowanceGrant::validate)
    }
}

impl Keeper {
    /// Load every grant in `genesis`. Nothing is written unless all grants
    /// validate. Later entries for the same pair replace earlier ones.
    pub fn init_genesis<S: KvStore>(
        &self,
        ctx: &mut Context<S>,
        genesis: &GenesisState,
    ) -> Result<()> {
        genesis.validate()?;
        for grant in &genesis.fee_allowances {
            self.grant_fee_allowance(ctx, grant)?;
        }
        tracing::info!(count = genesis.fee_allowances.len(), "fee allowances imported");
        Ok(())
    }

    /// Collect every stored grant, ordered by grantee then granter.
    pub fn export_genesis<S: KvStore>(&self, ctx: &Context<S>) -> Result<GenesisState> {
        let mut fee_allowances = Vec::new();
        self.iterate_all_fee_allowances(ctx, |grant| {
            fee_allowances.push(grant);
            false
        })?;
        Ok(GenesisState { fee_allowances })
    }
}
