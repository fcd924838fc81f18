//! Allowance lifecycle over a key-value store.

use crate::keys::{
    fee_allowance_key, fee_allowance_prefix_by_grantee, parse_fee_allowance_key,
    FEE_ALLOWANCE_PREFIX,
};
use crate::{Address, Allowance, Coins, Context, Decision, Error, FeeAllowanceGrant, Result};
use storage::KvStore;

/// Grants, revokes, looks up and spends fee allowances.
///
/// The keeper holds no state of its own: every call receives a [`Context`]
/// carrying the current block and the store to act on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keeper;

impl Keeper {
    pub fn new() -> Self {
        Self
    }

    /// Store `grant`, replacing any allowance for the same pair.
    pub fn grant_fee_allowance<S: KvStore>(
        &self,
        ctx: &mut Context<S>,
        grant: &FeeAllowanceGrant,
    ) -> Result<()> {
        grant.validate()?;
        let key = fee_allowance_key(&grant.granter, &grant.grantee);
        ctx.store.set(&key, &serde_json::to_vec(grant)?)?;
        tracing::debug!(
            granter = %grant.granter,
            grantee = %grant.grantee,
            "fee allowance granted"
        );
        Ok(())
    }

    /// Remove the allowance for the pair. Absent pairs are a no-op.
    pub fn revoke_fee_allowance<S: KvStore>(
        &self,
        ctx: &mut Context<S>,
        granter: &Address,
        grantee: &Address,
    ) -> Result<()> {
        ctx.store.delete(&fee_allowance_key(granter, grantee))?;
        tracing::debug!(%granter, %grantee, "fee allowance revoked");
        Ok(())
    }

    /// The allowance from `granter` to `grantee`, if one exists.
    pub fn get_fee_allowance<S: KvStore>(
        &self,
        ctx: &Context<S>,
        granter: &Address,
        grantee: &Address,
    ) -> Result<Option<Allowance>> {
        Ok(self
            .get_fee_grant(ctx, granter, grantee)?
            .map(|grant| grant.allowance))
    }

    /// The full grant record for the pair, if one exists.
    pub fn get_fee_grant<S: KvStore>(
        &self,
        ctx: &Context<S>,
        granter: &Address,
        grantee: &Address,
    ) -> Result<Option<FeeAllowanceGrant>> {
        let key = fee_allowance_key(granter, grantee);
        match ctx.store.get(&key)? {
            Some(bytes) => Ok(Some(decode_grant(&key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Visit every grant held by `grantee`, in ascending granter order.
    ///
    /// `visit` returns `true` to stop early.
    pub fn iterate_all_grantee_fee_allowances<S, F>(
        &self,
        ctx: &Context<S>,
        grantee: &Address,
        visit: F,
    ) -> Result<()>
    where
        S: KvStore,
        F: FnMut(FeeAllowanceGrant) -> bool,
    {
        let prefix = fee_allowance_prefix_by_grantee(grantee);
        visit_grants(ctx, &prefix, visit)
    }

    /// Visit every grant in the store, ordered by grantee then granter.
    pub fn iterate_all_fee_allowances<S, F>(&self, ctx: &Context<S>, visit: F) -> Result<()>
    where
        S: KvStore,
        F: FnMut(FeeAllowanceGrant) -> bool,
    {
        visit_grants(ctx, &[FEE_ALLOWANCE_PREFIX], visit)
    }

    /// Charge `fee` against the allowance from `granter` to `grantee`.
    ///
    /// On success the allowance is decremented, or deleted if it reaches
    /// zero. An expired allowance is deleted and `Error::Expired` returned.
    /// An insufficient allowance is left untouched.
    pub fn use_granted_fees<S: KvStore>(
        &self,
        ctx: &mut Context<S>,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
    ) -> Result<()> {
        let key = fee_allowance_key(granter, grantee);
        let Some(bytes) = ctx.store.get(&key)? else {
            return Err(Error::NotFound {
                granter: *granter,
                grantee: *grantee,
            });
        };
        let mut grant = decode_grant(&key, &bytes)?;

        let decision = grant.allowance.accept(fee, &ctx.block);
        match &decision {
            Decision::Accept => {
                ctx.store.set(&key, &serde_json::to_vec(&grant)?)?;
                tracing::debug!(%granter, %grantee, %fee, "fee allowance used");
            }
            Decision::Exhausted => {
                ctx.store.delete(&key)?;
                tracing::info!(%granter, %grantee, %fee, "fee allowance exhausted");
            }
            Decision::Expired => {
                ctx.store.delete(&key)?;
                tracing::info!(
                    %granter,
                    %grantee,
                    height = ctx.block.height,
                    "expired fee allowance removed"
                );
            }
            Decision::Insufficient { .. } => {
                tracing::debug!(%granter, %grantee, %fee, "fee exceeds allowance");
            }
        }

        decision.into_result()
    }
}

fn visit_grants<S, F>(ctx: &Context<S>, prefix: &[u8], mut visit: F) -> Result<()>
where
    S: KvStore,
    F: FnMut(FeeAllowanceGrant) -> bool,
{
    for (key, bytes) in ctx.store.iter_prefix(prefix)? {
        if visit(decode_grant(&key, &bytes)?) {
            break;
        }
    }
    Ok(())
}

/// Decode a stored record and check it names the pair its key encodes.
fn decode_grant(key: &[u8], bytes: &[u8]) -> Result<FeeAllowanceGrant> {
    let grant: FeeAllowanceGrant = serde_json::from_slice(bytes)?;
    let (granter, grantee) = parse_fee_allowance_key(key)?;
    if grant.granter != granter || grant.grantee != grantee {
        return Err(Error::Invalid(format!(
            "grant stored under {granter}/{grantee} names {}/{}",
            grant.granter, grant.grantee
        )));
    }
    Ok(grant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockInfo, Expiration};
    use chrono::{TimeZone, Utc};
    use storage::SqliteStore;

    struct Fixture {
        keeper: Keeper,
        ctx: Context<SqliteStore>,
        addr: Address,
        addr2: Address,
        addr3: Address,
        addr4: Address,
    }

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    fn coins(s: &str) -> Coins {
        s.parse().unwrap()
    }

    fn setup() -> Fixture {
        let store = SqliteStore::in_memory().unwrap();
        Fixture {
            keeper: Keeper::new(),
            ctx: Context::new(store, BlockInfo::at_height(1)),
            addr: addr("a6f22a0bfd03e18d97a4c1c37b82fb446ce85720"),
            addr2: addr("1c8cedbc6e4f3f6c43ef0269f5ab4e308841a0d4"),
            addr3: addr("058b15d64f2104840417b5009376e6ec3a1a1c33"),
            addr4: addr("0941b578f6f524ee08f6f23eecb3d0f8a08b8b7e"),
        }
    }

    fn grant(f: &mut Fixture, granter: Address, grantee: Address, allowance: &Allowance) {
        let grant = FeeAllowanceGrant::new(granter, grantee, allowance.clone());
        f.keeper.grant_fee_allowance(&mut f.ctx, &grant).unwrap();
    }

    fn grants_of(f: &Fixture, grantee: Address) -> Vec<FeeAllowanceGrant> {
        let mut grants = Vec::new();
        f.keeper
            .iterate_all_grantee_fee_allowances(&f.ctx, &grantee, |grant| {
                grants.push(grant);
                false
            })
            .unwrap();
        grants
    }

    #[test]
    fn test_keeper_crud() {
        let mut f = setup();
        let basic = Allowance::basic(coins("555atom"), Expiration::at_height(334455));
        let basic2 = Allowance::basic(coins("123eth"), Expiration::at_height(172436));
        let (a1, a2, a3, a4) = (f.addr, f.addr2, f.addr3, f.addr4);

        grant(&mut f, a1, a2, &basic);
        grant(&mut f, a1, a3, &basic2);
        grant(&mut f, a2, a3, &basic);
        grant(&mut f, a2, a4, &basic);
        grant(&mut f, a4, a1, &basic2);

        f.keeper.revoke_fee_allowance(&mut f.ctx, &a1, &a2).unwrap();
        f.keeper.revoke_fee_allowance(&mut f.ctx, &a1, &a3).unwrap();
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a3).unwrap(), None);

        grant(&mut f, a1, a3, &basic);
        grant(&mut f, a2, a3, &basic2);

        // revoked
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(), None);
        // revoked and added back
        assert_eq!(
            f.keeper.get_fee_allowance(&f.ctx, &a1, &a3).unwrap(),
            Some(basic.clone())
        );
        // never there
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a4).unwrap(), None);
        // overwritten
        assert_eq!(
            f.keeper.get_fee_allowance(&f.ctx, &a2, &a3).unwrap(),
            Some(basic2.clone())
        );

        assert!(grants_of(&f, a2).is_empty());
        assert_eq!(
            grants_of(&f, a1),
            vec![FeeAllowanceGrant::new(a4, a1, basic2.clone())]
        );
        // addr2 sorts before addr
        let expected = vec![
            FeeAllowanceGrant::new(a2, a3, basic2),
            FeeAllowanceGrant::new(a1, a3, basic),
        ];
        assert_eq!(grants_of(&f, a3), expected);
    }

    #[test]
    fn test_iteration_orders_by_granter_bytes() {
        let mut f = setup();
        let allowance = Allowance::basic(coins("10atom"), Expiration::at_height(100));
        let grantee = f.addr;
        let low = Address::new([0x01; 20]);
        let high = Address::new([0xfe; 20]);

        grant(&mut f, high, grantee, &allowance);
        grant(&mut f, low, grantee, &allowance);

        let granters: Vec<_> = grants_of(&f, grantee).into_iter().map(|g| g.granter).collect();
        assert_eq!(granters, vec![low, high]);
    }

    #[test]
    fn test_iteration_stops_early() {
        let mut f = setup();
        let allowance = Allowance::basic(coins("10atom"), Expiration::at_height(100));
        let (a1, a2, a3) = (f.addr, f.addr2, f.addr3);
        grant(&mut f, a2, a1, &allowance);
        grant(&mut f, a3, a1, &allowance);

        let mut seen = 0;
        f.keeper
            .iterate_all_grantee_fee_allowances(&f.ctx, &a1, |_| {
                seen += 1;
                true
            })
            .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_grant_rejects_self_grant() {
        let mut f = setup();
        let allowance = Allowance::basic(coins("10atom"), Expiration::at_height(100));
        let grant = FeeAllowanceGrant::new(f.addr, f.addr, allowance);
        let result = f.keeper.grant_fee_allowance(&mut f.ctx, &grant);
        assert!(matches!(result, Err(Error::Invalid(_))));
        assert!(f.ctx.store.is_empty().unwrap());
    }

    #[test]
    fn test_revoke_absent_is_noop() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        f.keeper.revoke_fee_allowance(&mut f.ctx, &a1, &a2).unwrap();
    }

    #[test]
    fn test_use_granted_fee() {
        let future = Allowance::basic(coins("555atom"), Expiration::at_height(5678));
        let expired = Allowance::basic(coins("123eth"), Expiration::at_height(55));
        let future_after_small = Allowance::basic(coins("554atom"), Expiration::at_height(5678));

        struct Case {
            name: &'static str,
            to_addr3: bool,
            fee: &'static str,
            allowed: bool,
            final_state: Option<Allowance>,
        }

        let cases = [
            Case {
                name: "use entire pot",
                to_addr3: false,
                fee: "555atom",
                allowed: true,
                final_state: None,
            },
            Case {
                name: "expired and removed",
                to_addr3: true,
                fee: "123eth",
                allowed: false,
                final_state: None,
            },
            Case {
                name: "too high",
                to_addr3: false,
                fee: "9999atom",
                allowed: false,
                final_state: Some(future.clone()),
            },
            Case {
                name: "use a little",
                to_addr3: false,
                fee: "1atom",
                allowed: true,
                final_state: Some(future_after_small),
            },
        ];

        for case in cases {
            let mut f = setup();
            f.ctx.block = BlockInfo::at_height(100);
            let (a1, a2, a3) = (f.addr, f.addr2, f.addr3);
            grant(&mut f, a1, a2, &future);
            grant(&mut f, a1, a3, &expired);

            let grantee = if case.to_addr3 { a3 } else { a2 };
            let result = f
                .keeper
                .use_granted_fees(&mut f.ctx, &a1, &grantee, &coins(case.fee));
            assert_eq!(result.is_ok(), case.allowed, "{}", case.name);

            let loaded = f.keeper.get_fee_allowance(&f.ctx, &a1, &grantee).unwrap();
            assert_eq!(loaded, case.final_state, "{}", case.name);
        }
    }

    #[test]
    fn test_exact_consumption_removes_record() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        let allowance = Allowance::basic(coins("555atom"), Expiration::at_height(334455));
        grant(&mut f, a1, a2, &allowance);
        f.ctx.block = BlockInfo::at_height(334454);

        f.keeper
            .use_granted_fees(&mut f.ctx, &a1, &a2, &coins("555atom"))
            .unwrap();
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(), None);
    }

    #[test]
    fn test_expiry_purges_then_not_found() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        let allowance = Allowance::basic(coins("555atom"), Expiration::at_height(10));
        grant(&mut f, a1, a2, &allowance);
        f.ctx.block = BlockInfo::at_height(10);

        let first = f.keeper.use_granted_fees(&mut f.ctx, &a1, &a2, &coins("1atom"));
        assert!(matches!(first, Err(Error::Expired)));
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(), None);

        let second = f.keeper.use_granted_fees(&mut f.ctx, &a1, &a2, &coins("1atom"));
        assert!(matches!(second, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_time_expiry_purges() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        let deadline = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let allowance = Allowance::basic(coins("50atom"), Expiration::at_time(deadline));
        grant(&mut f, a1, a2, &allowance);

        f.ctx.block = BlockInfo::new(7, deadline - chrono::Duration::hours(1));
        f.keeper
            .use_granted_fees(&mut f.ctx, &a1, &a2, &coins("5atom"))
            .unwrap();

        f.ctx.block = BlockInfo::new(8, deadline);
        let result = f.keeper.use_granted_fees(&mut f.ctx, &a1, &a2, &coins("5atom"));
        assert!(matches!(result, Err(Error::Expired)));
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(), None);
    }

    #[test]
    fn test_failed_use_is_repeatable() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        let allowance = Allowance::basic(coins("5atom"), Expiration::at_height(100));
        grant(&mut f, a1, a2, &allowance);

        for _ in 0..3 {
            let result = f.keeper.use_granted_fees(&mut f.ctx, &a1, &a2, &coins("6atom"));
            let err = result.unwrap_err();
            assert!(err.is_allowance_rejection());
            assert!(matches!(err, Error::InsufficientAllowance { .. }));
        }
        assert_eq!(
            f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(),
            Some(allowance)
        );
    }

    #[test]
    fn test_use_without_grant_is_not_found() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        let err = f
            .keeper
            .use_granted_fees(&mut f.ctx, &a1, &a2, &coins("1atom"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { granter, grantee } if granter == a1 && grantee == a2));
        assert!(f.ctx.store.is_empty().unwrap());
    }

    #[test]
    fn test_amount_above_u64_survives_store() {
        let mut f = setup();
        let (a1, a2) = (f.addr, f.addr2);
        let big = u64::MAX as u128 * 1000;
        let limit = Coins::from(crate::Coin::new(big, "atom"));
        let allowance = Allowance::basic(limit, Expiration::at_height(5678));
        grant(&mut f, a1, a2, &allowance);

        assert_eq!(
            f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(),
            Some(allowance)
        );

        f.keeper
            .use_granted_fees(&mut f.ctx, &a1, &a2, &coins("1atom"))
            .unwrap();
        let left = Allowance::basic(
            Coins::from(crate::Coin::new(big - 1, "atom")),
            Expiration::at_height(5678),
        );
        assert_eq!(f.keeper.get_fee_allowance(&f.ctx, &a1, &a2).unwrap(), Some(left));
    }

    #[test]
    fn test_use_rejects_mismatched_record() {
        let mut f = setup();
        let (a1, a2, a3) = (f.addr, f.addr2, f.addr3);
        let allowance = Allowance::basic(coins("5atom"), Expiration::at_height(100));
        let misplaced = FeeAllowanceGrant::new(a1, a3, allowance);
        let key = fee_allowance_key(&a1, &a2);
        let bytes = serde_json::to_vec(&misplaced).unwrap();
        f.ctx.store.set(&key, &bytes).unwrap();

        let result = f.keeper.use_granted_fees(&mut f.ctx, &a1, &a2, &coins("1atom"));
        assert!(matches!(result, Err(Error::Invalid(_))));
        assert!(matches!(
            f.keeper.get_fee_allowance(&f.ctx, &a1, &a2),
            Err(Error::Invalid(_))
        ));
        assert_eq!(f.ctx.store.get(&key).unwrap(), Some(bytes));
    }

    #[test]
    fn test_iterate_all_rejects_mismatched_record() {
        let mut f = setup();
        let (a1, a2, a3) = (f.addr, f.addr2, f.addr3);
        let allowance = Allowance::basic(coins("5atom"), Expiration::at_height(100));
        let misplaced = FeeAllowanceGrant::new(a1, a3, allowance);
        f.ctx
            .store
            .set(
                &fee_allowance_key(&a1, &a2),
                &serde_json::to_vec(&misplaced).unwrap(),
            )
            .unwrap();

        let result = f.keeper.iterate_all_fee_allowances(&f.ctx, |_| false);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }
}
