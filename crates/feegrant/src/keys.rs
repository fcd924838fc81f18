//! Store key layout.
//!
//! `0x00 | grantee | granter`. Grouping by grantee first makes all of a
//! grantee's allowances one contiguous range, ordered by granter bytes.

use crate::address::{Address, ADDRESS_LEN};
use crate::{Error, Result};

pub const FEE_ALLOWANCE_PREFIX: u8 = 0x00;

pub fn fee_allowance_key(granter: &Address, grantee: &Address) -> Vec<u8> {
    let mut key = fee_allowance_prefix_by_grantee(grantee);
    key.extend_from_slice(granter.as_bytes());
    key
}

pub fn fee_allowance_prefix_by_grantee(grantee: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 2 * ADDRESS_LEN);
    key.push(FEE_ALLOWANCE_PREFIX);
    key.extend_from_slice(grantee.as_bytes());
    key
}

/// Split a full key back into `(granter, grantee)`.
pub fn parse_fee_allowance_key(key: &[u8]) -> Result<(Address, Address)> {
    match key.split_first() {
        Some((&FEE_ALLOWANCE_PREFIX, rest)) if rest.len() == 2 * ADDRESS_LEN => {
            let (grantee, granter) = rest.split_at(ADDRESS_LEN);
            Ok((Address::from_slice(granter)?, Address::from_slice(grantee)?))
        }
        _ => Err(Error::Invalid(format!(
            "malformed fee allowance key {}",
            hex::encode(key)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let granter = Address::new([1; ADDRESS_LEN]);
        let grantee = Address::new([2; ADDRESS_LEN]);
        let key = fee_allowance_key(&granter, &grantee);

        assert_eq!(key.len(), 1 + 2 * ADDRESS_LEN);
        assert_eq!(key[0], FEE_ALLOWANCE_PREFIX);
        assert_eq!(&key[1..21], grantee.as_bytes());
        assert_eq!(&key[21..], granter.as_bytes());
        assert!(key.starts_with(&fee_allowance_prefix_by_grantee(&grantee)));
        assert_eq!(parse_fee_allowance_key(&key).unwrap(), (granter, grantee));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_fee_allowance_key(&[]).is_err());
        assert!(parse_fee_allowance_key(&[0x01; 41]).is_err());
        assert!(parse_fee_allowance_key(&[0x00; 40]).is_err());
    }
}
