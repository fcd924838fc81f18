use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A fixed-width account address. Ordering is byte-wise.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            Error::Invalid(format!(
                "address must be {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| Error::Invalid(format!("address '{s}': {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let hex = "a6f22a0bfd03e18d97a4c1c37b82fb446ce85720";
        let addr: Address = hex.parse().unwrap();
        assert_eq!(addr.to_string(), hex);
        assert_eq!(hex.to_uppercase().parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_single_0x_prefix() {
        let hex = "a6f22a0bfd03e18d97a4c1c37b82fb446ce85720";
        assert!(format!("0x{hex}").parse::<Address>().is_ok());
        assert!(format!("0x0x{hex}").parse::<Address>().is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!("abcd".parse::<Address>().is_err());
        assert!(Address::from_slice(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let mut low = [0u8; ADDRESS_LEN];
        let mut high = [0u8; ADDRESS_LEN];
        low[0] = 0x01;
        high[0] = 0x02;
        assert!(Address::new(low) < Address::new(high));
    }

    #[test]
    fn test_serializes_as_hex_string() {
        let addr = Address::new([0xab; ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(ADDRESS_LEN)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
