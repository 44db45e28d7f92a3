use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// On-chain address of a keep contract instance.
pub type KeepAddress = Address;

/// Identifier of one protocol participant.
///
/// Derived from the participant's account address. The same bytes are used
/// as the network routing key and as the party tag given to the TSS engine,
/// so two ids are equal exactly when their bytes are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(Vec<u8>);

impl MemberId {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interprets the id as an account address, if it has address width.
    pub fn to_address(&self) -> Option<Address> {
        (self.0.len() == 20).then(|| Address::from_slice(&self.0))
    }
}

impl From<Address> for MemberId {
    fn from(address: Address) -> Self {
        Self(address.to_vec())
    }
}

impl From<&Address> for MemberId {
    fn from(address: &Address) -> Self {
        Self(address.to_vec())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for MemberId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(digits).map(Self)
    }
}
