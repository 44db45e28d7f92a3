use std::fmt;

use alloy_primitives::U256;

/// Largest recovery id an ECDSA signature over secp256k1 can carry.
pub const MAX_RECOVERY_ID: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    InvalidRecoveryId(u8),
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::InvalidRecoveryId(id) => {
                write!(f, "invalid recovery id {} (expected 0..={})", id, MAX_RECOVERY_ID)
            }
        }
    }
}

impl std::error::Error for SignatureError {}

/// ECDSA signature produced by a keep's signing group.
///
/// `r` and `s` are unsigned big-endian magnitudes without a fixed width; the
/// submitter lays them out as 32-byte words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    r: Vec<u8>,
    s: Vec<u8>,
    recovery_id: u8,
}

impl Signature {
    pub fn new(
        r: impl Into<Vec<u8>>,
        s: impl Into<Vec<u8>>,
        recovery_id: u8,
    ) -> Result<Self, SignatureError> {
        if recovery_id > MAX_RECOVERY_ID {
            return Err(SignatureError::InvalidRecoveryId(recovery_id));
        }
        Ok(Self {
            r: r.into(),
            s: s.into(),
            recovery_id,
        })
    }

    /// Builds a signature from integer components.
    pub fn from_scalars(r: U256, s: U256, recovery_id: u8) -> Result<Self, SignatureError> {
        Self::new(
            trim_leading_zeros(&r.to_be_bytes::<32>()),
            trim_leading_zeros(&s.to_be_bytes::<32>()),
            recovery_id,
        )
    }

    pub fn r(&self) -> &[u8] {
        &self.r
    }

    pub fn s(&self) -> &[u8] {
        &self.s
    }

    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}
