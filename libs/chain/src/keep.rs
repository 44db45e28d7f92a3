use alloy_primitives::{Address, Bytes, TxHash, B256};
use keep_common::interfaces::bonded_ecdsa_keep::IBondedECDSAKeep;
use keep_common::KeepAddress;

use crate::context::ChainContext;
use crate::errors::ChainError;

/// Callable handle to one keep contract instance.
///
/// Handles are cheap and built per call; they share the context's
/// transaction guard with every other handle of the same client.
#[derive(Clone)]
pub struct KeepContract {
    address: KeepAddress,
    context: ChainContext,
}

impl KeepContract {
    pub fn resolve(context: &ChainContext, address: KeepAddress) -> Result<Self, ChainError> {
        if address == Address::ZERO {
            return Err(ChainError::Binding(format!(
                "failed to build keep contract handle for address [{}]",
                address
            )));
        }
        Ok(Self {
            address,
            context: context.clone(),
        })
    }

    pub fn address(&self) -> KeepAddress {
        self.address
    }

    pub async fn submit_public_key(
        &self,
        public_key: &[u8; 64],
        gas_limit: u64,
    ) -> Result<TxHash, ChainError> {
        let call = IBondedECDSAKeep::submitPublicKeyCall {
            public_key: Bytes::copy_from_slice(public_key),
        };
        self.context
            .submit(self.address, call, Some(gas_limit))
            .await
    }

    pub async fn submit_signature(
        &self,
        r: B256,
        s: B256,
        recovery_id: u8,
    ) -> Result<TxHash, ChainError> {
        let call = IBondedECDSAKeep::submitSignatureCall { r, s, recovery_id };
        self.context.submit(self.address, call, None).await
    }

    pub async fn is_awaiting_signature(&self, digest: B256) -> Result<bool, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeep::isAwaitingSignatureCall { digest })
            .await
    }

    pub async fn is_active(&self) -> Result<bool, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeep::isActiveCall {})
            .await
    }

    /// Digest of the most recent signing request.
    pub async fn digest(&self) -> Result<B256, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeep::digestCall {})
            .await
    }

    pub async fn public_key(&self) -> Result<Bytes, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeep::getPublicKeyCall {})
            .await
    }

    pub async fn members(&self) -> Result<Vec<Address>, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeep::getMembersCall {})
            .await
    }

    pub async fn has_key_generation_timed_out(&self) -> Result<bool, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeep::hasKeyGenerationTimedOutCall {})
            .await
    }
}
