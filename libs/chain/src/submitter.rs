use alloy_primitives::{Address, TxHash, B256};
use keep_common::byteutils::bytes_to_32_byte;
use keep_common::{KeepAddress, Signature};

use crate::context::ChainContext;
use crate::errors::ChainError;
use crate::factory::FactoryContract;
use crate::keep::KeepContract;
use crate::retry::RetryPolicy;

/// Gas allowance for public key publication; enough for a group of 16 members.
pub const PUBLIC_KEY_SUBMISSION_GAS_LIMIT: u64 = 3_000_000;

/// Submits state-changing calls on behalf of the operator account.
#[derive(Clone)]
pub struct TransactionSubmitter {
    context: ChainContext,
    factory_address: Address,
    public_key_retry: RetryPolicy,
}

impl TransactionSubmitter {
    pub fn new(context: ChainContext, factory_address: Address) -> Self {
        Self {
            context,
            factory_address,
            public_key_retry: RetryPolicy::PUBLIC_KEY_SUBMISSION,
        }
    }

    pub fn with_public_key_retry(mut self, policy: RetryPolicy) -> Self {
        self.public_key_retry = policy;
        self
    }

    /// Registers the operator as a member candidate for `application`.
    /// Single attempt.
    pub async fn register_member_candidate(
        &self,
        application: Address,
    ) -> Result<TxHash, ChainError> {
        let result: Result<TxHash, ChainError> = async {
            let factory = FactoryContract::resolve(&self.context, self.factory_address)?;
            factory.register_member_candidate(application).await
        }
        .await;

        let tx_hash = result.map_err(ChainError::within("registerMemberCandidate"))?;
        tracing::debug!(
            tx_hash = %tx_hash,
            application = %application,
            "Submitted registerMemberCandidate transaction"
        );
        Ok(tx_hash)
    }

    /// Publishes the keep's public key, retrying transient failures.
    pub async fn submit_public_key(
        &self,
        keep: KeepAddress,
        public_key: [u8; 64],
    ) -> Result<TxHash, ChainError> {
        let contract = KeepContract::resolve(&self.context, keep)
            .map_err(ChainError::within("submitPublicKey"))?;

        let contract = &contract;
        let public_key = &public_key;
        let tx_hash = self
            .public_key_retry
            .run("submitPublicKey", move || {
                contract.submit_public_key(public_key, PUBLIC_KEY_SUBMISSION_GAS_LIMIT)
            })
            .await
            .map_err(ChainError::within("submitPublicKey"))?;

        tracing::debug!(tx_hash = %tx_hash, keep = %keep, "Submitted submitPublicKey transaction");
        Ok(tx_hash)
    }

    /// Submits the keep's signature. Single attempt.
    pub async fn submit_signature(
        &self,
        keep: KeepAddress,
        signature: &Signature,
    ) -> Result<TxHash, ChainError> {
        let result: Result<TxHash, ChainError> = async {
            let contract = KeepContract::resolve(&self.context, keep)?;
            let r = B256::from(bytes_to_32_byte(signature.r())?);
            let s = B256::from(bytes_to_32_byte(signature.s())?);
            contract
                .submit_signature(r, s, signature.recovery_id())
                .await
        }
        .await;

        let tx_hash = result.map_err(ChainError::within("submitSignature"))?;
        tracing::debug!(tx_hash = %tx_hash, keep = %keep, "Submitted submitSignature transaction");
        Ok(tx_hash)
    }

    /// Refreshes the operator's status in the application's sortition pool.
    /// Single attempt.
    pub async fn update_operator_status_for_application(
        &self,
        application: Address,
    ) -> Result<TxHash, ChainError> {
        let result: Result<TxHash, ChainError> = async {
            let factory = FactoryContract::resolve(&self.context, self.factory_address)?;
            factory
                .update_operator_status(self.context.account(), application)
                .await
        }
        .await;

        let tx_hash = result.map_err(ChainError::within("updateOperatorStatus"))?;
        tracing::debug!(
            tx_hash = %tx_hash,
            application = %application,
            "Submitted updateOperatorStatus transaction"
        );
        Ok(tx_hash)
    }
}
