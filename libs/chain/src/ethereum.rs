use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use async_trait::async_trait;
use keep_common::{KeepAddress, Signature};

use crate::context::ChainContext;
use crate::errors::ChainError;
use crate::events::{
    ConflictingPublicKeySubmittedEvent, EventWatcher, KeepClosedEvent, KeepCreatedEvent,
    KeepEvent, KeepTerminatedEvent, PublicKeyPublishedEvent, SignatureRequestedEvent,
    Subscription,
};
use crate::factory::FactoryContract;
use crate::keep::KeepContract;
use crate::ledger::Ledger;
use crate::retry::RetryPolicy;
use crate::submitter::TransactionSubmitter;

/// Callback invoked for each delivered event.
pub type EventHandler<E> = Box<dyn Fn(E) + Send + Sync + 'static>;

/// Everything the keep orchestration needs from the chain.
#[async_trait]
pub trait ChainHandle: Send + Sync {
    /// Operator account.
    fn address(&self) -> Address;

    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn register_as_member_candidate(&self, application: Address)
        -> Result<TxHash, ChainError>;

    async fn on_bonded_ecdsa_keep_created(
        &self,
        handler: EventHandler<KeepCreatedEvent>,
    ) -> Result<Subscription, ChainError>;

    async fn on_keep_closed(
        &self,
        keep: KeepAddress,
        handler: EventHandler<KeepClosedEvent>,
    ) -> Result<Subscription, ChainError>;

    async fn on_keep_terminated(
        &self,
        keep: KeepAddress,
        handler: EventHandler<KeepTerminatedEvent>,
    ) -> Result<Subscription, ChainError>;

    async fn on_public_key_published(
        &self,
        keep: KeepAddress,
        handler: EventHandler<PublicKeyPublishedEvent>,
    ) -> Result<Subscription, ChainError>;

    async fn on_conflicting_public_key_submitted(
        &self,
        keep: KeepAddress,
        handler: EventHandler<ConflictingPublicKeySubmittedEvent>,
    ) -> Result<Subscription, ChainError>;

    async fn on_signature_requested(
        &self,
        keep: KeepAddress,
        handler: EventHandler<SignatureRequestedEvent>,
    ) -> Result<Subscription, ChainError>;

    async fn submit_keep_public_key(
        &self,
        keep: KeepAddress,
        public_key: [u8; 64],
    ) -> Result<TxHash, ChainError>;

    async fn submit_signature(
        &self,
        keep: KeepAddress,
        signature: &Signature,
    ) -> Result<TxHash, ChainError>;

    async fn is_awaiting_signature(
        &self,
        keep: KeepAddress,
        digest: B256,
    ) -> Result<bool, ChainError>;

    async fn is_active(&self, keep: KeepAddress) -> Result<bool, ChainError>;

    async fn has_minimum_stake(&self, address: Address) -> Result<bool, ChainError>;

    async fn balance_of(&self, address: Address) -> Result<U256, ChainError>;

    async fn is_registered_for_application(&self, application: Address)
        -> Result<bool, ChainError>;

    async fn is_eligible_for_application(&self, application: Address) -> Result<bool, ChainError>;

    async fn is_status_up_to_date_for_application(
        &self,
        application: Address,
    ) -> Result<bool, ChainError>;

    async fn update_status_for_application(
        &self,
        application: Address,
    ) -> Result<TxHash, ChainError>;

    async fn get_keep_count(&self) -> Result<U256, ChainError>;

    async fn get_keep_at_index(&self, index: U256) -> Result<Address, ChainError>;

    /// Digest of the keep's most recent signing request.
    async fn latest_digest(&self, keep: KeepAddress) -> Result<B256, ChainError>;

    async fn get_public_key(&self, keep: KeepAddress) -> Result<Bytes, ChainError>;

    async fn get_members(&self, keep: KeepAddress) -> Result<Vec<Address>, ChainError>;

    async fn has_key_generation_timed_out(&self, keep: KeepAddress) -> Result<bool, ChainError>;
}

/// [`ChainHandle`] over an Ethereum ledger.
pub struct EthereumChain {
    context: ChainContext,
    factory_address: Address,
    submitter: TransactionSubmitter,
    watcher: EventWatcher,
}

impl EthereumChain {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        factory_address: Address,
        poll_interval: Duration,
    ) -> Result<Self, ChainError> {
        let context = ChainContext::new(ledger);
        FactoryContract::resolve(&context, factory_address)?;

        Ok(Self {
            submitter: TransactionSubmitter::new(context.clone(), factory_address),
            watcher: EventWatcher::new(context.clone(), poll_interval),
            context,
            factory_address,
        })
    }

    pub fn with_public_key_retry(mut self, policy: RetryPolicy) -> Self {
        self.submitter = self.submitter.with_public_key_retry(policy);
        self
    }

    pub fn context(&self) -> &ChainContext {
        &self.context
    }

    pub fn watcher(&self) -> &EventWatcher {
        &self.watcher
    }

    pub fn factory_address(&self) -> Address {
        self.factory_address
    }

    fn keep(&self, keep: KeepAddress) -> Result<KeepContract, ChainError> {
        KeepContract::resolve(&self.context, keep)
    }

    fn factory(&self) -> Result<FactoryContract, ChainError> {
        FactoryContract::resolve(&self.context, self.factory_address)
    }

    async fn watch_keep<E: KeepEvent>(
        &self,
        keep: KeepAddress,
        handler: EventHandler<E>,
    ) -> Result<Subscription, ChainError> {
        let contract = self.keep(keep)?;
        self.watcher
            .watch(
                contract.address(),
                handler,
                ChainError::in_subscription(E::CATEGORY),
            )
            .await
    }

    async fn keep_query<T, F, Fut>(
        &self,
        keep: KeepAddress,
        call: &'static str,
        query: F,
    ) -> Result<T, ChainError>
    where
        F: FnOnce(KeepContract) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ChainError>> + Send,
    {
        let result = match self.keep(keep) {
            Ok(contract) => query(contract).await,
            Err(e) => Err(e),
        };
        result.map_err(ChainError::within(call))
    }

    async fn factory_query<T, F, Fut>(&self, call: &'static str, query: F) -> Result<T, ChainError>
    where
        F: FnOnce(FactoryContract) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ChainError>> + Send,
    {
        let result = match self.factory() {
            Ok(factory) => query(factory).await,
            Err(e) => Err(e),
        };
        result.map_err(ChainError::within(call))
    }
}

#[async_trait]
impl ChainHandle for EthereumChain {
    fn address(&self) -> Address {
        self.context.account()
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.context.ledger().block_number().await
    }

    async fn register_as_member_candidate(
        &self,
        application: Address,
    ) -> Result<TxHash, ChainError> {
        self.submitter.register_member_candidate(application).await
    }

    async fn on_bonded_ecdsa_keep_created(
        &self,
        handler: EventHandler<KeepCreatedEvent>,
    ) -> Result<Subscription, ChainError> {
        self.watcher
            .watch(
                self.factory_address,
                handler,
                ChainError::in_subscription(KeepCreatedEvent::CATEGORY),
            )
            .await
    }

    async fn on_keep_closed(
        &self,
        keep: KeepAddress,
        handler: EventHandler<KeepClosedEvent>,
    ) -> Result<Subscription, ChainError> {
        self.watch_keep(keep, handler).await
    }

    async fn on_keep_terminated(
        &self,
        keep: KeepAddress,
        handler: EventHandler<KeepTerminatedEvent>,
    ) -> Result<Subscription, ChainError> {
        self.watch_keep(keep, handler).await
    }

    async fn on_public_key_published(
        &self,
        keep: KeepAddress,
        handler: EventHandler<PublicKeyPublishedEvent>,
    ) -> Result<Subscription, ChainError> {
        self.watch_keep(keep, handler).await
    }

    async fn on_conflicting_public_key_submitted(
        &self,
        keep: KeepAddress,
        handler: EventHandler<ConflictingPublicKeySubmittedEvent>,
    ) -> Result<Subscription, ChainError> {
        self.watch_keep(keep, handler).await
    }

    async fn on_signature_requested(
        &self,
        keep: KeepAddress,
        handler: EventHandler<SignatureRequestedEvent>,
    ) -> Result<Subscription, ChainError> {
        self.watch_keep(keep, handler).await
    }

    async fn submit_keep_public_key(
        &self,
        keep: KeepAddress,
        public_key: [u8; 64],
    ) -> Result<TxHash, ChainError> {
        self.submitter.submit_public_key(keep, public_key).await
    }

    async fn submit_signature(
        &self,
        keep: KeepAddress,
        signature: &Signature,
    ) -> Result<TxHash, ChainError> {
        self.submitter.submit_signature(keep, signature).await
    }

    async fn is_awaiting_signature(
        &self,
        keep: KeepAddress,
        digest: B256,
    ) -> Result<bool, ChainError> {
        self.keep_query(keep, "isAwaitingSignature", |contract| async move {
            contract.is_awaiting_signature(digest).await
        })
        .await
    }

    async fn is_active(&self, keep: KeepAddress) -> Result<bool, ChainError> {
        self.keep_query(keep, "isActive", |contract| async move {
            contract.is_active().await
        })
        .await
    }

    async fn has_minimum_stake(&self, address: Address) -> Result<bool, ChainError> {
        self.factory_query("hasMinimumStake", |factory| async move {
            factory.has_minimum_stake(address).await
        })
        .await
    }

    async fn balance_of(&self, address: Address) -> Result<U256, ChainError> {
        self.factory_query("balanceOf", |factory| async move {
            factory.balance_of(address).await
        })
        .await
    }

    async fn is_registered_for_application(
        &self,
        application: Address,
    ) -> Result<bool, ChainError> {
        let operator = self.address();
        self.factory_query("isOperatorRegistered", |factory| async move {
            factory.is_operator_registered(operator, application).await
        })
        .await
    }

    async fn is_eligible_for_application(&self, application: Address) -> Result<bool, ChainError> {
        let operator = self.address();
        self.factory_query("isOperatorEligible", |factory| async move {
            factory.is_operator_eligible(operator, application).await
        })
        .await
    }

    async fn is_status_up_to_date_for_application(
        &self,
        application: Address,
    ) -> Result<bool, ChainError> {
        let operator = self.address();
        self.factory_query("isOperatorUpToDate", |factory| async move {
            factory.is_operator_up_to_date(operator, application).await
        })
        .await
    }

    async fn update_status_for_application(
        &self,
        application: Address,
    ) -> Result<TxHash, ChainError> {
        self.submitter
            .update_operator_status_for_application(application)
            .await
    }

    async fn get_keep_count(&self) -> Result<U256, ChainError> {
        self.factory_query("getKeepCount", |factory| async move {
            factory.keep_count().await
        })
        .await
    }

    async fn get_keep_at_index(&self, index: U256) -> Result<Address, ChainError> {
        self.factory_query("getKeepAtIndex", |factory| async move {
            factory.keep_at_index(index).await
        })
        .await
    }

    async fn latest_digest(&self, keep: KeepAddress) -> Result<B256, ChainError> {
        self.keep_query(keep, "digest", |contract| async move {
            contract.digest().await
        })
        .await
    }

    async fn get_public_key(&self, keep: KeepAddress) -> Result<Bytes, ChainError> {
        self.keep_query(keep, "getPublicKey", |contract| async move {
            contract.public_key().await
        })
        .await
    }

    async fn get_members(&self, keep: KeepAddress) -> Result<Vec<Address>, ChainError> {
        self.keep_query(keep, "getMembers", |contract| async move {
            contract.members().await
        })
        .await
    }

    async fn has_key_generation_timed_out(&self, keep: KeepAddress) -> Result<bool, ChainError> {
        self.keep_query(keep, "hasKeyGenerationTimedOut", |contract| async move {
            contract.has_key_generation_timed_out().await
        })
        .await
    }
}
