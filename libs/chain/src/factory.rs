use alloy_primitives::{Address, TxHash, U256};
use keep_common::interfaces::bonded_ecdsa_keep_factory::IBondedECDSAKeepFactory;

use crate::context::ChainContext;
use crate::errors::ChainError;

/// Callable handle to the keep factory.
#[derive(Clone)]
pub struct FactoryContract {
    address: Address,
    context: ChainContext,
}

impl FactoryContract {
    pub fn resolve(context: &ChainContext, address: Address) -> Result<Self, ChainError> {
        if address == Address::ZERO {
            return Err(ChainError::Binding(
                "keep factory address is not set".to_string(),
            ));
        }
        Ok(Self {
            address,
            context: context.clone(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn register_member_candidate(
        &self,
        application: Address,
    ) -> Result<TxHash, ChainError> {
        let call = IBondedECDSAKeepFactory::registerMemberCandidateCall { application };
        self.context.submit(self.address, call, None).await
    }

    pub async fn update_operator_status(
        &self,
        operator: Address,
        application: Address,
    ) -> Result<TxHash, ChainError> {
        let call = IBondedECDSAKeepFactory::updateOperatorStatusCall {
            operator,
            application,
        };
        self.context.submit(self.address, call, None).await
    }

    pub async fn has_minimum_stake(&self, operator: Address) -> Result<bool, ChainError> {
        self.context
            .query(
                self.address,
                IBondedECDSAKeepFactory::hasMinimumStakeCall { operator },
            )
            .await
    }

    pub async fn balance_of(&self, operator: Address) -> Result<U256, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeepFactory::balanceOfCall { operator })
            .await
    }

    pub async fn is_operator_registered(
        &self,
        operator: Address,
        application: Address,
    ) -> Result<bool, ChainError> {
        self.context
            .query(
                self.address,
                IBondedECDSAKeepFactory::isOperatorRegisteredCall {
                    operator,
                    application,
                },
            )
            .await
    }

    pub async fn is_operator_eligible(
        &self,
        operator: Address,
        application: Address,
    ) -> Result<bool, ChainError> {
        self.context
            .query(
                self.address,
                IBondedECDSAKeepFactory::isOperatorEligibleCall {
                    operator,
                    application,
                },
            )
            .await
    }

    pub async fn is_operator_up_to_date(
        &self,
        operator: Address,
        application: Address,
    ) -> Result<bool, ChainError> {
        self.context
            .query(
                self.address,
                IBondedECDSAKeepFactory::isOperatorUpToDateCall {
                    operator,
                    application,
                },
            )
            .await
    }

    pub async fn keep_count(&self) -> Result<U256, ChainError> {
        self.context
            .query(self.address, IBondedECDSAKeepFactory::getKeepCountCall {})
            .await
    }

    pub async fn keep_at_index(&self, index: U256) -> Result<Address, ChainError> {
        self.context
            .query(
                self.address,
                IBondedECDSAKeepFactory::getKeepAtIndexCall { index },
            )
            .await
    }
}
