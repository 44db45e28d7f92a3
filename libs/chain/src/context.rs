use std::sync::Arc;

use alloy_primitives::{Address, TxHash};
use alloy_sol_types::SolCall;
use tokio::sync::Mutex;

use crate::errors::ChainError;
use crate::ledger::{Ledger, TransactionCall};

/// Shared state of one chain client: the ledger and the transaction guard.
///
/// Cloning is cheap; every clone serializes its submissions through the same
/// guard, so nonces for the account are assigned one submission at a time.
#[derive(Clone)]
pub struct ChainContext {
    ledger: Arc<dyn Ledger>,
    transaction_guard: Arc<Mutex<()>>,
}

impl ChainContext {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            transaction_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn account(&self) -> Address {
        self.ledger.account()
    }

    /// Runs a view call and decodes its return value.
    pub async fn query<C>(&self, to: Address, call: C) -> Result<C::Return, ChainError>
    where
        C: SolCall + Send,
    {
        let output = self.ledger.call(to, call.abi_encode().into()).await?;

        C::abi_decode_returns(&output).map_err(|e| {
            ChainError::Binding(format!(
                "cannot decode return data of {}: {}",
                C::SIGNATURE,
                e
            ))
        })
    }

    /// Submits a state-changing call while holding the transaction guard.
    pub async fn submit<C>(
        &self,
        to: Address,
        call: C,
        gas_limit: Option<u64>,
    ) -> Result<TxHash, ChainError>
    where
        C: SolCall + Send,
    {
        let request = TransactionCall {
            to,
            input: call.abi_encode().into(),
            gas_limit,
        };

        let _guard = self.transaction_guard.lock().await;
        self.ledger.transact(request).await
    }
}
