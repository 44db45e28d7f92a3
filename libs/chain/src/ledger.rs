//! Seam between the chain layer and the node it talks to.
//!
//! Everything above this module speaks in ABI-encoded calls and decoded logs;
//! [`AlloyLedger`] turns those into JSON-RPC requests through an alloy
//! provider, and [`crate::simulated::SimulatedLedger`] serves them from memory.

use alloy::providers::Provider;
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy_primitives::{Address, Bytes, Log as PrimitiveLog, TxHash, B256};
use async_trait::async_trait;

use crate::errors::ChainError;

/// Log filter: one emitting contract, one event signature, an inclusive block range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event_signature: B256,
    pub from_block: u64,
    pub to_block: u64,
}

/// A log together with its position on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedLog {
    pub inner: PrimitiveLog,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: TxHash,
}

/// State-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCall {
    pub to: Address,
    pub input: Bytes,
    pub gas_limit: Option<u64>,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Account that signs every transaction sent through this ledger.
    fn account(&self) -> Address;

    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<ObservedLog>, ChainError>;

    /// Executes a read-only call and returns the raw return data.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError>;

    /// Assigns the account's next pending nonce and broadcasts the call.
    ///
    /// Nonce assignment is not atomic with broadcast; callers serialize
    /// submissions through [`crate::ChainContext`].
    async fn transact(&self, call: TransactionCall) -> Result<TxHash, ChainError>;
}

fn rpc_error(e: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(e.to_string())
}

/// Ledger backed by an alloy provider with a wallet attached.
pub struct AlloyLedger<P> {
    provider: P,
    account: Address,
}

impl<P: Provider> AlloyLedger<P> {
    pub fn new(provider: P, account: Address) -> Self {
        Self { provider, account }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    async fn fresh_nonce(&self) -> Result<u64, ChainError> {
        self.provider
            .get_transaction_count(self.account)
            .pending()
            .await
            .map_err(rpc_error)
    }
}

#[async_trait]
impl<P> Ledger for AlloyLedger<P>
where
    P: Provider + Send + Sync + 'static,
{
    fn account(&self) -> Address {
        self.account
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(rpc_error)
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<ObservedLog>, ChainError> {
        let filter = Filter::new()
            .address(query.address)
            .event_signature(query.event_signature)
            .from_block(query.from_block)
            .to_block(query.to_block);

        let logs = self.provider.get_logs(&filter).await.map_err(rpc_error)?;

        logs.into_iter()
            .map(|log| {
                let block_number = log.block_number.ok_or_else(|| {
                    ChainError::Rpc("node returned a log without a block number".to_string())
                })?;
                Ok(ObservedLog {
                    block_number,
                    log_index: log.log_index.unwrap_or_default(),
                    transaction_hash: log.transaction_hash.unwrap_or_default(),
                    inner: log.inner,
                })
            })
            .collect()
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default()
            .from(self.account)
            .to(to)
            .input(input.into());

        self.provider.call(tx).await.map_err(rpc_error)
    }

    async fn transact(&self, call: TransactionCall) -> Result<TxHash, ChainError> {
        let nonce = self.fresh_nonce().await?;

        let mut tx = TransactionRequest::default()
            .from(self.account)
            .to(call.to)
            .input(call.input.into())
            .nonce(nonce);
        if let Some(gas_limit) = call.gas_limit {
            tx = tx.gas_limit(gas_limit);
        }

        let pending = self.provider.send_transaction(tx).await.map_err(rpc_error)?;
        let tx_hash = *pending.tx_hash();

        tracing::debug!(tx_hash = %tx_hash, nonce, to = %call.to, "Transaction broadcast");
        Ok(tx_hash)
    }
}
