//! In-memory ledger for tests and local runs.
//!
//! Mines logs on demand, answers view calls from canned return data and
//! accepts transactions like a node would: the pending nonce is read when a
//! submission starts and must still be free when it lands, so overlapping
//! submissions surface as `nonce too low` rejections. Failures can be
//! scripted per request kind.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use alloy_primitives::{keccak256, Address, Bytes, Log as PrimitiveLog, LogData, TxHash};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::errors::ChainError;
use crate::ledger::{Ledger, LogQuery, ObservedLog, TransactionCall};

/// One call to [`Ledger::transact`], successful or not.
#[derive(Debug, Clone)]
pub struct TransactionAttempt {
    pub call: TransactionCall,
    pub started_at: Instant,
    pub finished_at: Instant,
    pub result: Result<SubmittedTransaction, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: TxHash,
    pub nonce: u64,
}

#[derive(Default)]
struct State {
    block_number: u64,
    logs: Vec<ObservedLog>,
    next_nonce: u64,
    attempts: Vec<TransactionAttempt>,
    in_flight: usize,
    max_in_flight: usize,
    call_results: HashMap<[u8; 4], Bytes>,
    calls: Vec<(Address, Bytes)>,
    transaction_failures: VecDeque<ChainError>,
    block_number_failures: VecDeque<ChainError>,
    log_failures: VecDeque<ChainError>,
    call_failures: VecDeque<ChainError>,
}

pub struct SimulatedLedger {
    account: Address,
    transaction_latency: Duration,
    state: Mutex<State>,
}

impl SimulatedLedger {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            transaction_latency: Duration::ZERO,
            state: Mutex::new(State::default()),
        }
    }

    /// Time between reading the pending nonce and the transaction landing.
    pub fn with_transaction_latency(mut self, latency: Duration) -> Self {
        self.transaction_latency = latency;
        self
    }

    /// Mines a block holding `logs` in the given order. Returns its number.
    pub fn mine_block(&self, logs: Vec<(Address, LogData)>) -> u64 {
        let mut state = self.state.lock();
        state.block_number += 1;
        let block_number = state.block_number;

        for (log_index, (address, data)) in logs.into_iter().enumerate() {
            let transaction_hash = keccak256(
                [
                    block_number.to_be_bytes().as_slice(),
                    (log_index as u64).to_be_bytes().as_slice(),
                ]
                .concat(),
            );
            state.logs.push(ObservedLog {
                inner: PrimitiveLog { address, data },
                block_number,
                log_index: log_index as u64,
                transaction_hash,
            });
        }
        block_number
    }

    /// Mines a block with a single log.
    pub fn emit(&self, address: Address, data: LogData) -> u64 {
        self.mine_block(vec![(address, data)])
    }

    pub fn advance_blocks(&self, count: u64) -> u64 {
        let mut state = self.state.lock();
        state.block_number += count;
        state.block_number
    }

    /// Return data for view calls with the given selector.
    pub fn set_call_result(&self, selector: [u8; 4], output: impl Into<Bytes>) {
        self.state.lock().call_results.insert(selector, output.into());
    }

    pub fn fail_next_transactions(&self, count: usize, message: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state
                .transaction_failures
                .push_back(ChainError::Rpc(message.to_string()));
        }
    }

    pub fn fail_next_block_number_queries(&self, count: usize, message: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state
                .block_number_failures
                .push_back(ChainError::Rpc(message.to_string()));
        }
    }

    pub fn fail_next_log_queries(&self, count: usize, message: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state
                .log_failures
                .push_back(ChainError::Rpc(message.to_string()));
        }
    }

    pub fn fail_next_calls(&self, count: usize, message: &str) {
        let mut state = self.state.lock();
        for _ in 0..count {
            state
                .call_failures
                .push_back(ChainError::Rpc(message.to_string()));
        }
    }

    pub fn attempts(&self) -> Vec<TransactionAttempt> {
        self.state.lock().attempts.clone()
    }

    /// Transactions that landed, in nonce order.
    pub fn transactions(&self) -> Vec<(TransactionCall, SubmittedTransaction)> {
        self.state
            .lock()
            .attempts
            .iter()
            .filter_map(|attempt| {
                attempt
                    .result
                    .as_ref()
                    .ok()
                    .map(|tx| (attempt.call.clone(), tx.clone()))
            })
            .collect()
    }

    /// Highest number of submissions that held a pending nonce at once.
    pub fn max_concurrent_submissions(&self) -> usize {
        self.state.lock().max_in_flight
    }

    /// View calls received, in order.
    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        self.state.lock().calls.clone()
    }

    fn finish_attempt(
        &self,
        call: TransactionCall,
        started_at: Instant,
        pending_nonce: u64,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.state.lock();
        state.in_flight -= 1;

        let result = if pending_nonce == state.next_nonce {
            state.next_nonce += 1;
            let hash = keccak256(
                [
                    self.account.as_slice(),
                    pending_nonce.to_be_bytes().as_slice(),
                    call.input.as_ref(),
                ]
                .concat(),
            );
            Ok(SubmittedTransaction {
                hash,
                nonce: pending_nonce,
            })
        } else {
            Err(ChainError::Rpc(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                state.next_nonce, pending_nonce
            )))
        };

        state.attempts.push(TransactionAttempt {
            call,
            started_at,
            finished_at: Instant::now(),
            result: result.clone().map_err(|e| e.to_string()),
        });
        result.map(|tx| tx.hash)
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    fn account(&self) -> Address {
        self.account
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        let mut state = self.state.lock();
        match state.block_number_failures.pop_front() {
            Some(e) => Err(e),
            None => Ok(state.block_number),
        }
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<ObservedLog>, ChainError> {
        let mut state = self.state.lock();
        if let Some(e) = state.log_failures.pop_front() {
            return Err(e);
        }

        Ok(state
            .logs
            .iter()
            .filter(|log| {
                log.inner.address == query.address
                    && log.inner.data.topics().first() == Some(&query.event_signature)
                    && (query.from_block..=query.to_block).contains(&log.block_number)
            })
            .cloned()
            .collect())
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        let mut state = self.state.lock();
        state.calls.push((to, input.clone()));
        if let Some(e) = state.call_failures.pop_front() {
            return Err(e);
        }

        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Rpc("execution reverted: missing selector".to_string()))?;
        state
            .call_results
            .get(&selector)
            .cloned()
            .ok_or_else(|| ChainError::Rpc("execution reverted".to_string()))
    }

    async fn transact(&self, call: TransactionCall) -> Result<TxHash, ChainError> {
        let started_at = Instant::now();
        let pending_nonce = {
            let mut state = self.state.lock();
            if let Some(e) = state.transaction_failures.pop_front() {
                state.attempts.push(TransactionAttempt {
                    call,
                    started_at,
                    finished_at: started_at,
                    result: Err(e.to_string()),
                });
                return Err(e);
            }
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.next_nonce
        };

        if !self.transaction_latency.is_zero() {
            tokio::time::sleep(self.transaction_latency).await;
        }

        self.finish_attempt(call, started_at, pending_nonce)
    }
}
