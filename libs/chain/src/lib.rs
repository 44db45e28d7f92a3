//! Ethereum coordination layer for keep tECDSA clients.
//!
//! Turns keep and factory contract logs into typed events, submits the
//! results of off-chain signing back to the contracts with bounded retries,
//! and exposes both behind [`ChainHandle`].

mod context;
mod errors;
mod ethereum;
mod factory;
mod keep;
mod retry;
mod submitter;

pub mod events;
pub mod ledger;
pub mod simulated;

pub use context::ChainContext;
pub use errors::ChainError;
pub use ethereum::{ChainHandle, EthereumChain, EventHandler};
pub use events::{EventWatcher, Subscription};
pub use factory::FactoryContract;
pub use keep::KeepContract;
pub use ledger::{AlloyLedger, Ledger};
pub use retry::{with_retry, RetryPolicy};
pub use submitter::{TransactionSubmitter, PUBLIC_KEY_SUBMISSION_GAS_LIMIT};
