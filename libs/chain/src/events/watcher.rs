use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::subscription::{DeliveryGate, Subscription};
use super::types::{EventCategory, KeepEvent};
use crate::context::ChainContext;
use crate::errors::ChainError;
use crate::ledger::{Ledger, LogQuery};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Blocks below the cursor queried again on every poll.
///
/// Load-balanced nodes may report a head whose logs another node has not
/// indexed yet; re-scanning picks those logs up once they appear.
pub const RESCAN_BLOCKS: u64 = 12;

type Handler<E> = Arc<dyn Fn(E) + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(ChainError) -> ChainError + Send + Sync>;

/// Watches contracts for keep events and delivers them to handlers.
///
/// Every [`Subscription`] gets its own polling task, so handlers of
/// different subscriptions run concurrently while each subscription sees
/// its logs in ledger order.
pub struct EventWatcher {
    context: ChainContext,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl EventWatcher {
    pub fn new(context: ChainContext, poll_interval: Duration) -> Self {
        Self {
            context,
            poll_interval,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Token cancelled once the watcher shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancels every subscription this watcher created.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down event watcher");
        self.shutdown.cancel();
    }

    /// Starts delivering `E` events emitted by `address` to `handler`.
    ///
    /// Only logs mined after this call are delivered. Errors hit by the
    /// stream later are passed to `error_handler`, and the error it returns
    /// is logged.
    pub async fn watch<E, H, EH>(
        &self,
        address: Address,
        handler: H,
        error_handler: EH,
    ) -> Result<Subscription, ChainError>
    where
        E: KeepEvent,
        H: Fn(E) + Send + Sync + 'static,
        EH: Fn(ChainError) -> ChainError + Send + Sync + 'static,
    {
        let category = E::CATEGORY;

        if address == Address::ZERO {
            return Err(ChainError::Binding(format!(
                "cannot watch {} events of the zero address",
                category
            )));
        }
        if self.shutdown.is_cancelled() {
            return Err(ChainError::Binding(format!(
                "cannot watch {} events: watcher is shut down",
                category
            )));
        }

        let start_block = self.context.ledger().block_number().await.map_err(|e| {
            ChainError::Binding(format!("failed to establish {} watch: {}", category, e))
        })?;

        let gate = Arc::new(DeliveryGate::new(self.shutdown.child_token()));
        let stream = WatchStream {
            ledger: self.context.ledger().clone(),
            category,
            address,
            start_block,
            last_block: start_block,
            delivered: BTreeSet::new(),
            poll_interval: self.poll_interval,
            handler: Arc::new(handler) as Handler<E>,
            error_handler: Arc::new(error_handler) as ErrorHandler,
            gate: gate.clone(),
        };
        tokio::spawn(stream.run());

        tracing::info!(
            category = %category,
            address = %address,
            from_block = start_block + 1,
            "📡 Subscribed to events"
        );
        Ok(Subscription::new(category, address, gate))
    }
}

impl Drop for EventWatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Polling loop of one subscription.
struct WatchStream<E> {
    ledger: Arc<dyn Ledger>,
    category: EventCategory,
    address: Address,
    /// Head at subscription time; nothing at or below it is delivered.
    start_block: u64,
    /// Highest head seen so far.
    last_block: u64,
    /// (block, log index) of logs already handled inside the re-scan window.
    delivered: BTreeSet<(u64, u64)>,
    poll_interval: Duration,
    handler: Handler<E>,
    error_handler: ErrorHandler,
    gate: Arc<DeliveryGate>,
}

impl<E: KeepEvent> WatchStream<E> {
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let gate = self.gate.clone();

        loop {
            tokio::select! {
                _ = gate.closed() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.poll().await {
                        self.report(e);
                    }
                }
            }
        }

        tracing::debug!(
            category = %self.category,
            address = %self.address,
            "Event stream stopped"
        );
    }

    async fn poll(&mut self) -> Result<(), ChainError> {
        let latest = self.ledger.block_number().await?;
        let from_block = self.last_block.saturating_sub(RESCAN_BLOCKS).max(self.start_block) + 1;
        let to_block = latest.max(self.last_block);
        if to_block < from_block {
            return Ok(());
        }

        let query = LogQuery {
            address: self.address,
            event_signature: self.category.signature_hash(),
            from_block,
            to_block,
        };
        let mut logs = self.ledger.logs(&query).await?;
        logs.sort_by_key(|log| (log.block_number, log.log_index));

        self.last_block = to_block;
        self.delivered = self.delivered.split_off(&(from_block, 0));
        logs.retain(|log| !self.delivered.contains(&(log.block_number, log.log_index)));

        if !logs.is_empty() {
            tracing::debug!(
                category = %self.category,
                address = %self.address,
                count = logs.len(),
                from_block,
                to_block,
                "Fetched logs"
            );
        }

        for log in logs {
            if self.gate.is_closed() {
                break;
            }
            // a log that fails to decode is reported once, not refetched
            self.delivered.insert((log.block_number, log.log_index));
            let event = match E::decode(&log) {
                Ok(event) => event,
                Err(e) => {
                    self.report(e);
                    continue;
                }
            };

            let handler = &self.handler;
            let outcome = self
                .gate
                .deliver(|| panic::catch_unwind(AssertUnwindSafe(|| handler(event))));
            match outcome {
                None => break,
                Some(Ok(())) => {}
                Some(Err(_)) => {
                    self.report(ChainError::HandlerPanicked(self.category));
                    self.gate.close();
                    break;
                }
            }
        }
        Ok(())
    }

    fn report(&self, error: ChainError) {
        if self.gate.is_closed() {
            return;
        }
        let wrapped = (self.error_handler)(error);
        tracing::error!(
            category = %self.category,
            address = %self.address,
            error = %wrapped,
            "❌ Event subscription error"
        );
    }
}
