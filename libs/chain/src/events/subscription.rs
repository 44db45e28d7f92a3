use std::cell::Cell;
use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::ReentrantMutex;
use tokio_util::sync::CancellationToken;

use super::types::EventCategory;

thread_local! {
    /// Number of handlers running on this thread.
    static HANDLERS_RUNNING: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as running a handler until dropped.
struct HandlerScope(());

impl HandlerScope {
    fn enter() -> Self {
        HANDLERS_RUNNING.with(|running| running.set(running.get() + 1));
        Self(())
    }

    fn is_active() -> bool {
        HANDLERS_RUNNING.with(|running| running.get() > 0)
    }
}

impl Drop for HandlerScope {
    fn drop(&mut self) {
        HANDLERS_RUNNING.with(|running| running.set(running.get().saturating_sub(1)));
    }
}

/// Serializes handler invocations against cancellation.
///
/// A handler runs only while the gate is held and the token is live;
/// closing takes the same lock, so once `close` returns no handler is
/// running or will run. The lock is reentrant so a handler may cancel its
/// own subscription.
///
/// A close issued from inside any handler only cancels the token: that
/// handler may hold another gate, and two handlers closing each other's
/// gates would otherwise wait on each other forever. The target then
/// delivers nothing new, though an invocation already running on another
/// thread finishes.
pub(crate) struct DeliveryGate {
    token: CancellationToken,
    lock: ReentrantMutex<()>,
}

impl DeliveryGate {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            lock: ReentrantMutex::new(()),
        }
    }

    /// Runs `deliver` unless the gate is closed.
    pub(crate) fn deliver<T>(&self, deliver: impl FnOnce() -> T) -> Option<T> {
        let _held = self.lock.lock();
        if self.token.is_cancelled() {
            return None;
        }
        let _scope = HandlerScope::enter();
        Some(deliver())
    }

    pub(crate) fn close(&self) {
        if HandlerScope::is_active() {
            self.token.cancel();
            return;
        }
        let _held = self.lock.lock();
        self.token.cancel();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) async fn closed(&self) {
        self.token.cancelled().await
    }
}

/// Live registration of one event handler.
///
/// Delivery continues until [`Subscription::cancel`] is called or the
/// watcher that created it shuts down; dropping the handle does not stop it.
#[must_use = "dropping a subscription leaves its handler registered"]
pub struct Subscription {
    category: EventCategory,
    address: Address,
    gate: Arc<DeliveryGate>,
}

impl Subscription {
    pub(crate) fn new(category: EventCategory, address: Address, gate: Arc<DeliveryGate>) -> Self {
        Self {
            category,
            address,
            gate,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Contract the subscription watches.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Stops delivery. Idempotent; after it returns the handler is never
    /// invoked again.
    ///
    /// Called from outside any handler, it also waits for a running
    /// invocation to finish.
    pub fn cancel(&self) {
        let was_live = !self.gate.is_closed();
        // close even when already cancelled by shutdown, to wait out an in-flight handler
        self.gate.close();
        if !was_live {
            return;
        }
        tracing::debug!(
            category = %self.category,
            address = %self.address,
            "Subscription cancelled"
        );
    }

    pub fn is_cancelled(&self) -> bool {
        self.gate.is_closed()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("category", &self.category)
            .field("address", &self.address)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
