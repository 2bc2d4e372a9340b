//! Ordered list of song-change handlers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::error;

use crate::song::SongUpdate;

pub type Handler = Arc<dyn Fn(&SongUpdate) -> anyhow::Result<()> + Send + Sync>;

/// Token returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

#[derive(Default)]
pub struct Subscribers {
    registry: Mutex<Registry>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&SongUpdate) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.handlers.push((id, Arc::new(handler)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(|e| e.into_inner());
        let before = registry.handlers.len();
        registry.handlers.retain(|(handler_id, _)| *handler_id != id);
        registry.handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handlers
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every handler in subscription order.
    ///
    /// Handlers run outside the lock, so they may (un)subscribe. A handler
    /// that errors or panics is logged and skipped. Returns the number of
    /// handlers that failed.
    pub fn notify(&self, update: &SongUpdate) -> usize {
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .handlers
            .clone();

        let mut failed = 0;
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(update))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    error!("Subscriber {:?} failed: {:#}", id, e);
                }
                Err(_) => {
                    failed += 1;
                    error!("Subscriber {:?} panicked", id);
                }
            }
        }
        failed
    }
}
