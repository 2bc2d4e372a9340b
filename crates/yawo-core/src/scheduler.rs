//! Fixed-period tick loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::config::DEFAULT_POLL_INTERVAL;

type Callback = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// Stops a running [`Scheduler`]; cloneable so a signal handler can own one.
#[derive(Clone, Default)]
pub struct StopHandle {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl StopHandle {
    /// Stop the loop, waking it if it is between ticks.
    pub fn stop(&self) {
        let (stopped, wake) = &*self.state;
        *stopped.lock().unwrap_or_else(|e| e.into_inner()) = true;
        wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.state.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleep until `deadline`. Returns `true` if stopped first.
    fn sleep_until(&self, deadline: Instant) -> bool {
        let (stopped, wake) = &*self.state;
        let mut stopped = stopped.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if *stopped {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            stopped = match wake.wait_timeout(stopped, remaining) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
    }
}

/// Calls every registered callback once per period.
///
/// Ticks are scheduled against deadlines spaced `period` apart, so the time
/// spent in callbacks does not push later ticks back. A tick that overruns
/// its slot is followed immediately by the next one and the schedule
/// restarts from there, without a burst of catch-up ticks.
///
/// Callbacks run sequentially on the loop thread in registration order. A
/// callback that fails or panics is logged and the tick continues.
pub struct Scheduler {
    period: Duration,
    callbacks: Mutex<Vec<Callback>>,
    stop: StopHandle,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            callbacks: Mutex::new(Vec::new()),
            stop: StopHandle::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Register a callback; takes effect from the next tick.
    pub fn add<F>(&self, callback: F)
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Arc::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every callback once. Returns the number that failed.
    pub fn tick(&self) -> usize {
        let callbacks: Vec<Callback> = self
            .callbacks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let mut failed = 0;
        for (index, callback) in callbacks.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failed += 1;
                    error!("Scheduled callback #{} failed: {:#}", index, e);
                }
                Err(_) => {
                    failed += 1;
                    error!("Scheduled callback #{} panicked", index);
                }
            }
        }
        failed
    }

    /// Tick until stopped through a [`StopHandle`].
    ///
    /// The first tick runs immediately. Returns the number of ticks run.
    pub fn run(&self) -> u64 {
        debug!("Scheduler started, period {:?}", self.period);
        let mut ticks = 0;
        let mut next = Instant::now();
        while !self.stop.is_stopped() {
            self.tick();
            ticks += 1;

            next += self.period;
            let now = Instant::now();
            if next < now {
                debug!("Tick overran by {:?}", now - next);
                next = now;
            }
            if self.stop.sleep_until(next) {
                break;
            }
        }
        debug!("Scheduler stopped after {} ticks", ticks);
        ticks
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}
