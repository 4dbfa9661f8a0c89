#![forbid(unsafe_code)]

use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

/// Fires a job at a fixed interval until stopped.
///
/// The first firing happens one interval after [`Scheduler::start`]. Every
/// firing runs as its own task, so a run that outlasts the interval overlaps
/// with the next one. Dropping the scheduler stops it.
pub struct Scheduler {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start<F, Fut>(interval: Duration, runner: F) -> Result<Self, Error>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if interval.is_zero() {
            return Err(Error::InvalidInterval);
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut firing: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        firing += 1;
                        trace!(firing, "scheduled run");
                        tokio::spawn(runner());
                    }
                }
            }
            debug!(firings = firing, "scheduler stopped");
        });
        debug!(?interval, "scheduler started");

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Cancel pending and future firings. A run already in flight finishes.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the timer task to exit after [`Scheduler::stop`].
    pub async fn stopped(mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(err) = handle.await {
            error!(%err, "scheduler task did not exit cleanly");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
