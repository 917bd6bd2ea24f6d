//! Cancellable repeating tasks on the tokio timer.
//!
//! The first tick fires one period after spawning. Ticks missed while a
//! callback is still running are skipped, never queued, so a slow save can
//! not trigger a burst of saves afterwards.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// What a tick callback wants the task to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct RepeatingTask {
    name: &'static str,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl RepeatingTask {
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickControl> + Send + 'static,
    {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tick().await == TickControl::Stop {
                            tracing::debug!(task = name, "Task stopped itself");
                            break;
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            tracing::debug!(task = name, "Task shut down");
                            break;
                        }
                    }
                }
            }
        });

        tracing::debug!(task = name, period_secs = period.as_secs(), "Task started");
        Self {
            name,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the task to stop. A tick that is already running finishes first.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(task = self.name, error = %e, "Task ended abnormally");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(true)
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}
