//! Cancellable periodic tick.
//!
//! Starting a ticker always cancels the previous one first, so at most one
//! tick task is alive per [`Ticker`]. Dropping the ticker cancels it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

struct TickTask {
    token: CancellationToken,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub struct Ticker {
    current: Option<TickTask>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task calling `on_tick` every `period`, the first call immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => on_tick(),
                }
            }
            tracing::debug!("ticker stopped");
        });
        tracing::debug!(period_ms = period.as_millis() as u64, "ticker started");
        self.current = Some(TickTask { token, task });
    }

    pub fn stop(&mut self) {
        if let Some(current) = self.current.take() {
            current.token.cancel();
        }
    }

    /// Cancel and wait for the tick task to finish.
    pub async fn shutdown(&mut self) {
        if let Some(current) = self.current.take() {
            current.token.cancel();
            if let Err(e) = current.task.await {
                tracing::warn!(error = %e, "ticker task failed");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|c| !c.token.is_cancelled() && !c.task.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
