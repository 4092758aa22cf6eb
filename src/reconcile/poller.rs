//! Periodic version polling
//!
//! [`start_polling`] checks once immediately (the "on mount" check) and then
//! on a fixed interval. The returned [`PollHandle`] owns the task: `stop()`
//! ends it cleanly, dropping the handle aborts it. Polling also ends on its
//! own once the reconciler reaches `Reloading`.

use super::reconciler::Reconciler;
use super::source::VersionSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Owner of a running poll task
pub struct PollHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop polling and wait for the task to exit
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Poll task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Poll `source` now and every `interval` (once only when `None`)
pub fn start_polling(
    reconciler: Arc<Reconciler>,
    source: Arc<dyn VersionSource>,
    interval: Option<Duration>,
) -> PollHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let Some(interval) = interval else {
            reconciler.poll_once(source.as_ref()).await;
            return;
        };

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    debug!("Version polling stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if reconciler.state().is_terminal() {
                        debug!("Reload pending, polling ends");
                        break;
                    }
                    reconciler.poll_once(source.as_ref()).await;
                }
            }
        }
    });

    PollHandle {
        stop: Some(stop_tx),
        task: Some(task),
    }
}
