//! Full client reload after a purge
//!
//! A reload is a hard restart of the client, never an in-app navigation.
//! [`ReloadScheduler`] fires it at most once per scheduler, after a short
//! delay that lets in-flight UI feedback render.

use crate::error::{FreshenError, FreshenResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default delay between purge completion and reload
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(1000);

/// Performs the hard reload of the client
#[async_trait]
pub trait Reloader: Send + Sync {
    async fn reload(&self) -> FreshenResult<()>;
}

/// Schedules exactly one reload
pub struct ReloadScheduler {
    reloader: Arc<dyn Reloader>,
    delay: Duration,
    scheduled: AtomicBool,
}

impl ReloadScheduler {
    pub fn new(reloader: Arc<dyn Reloader>, delay: Duration) -> Self {
        Self {
            reloader,
            delay,
            scheduled: AtomicBool::new(false),
        }
    }

    /// Schedule the reload; returns `None` if one is already scheduled
    pub fn schedule(&self) -> Option<JoinHandle<()>> {
        if self.scheduled.swap(true, Ordering::SeqCst) {
            debug!("Reload already scheduled, ignoring");
            return None;
        }

        let reloader = Arc::clone(&self.reloader);
        let delay = self.delay;
        info!("Reloading in {} ms", delay.as_millis());

        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = reloader.reload().await {
                warn!("Reload failed: {}", e);
            }
        }))
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.load(Ordering::SeqCst)
    }
}

/// Signals a waiting task that the client must reload
///
/// Used by long-running hosts (the `watch` command) that restart by
/// exiting their own loop.
#[derive(Debug, Default)]
pub struct SignalReloader {
    notify: Notify,
    fired: AtomicBool,
}

impl SignalReloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until a reload has been requested
    pub async fn requested(&self) {
        let notified = self.notify.notified();
        if self.fired.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reloader for SignalReloader {
    async fn reload(&self) -> FreshenResult<()> {
        self.fired.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Runs a shell command to restart the client (e.g. a kiosk browser)
#[derive(Debug, Clone)]
pub struct CommandReloader {
    command: String,
}

impl CommandReloader {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Reloader for CommandReloader {
    async fn reload(&self) -> FreshenResult<()> {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        debug!("Running reload command: {}", self.command);

        let output = tokio::process::Command::new(shell)
            .args([flag, self.command.as_str()])
            .output()
            .await
            .map_err(|e| FreshenError::command_failed(&self.command, e))?;

        if !output.status.success() {
            return Err(FreshenError::command_exec(
                &self.command,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        Ok(())
    }
}
