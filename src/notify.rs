//! Update notification surface
//!
//! A [`NotificationSurface`] only presents: it shows the "update available"
//! choice and reports purge progress. Every decision about *whether* an
//! update is pending belongs to the [`Reconciler`]; [`respond`] connects the
//! two.

use crate::error::FreshenResult;
use crate::purge::PurgeReport;
use crate::reconcile::{PurgeOutcome, Reconciler};
use crate::toast::{ToastEvent, ToastLevel, ToastService};
use crate::ui::{self, UiContext};
use crate::version::BuildVersion;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::debug;

const TOAST_DURATION: Duration = Duration::from_secs(3);

/// The user's answer to an update prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateChoice {
    UpdateNow,
    Later,
}

/// Presents reconciler state to the user
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Offer "Update now" / "Later"; `None` leaves the update pending
    async fn prompt_update(
        &self,
        running: &BuildVersion,
        latest: &BuildVersion,
    ) -> FreshenResult<Option<UpdateChoice>>;

    fn purge_started(&self);

    fn purge_finished(&self, report: &PurgeReport);

    fn update_deferred(&self, version: &BuildVersion);
}

/// Ask the surface about the pending update and act on the answer
///
/// The answer applies to the version that was shown. If a poll replaced
/// the pending version while the prompt was open, the user is asked again
/// about the new one. Returns the purge outcome when the user chose to
/// update.
pub async fn respond(
    reconciler: &Reconciler,
    surface: &dyn NotificationSurface,
) -> FreshenResult<Option<PurgeOutcome>> {
    loop {
        let Some(shown) = reconciler.state().pending().cloned() else {
            return Ok(None);
        };

        match surface.prompt_update(reconciler.running(), &shown).await? {
            Some(UpdateChoice::UpdateNow) => {
                if reconciler.state().pending() != Some(&shown) {
                    debug!("Prompt for {} is stale, re-evaluating", shown);
                    continue;
                }
                surface.purge_started();
                let outcome = reconciler.update_now(&shown).await;
                match &outcome {
                    PurgeOutcome::StalePrompt => continue,
                    PurgeOutcome::Completed(report) => surface.purge_finished(report),
                    PurgeOutcome::AlreadyRunning | PurgeOutcome::NothingPending => {}
                }
                return Ok(Some(outcome));
            }
            Some(UpdateChoice::Later) => {
                if reconciler.dismiss(&shown).await? {
                    surface.update_deferred(&shown);
                    return Ok(None);
                }
                debug!("Prompt for {} is stale, re-evaluating", shown);
            }
            None => return Ok(None),
        }
    }
}

/// Manual "clear cache", reported through the surface
pub async fn clear_cache(reconciler: &Reconciler, surface: &dyn NotificationSurface) -> PurgeOutcome {
    surface.purge_started();
    let outcome = reconciler.clear_cache().await;
    if let PurgeOutcome::Completed(report) = &outcome {
        surface.purge_finished(report);
    }
    outcome
}

/// Terminal surface: cliclack prompt, results posted as toasts
pub struct TerminalSurface {
    ctx: UiContext,
    toasts: ToastService,
}

impl TerminalSurface {
    pub fn new(ctx: UiContext, toasts: ToastService) -> Self {
        Self { ctx, toasts }
    }
}

#[async_trait]
impl NotificationSurface for TerminalSurface {
    async fn prompt_update(
        &self,
        running: &BuildVersion,
        latest: &BuildVersion,
    ) -> FreshenResult<Option<UpdateChoice>> {
        ui::step_warn_hint(
            &self.ctx,
            &format!("New version {} available", latest),
            &format!("running {}", running),
        );

        // Unattended sessions leave the update pending unless --yes
        if !self.ctx.is_interactive() && !self.ctx.auto_yes() {
            return Ok(None);
        }

        let update = ui::confirm(&self.ctx, "Clear caches and reload now?", false).await?;
        Ok(Some(if update {
            UpdateChoice::UpdateNow
        } else {
            UpdateChoice::Later
        }))
    }

    fn purge_started(&self) {
        ui::step_info(&self.ctx, "Clearing caches...");
    }

    fn purge_finished(&self, report: &PurgeReport) {
        if report.is_complete() {
            self.toasts.show(
                ToastLevel::Success,
                format!("Cleared {} cached entries, reloading", report.removed()),
                Some(TOAST_DURATION),
            );
        } else {
            let failed: Vec<String> = report
                .failed_areas()
                .iter()
                .map(ToString::to_string)
                .collect();
            self.toasts.show(
                ToastLevel::Warning,
                format!("Caches partly cleared (failed: {}), reloading", failed.join(", ")),
                Some(TOAST_DURATION),
            );
        }
    }

    fn update_deferred(&self, version: &BuildVersion) {
        self.toasts.show(
            ToastLevel::Info,
            format!("Update {} deferred", version),
            Some(TOAST_DURATION),
        );
    }
}

/// Print toasts as they are shown, until the service is dropped
pub fn spawn_toast_renderer(ctx: UiContext, toasts: &ToastService) -> JoinHandle<()> {
    let mut events = toasts.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ToastEvent::Shown(toast)) => ui::toast_line(&ctx, toast.level, &toast.message),
                Ok(ToastEvent::Dismissed(_)) => {}
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}
