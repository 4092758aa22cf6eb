//! Stale-build detection and purge workflow
//!
//! The reconciler compares the *latest published* version against the
//! *running* version. The acknowledgment is consulted only to suppress a
//! prompt the user already dismissed, never to decide staleness on its own.

use super::ack::AckStore;
use super::source::VersionSource;
use super::state::ReconcileState;
use crate::audit::AuditLog;
use crate::error::FreshenResult;
use crate::purge::{PurgeReport, PurgeRoutine};
use crate::reload::ReloadScheduler;
use crate::storage::ClientProfile;
use crate::version::{BuildVersion, VersionManifest};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Whether `latest` should surface an update prompt
pub fn is_update_available(
    running: &BuildVersion,
    latest: &BuildVersion,
    acknowledged: Option<&BuildVersion>,
) -> bool {
    latest != running && acknowledged != Some(latest)
}

/// Result of asking for a purge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Purge ran and a reload is scheduled
    Completed(PurgeReport),
    /// Another purge is already in flight, or the reload is pending
    AlreadyRunning,
    /// "Update now" without a pending update
    NothingPending,
    /// The pending version changed after the prompt was shown
    StalePrompt,
}

/// Drives one client's version state machine
pub struct Reconciler {
    running: BuildVersion,
    ack: AckStore,
    profile: ClientProfile,
    purge: PurgeRoutine,
    reload: ReloadScheduler,
    force_update: bool,
    audit: AuditLog,
    state: watch::Sender<ReconcileState>,
    last_fetched: Mutex<Option<VersionManifest>>,
}

impl Reconciler {
    pub fn new(
        running: BuildVersion,
        profile: ClientProfile,
        purge: PurgeRoutine,
        reload: ReloadScheduler,
    ) -> Self {
        let (state, _) = watch::channel(ReconcileState::Fresh);
        Self {
            running,
            ack: AckStore::new(profile.local.clone()),
            profile,
            purge,
            reload,
            force_update: false,
            audit: AuditLog::disabled(),
            state,
            last_fetched: Mutex::new(None),
        }
    }

    /// Purge without prompting whenever a new version is detected
    pub fn with_force_update(mut self, force: bool) -> Self {
        self.force_update = force;
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Seed the acknowledgment on first load
    pub fn mount(&self) -> FreshenResult<()> {
        if self.ack.seed(&self.running)? {
            debug!("Seeded acknowledgment with running version {}", self.running);
        }
        Ok(())
    }

    pub fn running(&self) -> &BuildVersion {
        &self.running
    }

    pub fn state(&self) -> ReconcileState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconcileState> {
        self.state.subscribe()
    }

    pub fn acknowledged(&self) -> FreshenResult<Option<BuildVersion>> {
        self.ack.get()
    }

    /// Most recent successfully fetched manifest
    pub fn last_fetched(&self) -> Option<VersionManifest> {
        self.last_fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-evaluate against a freshly fetched manifest
    ///
    /// Returns `None` when the result was ignored because a purge or
    /// reload is already under way.
    pub async fn observe(&self, latest: &VersionManifest) -> Option<ReconcileState> {
        *self
            .last_fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(latest.clone());

        let acknowledged = match self.ack.get() {
            Ok(ack) => ack,
            Err(e) => {
                warn!("Failed to read acknowledgment: {}", e);
                None
            }
        };

        let available = is_update_available(&self.running, &latest.version, acknowledged.as_ref());
        let next = if available {
            ReconcileState::UpdateAvailable {
                latest: latest.version.clone(),
            }
        } else {
            ReconcileState::Fresh
        };

        let mut ignored = false;
        let changed = self.state.send_if_modified(|state| {
            if !state.accepts_poll() {
                ignored = true;
                return false;
            }
            if *state == next {
                return false;
            }
            *state = next.clone();
            true
        });

        if ignored {
            debug!("Ignoring version {}: {}", latest.version, self.state());
            return None;
        }

        if changed {
            info!("Reconcile state: {}", next);
            if available {
                self.audit
                    .log(
                        "update.detected",
                        &serde_json::json!({
                            "running": self.running.as_str(),
                            "latest": latest.version.as_str(),
                            "gitCommit": latest.source_revision,
                        }),
                    )
                    .await;
            }
        }

        Some(next)
    }

    /// Fetch once and re-evaluate; failures skip the cycle
    pub async fn poll_once(&self, source: &dyn VersionSource) -> Option<ReconcileState> {
        if !self.state.borrow().accepts_poll() {
            debug!("Skipping poll, {}", self.state());
            return None;
        }

        let latest = match source.fetch_latest().await {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Version check against {} skipped: {}", source.describe(), e);
                return None;
            }
        };

        let state = self.observe(&latest).await?;
        if self.force_update && matches!(state, ReconcileState::UpdateAvailable { .. }) {
            info!("Forced update to {}", latest.version);
            self.update_now(&latest.version).await;
            return Some(self.state());
        }
        Some(state)
    }

    /// "Later" for the version the user was shown
    ///
    /// Returns `false` without touching the acknowledgment when `shown` is
    /// no longer the pending version (a newer poll replaced it, or the
    /// deploy was rolled back).
    pub async fn dismiss(&self, shown: &BuildVersion) -> FreshenResult<bool> {
        if self.state.borrow().pending() != Some(shown) {
            debug!("Dismissal of {} ignored: {}", shown, self.state());
            return Ok(false);
        }

        // Ack before leaving UpdateAvailable so a concurrent poll cannot
        // re-raise the version being dismissed
        self.ack.set(shown)?;
        let dismissed = self.state.send_if_modified(|state| {
            if state.pending() == Some(shown) {
                *state = ReconcileState::Fresh;
                true
            } else {
                false
            }
        });

        if !dismissed {
            debug!("Dismissal of {} raced with a newer poll", shown);
            return Ok(false);
        }

        info!("Update {} dismissed", shown);
        self.audit
            .log(
                "update.dismissed",
                &serde_json::json!({ "version": shown.as_str() }),
            )
            .await;
        Ok(true)
    }

    /// "Update now" for the version the user was shown
    ///
    /// The accepted version is acknowledged first; the purge policy decides
    /// whether that acknowledgment survives.
    pub async fn update_now(&self, shown: &BuildVersion) -> PurgeOutcome {
        let mut stale = false;
        let started = self.state.send_if_modified(|state| match state {
            ReconcileState::UpdateAvailable { latest } if *latest == *shown => {
                *state = ReconcileState::Purging;
                true
            }
            ReconcileState::UpdateAvailable { .. } => {
                stale = true;
                false
            }
            _ => false,
        });

        if !started {
            return if stale {
                debug!("Update to {} not started, a newer version is pending", shown);
                PurgeOutcome::StalePrompt
            } else {
                match self.state() {
                    ReconcileState::Fresh => PurgeOutcome::NothingPending,
                    _ => PurgeOutcome::AlreadyRunning,
                }
            };
        }

        if let Err(e) = self.ack.set(shown) {
            warn!("Failed to record acknowledgment for {}: {}", shown, e);
        }
        self.finish_purge("update").await
    }

    /// Manual "clear cache", available whenever no purge is running
    pub async fn clear_cache(&self) -> PurgeOutcome {
        let started = self.state.send_if_modified(|state| {
            if state.accepts_poll() {
                *state = ReconcileState::Purging;
                true
            } else {
                false
            }
        });

        if !started {
            debug!("Purge already in flight, ignoring clear request");
            return PurgeOutcome::AlreadyRunning;
        }
        self.finish_purge("manual").await
    }

    async fn finish_purge(&self, trigger: &str) -> PurgeOutcome {
        info!("Purging client caches ({})", trigger);
        let report = self.purge.run(&self.profile).await;

        self.audit
            .log(
                "purge.completed",
                &serde_json::json!({
                    "trigger": trigger,
                    "policy": self.purge.policy().to_string(),
                    "removed": report.removed(),
                    "complete": report.is_complete(),
                }),
            )
            .await;

        self.state.send_replace(ReconcileState::Reloading);
        self.reload.schedule();
        PurgeOutcome::Completed(report)
    }
}
