//! Application shell context
//!
//! [`AppShell`] owns everything a running client shares: the running build,
//! its storage profile, the reconciler, the toast service and the audit log.
//! It is constructed once, explicitly, in this order:
//!
//! 1. read the running build from the published shell globals
//! 2. open the audit log
//! 3. build the purge routine and reload scheduler from config
//! 4. build and mount the reconciler (seeds the acknowledgment)
//!
//! Step 1 failing means the shell was never published, and nothing else is
//! constructed.

use crate::api::{ApiClient, AuthInterceptor};
use crate::audit::AuditLog;
use crate::config::{Config, ConfigManager};
use crate::error::{FreshenError, FreshenResult};
use crate::publish::shell;
use crate::purge::PurgeRoutine;
use crate::reconcile::{start_polling, PollHandle, Reconciler, VersionSource};
use crate::reload::{CommandReloader, ReloadScheduler, Reloader, SignalReloader};
use crate::storage::ClientProfile;
use crate::toast::ToastService;
use crate::version::BuildVersion;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Build the client is currently running, as published into its shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningBuild {
    pub version: BuildVersion,
    pub build_date: String,
    pub shell: PathBuf,
}

impl RunningBuild {
    /// Read the globals block of a published shell
    pub async fn read(shell_path: &Path) -> FreshenResult<Self> {
        let html = fs::read_to_string(shell_path).await.map_err(|e| {
            FreshenError::io(format!("reading shell {}", shell_path.display()), e)
        })?;
        let globals = shell::read_globals(&html, shell_path)?;
        Ok(Self {
            version: globals.version,
            build_date: globals.build_date,
            shell: shell_path.to_path_buf(),
        })
    }
}

/// File-backed client profile at the configured location
pub fn open_profile(config: &Config) -> FreshenResult<ClientProfile> {
    let dir = ConfigManager::profile_dir(config);
    debug!("Opening client profile at {}", dir.display());
    ClientProfile::open(&dir)
}

/// Reloader for the configured reload command, if any
pub fn create_reloader(config: &Config) -> Option<Arc<dyn Reloader>> {
    config
        .reconcile
        .reload_command
        .as_deref()
        .filter(|cmd| !cmd.trim().is_empty())
        .map(|cmd| Arc::new(CommandReloader::new(cmd)) as Arc<dyn Reloader>)
}

/// Shared client context
pub struct AppShell {
    running: RunningBuild,
    profile: ClientProfile,
    reconciler: Arc<Reconciler>,
    toasts: ToastService,
    audit: AuditLog,
}

impl AppShell {
    /// Construct the shell for `shell_path` over `profile`
    ///
    /// `reloader` performs the hard reload once a purge completes.
    pub async fn open(
        config: &Config,
        shell_path: &Path,
        profile: ClientProfile,
        reloader: Arc<dyn Reloader>,
    ) -> FreshenResult<Self> {
        let running = RunningBuild::read(shell_path).await?;
        debug!(
            "Running build {} (built {})",
            running.version, running.build_date
        );

        let audit = AuditLog::new(config);
        let purge = PurgeRoutine::from_config(&config.purge);
        let reload = ReloadScheduler::new(reloader, config.reconcile.reload_delay());

        let reconciler = Reconciler::new(running.version.clone(), profile.clone(), purge, reload)
            .with_force_update(config.reconcile.force_update)
            .with_audit(audit.clone());
        reconciler.mount()?;

        Ok(Self {
            running,
            profile,
            reconciler: Arc::new(reconciler),
            toasts: ToastService::new(),
            audit,
        })
    }

    /// Shell whose reload only raises a signal, for in-process hosts
    pub async fn open_signalled(
        config: &Config,
        shell_path: &Path,
        profile: ClientProfile,
    ) -> FreshenResult<(Self, Arc<SignalReloader>)> {
        let signal = Arc::new(SignalReloader::new());
        let app = Self::open(config, shell_path, profile, signal.clone()).await?;
        Ok((app, signal))
    }

    pub fn running(&self) -> &RunningBuild {
        &self.running
    }

    pub fn profile(&self) -> &ClientProfile {
        &self.profile
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn toasts(&self) -> &ToastService {
        &self.toasts
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Start polling `source` on `interval` (a single check when `None`)
    pub fn start_polling(
        &self,
        source: Arc<dyn VersionSource>,
        interval: Option<Duration>,
    ) -> PollHandle {
        start_polling(Arc::clone(&self.reconciler), source, interval)
    }

    /// API client sharing this shell's auth state and toasts
    pub fn api_client(&self, base_url: impl Into<String>) -> ApiClient {
        let interceptor = AuthInterceptor::new(self.profile.local.clone(), self.toasts.clone());
        ApiClient::new(base_url, interceptor)
    }
}
