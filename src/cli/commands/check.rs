//! Check command - is the running build stale?

use crate::app::{self, AppShell};
use crate::cli::args::{CheckArgs, OutputFormat};
use crate::config::Config;
use crate::error::FreshenResult;
use crate::reconcile::{from_location, ReconcileState};
use crate::ui::{self, UiContext};
use serde_json::json;

/// Execute the check command; returns true when an update is available
pub async fn execute(args: CheckArgs, config: &Config) -> FreshenResult<bool> {
    let shell = args.shell.unwrap_or_else(|| config.publish.shell.clone());
    let location = args
        .source
        .unwrap_or_else(|| config.reconcile.version_url.clone());

    let profile = app::open_profile(config)?;
    let (app, _) = AppShell::open_signalled(config, &shell, profile).await?;
    let reconciler = app.reconciler();

    // Fetch errors surface here instead of skipping the cycle
    let source = from_location(&location);
    let latest = source.fetch_latest().await?;
    let state = reconciler
        .observe(&latest)
        .await
        .unwrap_or_else(|| reconciler.state());
    let update_available = matches!(state, ReconcileState::UpdateAvailable { .. });
    let acknowledged = reconciler.acknowledged()?;

    match args.format {
        OutputFormat::Json => {
            let report = json!({
                "running": app.running().version,
                "latest": latest.version,
                "acknowledged": acknowledged,
                "updateAvailable": update_available,
                "state": state,
                "source": source.describe(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let ctx = UiContext::detect();
            ui::key_value(&ctx, "running", app.running().version.as_str());
            ui::key_value(&ctx, "latest", latest.version.as_str());
            ui::key_value(
                &ctx,
                "acknowledged",
                acknowledged.as_ref().map_or("-", |v| v.as_str()),
            );
            if update_available {
                ui::step_warn_hint(
                    &ctx,
                    &format!("Update {} available", latest.version),
                    "Run: freshen watch",
                );
            } else if latest.version != *reconciler.running() {
                ui::step_ok(&ctx, &format!("Update {} already dismissed", latest.version));
            } else {
                ui::step_ok(&ctx, "Running the latest build");
            }
        }
    }

    Ok(update_available)
}
