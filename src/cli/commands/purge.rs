//! Purge command - manual "clear cache" for the client profile

use crate::app;
use crate::audit::AuditLog;
use crate::cli::args::PurgeArgs;
use crate::config::Config;
use crate::error::FreshenResult;
use crate::purge::{PurgeReport, PurgeRoutine};
use crate::reload::ReloadScheduler;
use crate::ui::{self, TaskSpinner, UiContext};
use tracing::warn;

/// Execute the purge command
pub async fn execute(args: PurgeArgs, config: &Config) -> FreshenResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);

    let mut settings = config.purge.clone();
    if let Some(policy) = args.policy {
        settings.policy = policy.into();
    }
    let routine = PurgeRoutine::from_config(&settings);

    let prompt = format!(
        "Clear HTTP caches, local and session storage ({})?",
        routine.policy()
    );
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Purge cancelled", "Use --yes to skip the prompt");
        return Ok(());
    }

    let profile = app::open_profile(config)?;
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start("Clearing caches...");
    let report = routine.run(&profile).await;

    if report.is_complete() {
        spinner.stop(&format!("Removed {} entries", report.removed()));
    } else {
        spinner.stop_warn(&format!(
            "Removed {} entries, some areas failed",
            report.removed()
        ));
    }
    print_report(&ctx, &report);

    AuditLog::new(config)
        .log(
            "purge.completed",
            &serde_json::json!({
                "trigger": "cli",
                "policy": routine.policy().to_string(),
                "removed": report.removed(),
                "complete": report.is_complete(),
            }),
        )
        .await;

    if let Some(reloader) = app::create_reloader(config) {
        let scheduler = ReloadScheduler::new(reloader, config.reconcile.reload_delay());
        if let Some(handle) = scheduler.schedule() {
            if let Err(e) = handle.await {
                warn!("Reload task failed: {}", e);
                ui::outro_warn(&ctx, "Caches cleared, reload did not complete");
                return Ok(());
            }
        }
        ui::outro_success(&ctx, "Caches cleared, client reloaded");
    } else {
        ui::outro_success(&ctx, "Caches cleared");
    }
    Ok(())
}

fn print_report(ctx: &UiContext, report: &PurgeReport) {
    for area in &report.areas {
        let name = area.area.to_string();
        if area.is_ok() {
            ui::key_value_status(ctx, &name, &format!("{} removed", area.removed), true);
        } else {
            ui::key_value_status(ctx, &name, &area.errors.join("; "), false);
        }
    }
}
