//! Status command - running build, acknowledgment and profile contents

use crate::app::{self, RunningBuild};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::{Config, ConfigManager};
use crate::error::FreshenResult;
use crate::reconcile::AckStore;
use crate::storage::{ClientProfile, AUTH_KEYS};
use crate::ui::{self, UiContext};
use console::style;
use serde_json::json;
use tracing::debug;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> FreshenResult<()> {
    let shell = args.shell.unwrap_or_else(|| config.publish.shell.clone());

    let running = match RunningBuild::read(&shell).await {
        Ok(running) => Some(running),
        Err(e) => {
            debug!("No running build: {}", e);
            None
        }
    };

    let profile = app::open_profile(config)?;
    let acknowledged = AckStore::new(profile.local.clone()).get()?;
    let local_keys = profile.local.keys()?;
    let session_keys = profile.session.keys()?;
    let caches = match &profile.caches {
        Some(caches) => caches.names().await?,
        None => vec![],
    };
    let signed_in = AUTH_KEYS
        .iter()
        .any(|key| local_keys.iter().any(|k| k == key));

    if args.format == OutputFormat::Json {
        let report = json!({
            "running": running.as_ref().map(|r| json!({
                "version": r.version,
                "buildDate": r.build_date,
                "shell": r.shell,
            })),
            "acknowledged": acknowledged,
            "profile": {
                "dir": ConfigManager::profile_dir(config),
                "local": local_keys,
                "session": session_keys,
                "caches": caches,
            },
            "versionUrl": config.reconcile.version_url,
            "pollIntervalSecs": config.reconcile.poll_interval().map(|d| d.as_secs()),
            "purgePolicy": config.purge.policy,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let ctx = UiContext::detect();
    println!("{}", style("Build:").bold());
    match &running {
        Some(r) => {
            ui::key_value(&ctx, "running", r.version.as_str());
            ui::key_value(&ctx, "built", &r.build_date);
        }
        None => ui::step_warn_hint(
            &ctx,
            &format!("No published build in {}", shell.display()),
            "Run: freshen publish",
        ),
    }
    ui::key_value(
        &ctx,
        "acknowledged",
        acknowledged.as_ref().map_or("-", |v| v.as_str()),
    );

    println!();
    println!("{}", style("Profile:").bold());
    print_profile(&ctx, config, &profile, &local_keys, &session_keys, &caches);
    ui::key_value_status(&ctx, "auth", if signed_in { "present" } else { "absent" }, signed_in);

    println!();
    println!("{}", style("Reconcile:").bold());
    ui::key_value(&ctx, "source", &config.reconcile.version_url);
    ui::key_value(
        &ctx,
        "interval",
        &config
            .reconcile
            .poll_interval()
            .map_or_else(|| "once".to_string(), |d| format!("{}s", d.as_secs())),
    );
    ui::key_value(&ctx, "purge policy", &config.purge.policy.to_string());
    Ok(())
}

fn print_profile(
    ctx: &UiContext,
    config: &Config,
    profile: &ClientProfile,
    local_keys: &[String],
    session_keys: &[String],
    caches: &[String],
) {
    ui::key_value(ctx, "dir", &ConfigManager::profile_dir(config).display().to_string());
    ui::key_value(ctx, "local", &format!("{} keys", local_keys.len()));
    ui::key_value(ctx, "session", &format!("{} keys", session_keys.len()));
    if profile.caches.is_some() {
        ui::key_value(ctx, "caches", &format!("{} named caches", caches.len()));
    }
}
