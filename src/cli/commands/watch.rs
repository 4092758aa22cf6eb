//! Watch command - poll for new builds and prompt to update

use crate::app::{self, AppShell};
use crate::cli::args::WatchArgs;
use crate::config::Config;
use crate::error::FreshenResult;
use crate::notify::{self, TerminalSurface};
use crate::reconcile::{from_location, ReconcileState, VersionSource};
use crate::ui::{self, UiContext};
use std::sync::Arc;
use tracing::{debug, info};

/// How a watch session ended
enum Exit {
    Reload,
    Interrupted,
    Idle,
}

/// Execute the watch command
pub async fn execute(args: WatchArgs, config: &Config) -> FreshenResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let shell = args.shell.unwrap_or_else(|| config.publish.shell.clone());
    let location = args
        .source
        .unwrap_or_else(|| config.reconcile.version_url.clone());

    let mut reconcile = config.reconcile.clone();
    if let Some(secs) = args.interval {
        reconcile.poll_interval_secs = secs;
    }
    let interval = reconcile.poll_interval();

    let profile = app::open_profile(config)?;
    let (app, signal) = AppShell::open_signalled(config, &shell, profile).await?;

    ui::intro(&ctx, "freshen watch");
    ui::key_value(&ctx, "running", app.running().version.as_str());
    ui::key_value(&ctx, "source", &location);
    ui::key_value(
        &ctx,
        "interval",
        &interval.map_or_else(|| "once".to_string(), |i| format!("{}s", i.as_secs())),
    );

    let renderer = notify::spawn_toast_renderer(ctx.clone(), app.toasts());
    let surface = TerminalSurface::new(ctx.clone(), app.toasts().clone());
    let source: Arc<dyn VersionSource> = Arc::from(from_location(&location));

    let mut states = app.reconciler().subscribe();
    let poller = app.start_polling(source, interval);

    let exit = if interval.is_none() {
        // Single check: wait for it, answer it, then wait for any reload
        poller.stop().await;
        notify::respond(app.reconciler(), &surface).await?;
        if app.reconciler().state().is_terminal() {
            signal.requested().await;
            Exit::Reload
        } else {
            Exit::Idle
        }
    } else {
        let exit = loop {
            tokio::select! {
                _ = signal.requested() => break Exit::Reload,
                _ = tokio::signal::ctrl_c() => break Exit::Interrupted,
                changed = states.changed() => {
                    if changed.is_err() {
                        break Exit::Idle;
                    }
                    let state = states.borrow_and_update().clone();
                    debug!("Reconciler state: {}", state);
                    if let ReconcileState::UpdateAvailable { .. } = state {
                        notify::respond(app.reconciler(), &surface).await?;
                    }
                }
            }
        };
        poller.stop().await;
        exit
    };

    renderer.abort();

    match exit {
        Exit::Reload => {
            if let Some(reloader) = app::create_reloader(config) {
                info!("Running reload command");
                reloader.reload().await?;
                ui::outro_success(&ctx, "Caches cleared, client reloaded");
            } else {
                ui::outro_warn(&ctx, "Caches cleared, restart the client to load the new build");
            }
        }
        Exit::Interrupted => ui::outro_warn(&ctx, "Stopped"),
        Exit::Idle => ui::outro_success(&ctx, "Done"),
    }
    Ok(())
}
