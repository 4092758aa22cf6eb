//! Publish command - stamp a build with a new version

use crate::audit::AuditLog;
use crate::cli::args::{OutputFormat, PublishArgs};
use crate::config::Config;
use crate::error::{FreshenError, FreshenResult};
use crate::publish::{revision, PublishedBuild, Publisher};
use crate::ui::{self, UiContext};
use chrono::Utc;

/// Execute the publish command
pub async fn execute(args: PublishArgs, config: &Config) -> FreshenResult<()> {
    let mut settings = config.publish.clone();
    if let Some(shell) = args.shell {
        settings.shell = shell;
    }
    if let Some(out) = args.out {
        settings.version_file = out;
    }
    if let Some(scheme) = args.scheme {
        settings.scheme = scheme.into();
    }

    let cwd =
        std::env::current_dir().map_err(|e| FreshenError::io("getting current directory", e))?;
    let explicit = args.revision.or_else(|| settings.source_revision.clone());
    let source_revision = revision::resolve(explicit.as_deref(), &cwd).await;

    let published = Publisher::new(settings)
        .publish(Utc::now(), source_revision, args.dry_run)
        .await?;

    if published.written {
        AuditLog::new(config)
            .log(
                "build.published",
                &serde_json::json!({
                    "version": published.manifest.version.as_str(),
                    "gitCommit": published.manifest.source_revision,
                    "versionFile": published.version_file,
                    "shell": published.shell,
                }),
            )
            .await;
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&published)?),
        OutputFormat::Text => report(&published)?,
    }
    Ok(())
}

fn report(published: &PublishedBuild) -> FreshenResult<()> {
    let ctx = UiContext::detect();

    if !published.written {
        ui::step_info(&ctx, "Dry run, nothing written");
        ui::key_value(&ctx, "version file", &published.version_file.display().to_string());
        print!("{}", published.manifest.to_json_pretty()?);
        return Ok(());
    }

    ui::step_ok_detail(
        &ctx,
        &format!("Published build {}", published.manifest.version),
        &published.manifest.source_revision,
    );
    ui::key_value(&ctx, "version file", &published.version_file.display().to_string());
    ui::key_value(&ctx, "shell", &published.shell.display().to_string());
    ui::key_value(&ctx, "build date", &published.manifest.build_date);
    Ok(())
}
