//! Freshen - build-version publishing and stale-client cache reconciliation
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use freshen::cli::{commands, Cli, Commands};
use freshen::config::{Config, ConfigManager};
use freshen::error::{FreshenError, FreshenResult};
use freshen::ui;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// `check` exit status when a newer build is available
const EXIT_UPDATE_AVAILABLE: u8 = 10;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FreshenResult<ExitCode> {
    let cli = Cli::parse();

    // Completions need neither logging nor config
    if let Commands::Completions { shell } = cli.command {
        commands::completions(shell);
        return Ok(ExitCode::SUCCESS);
    }

    let config_manager = match cli.config {
        Some(ref path) => {
            // An explicit file must exist, except for the command that creates it
            if !path.exists() && !matches!(cli.command, Commands::Config(_)) {
                return Err(FreshenError::ConfigNotFound(path.clone()));
            }
            ConfigManager::with_path(path.clone())
        }
        None => ConfigManager::new(),
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| FreshenError::io("getting current directory", e))?;
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
    } else if let Some(ref path) = local_config_path {
        debug!("Found local config: {}", path.display());
    }

    ui::init_theme();

    match cli.command {
        Commands::Publish(args) => commands::publish(args, &config).await?,
        Commands::Check(args) => {
            ConfigManager::ensure_state_dirs(&config).await?;
            if commands::check(args, &config).await? {
                return Ok(ExitCode::from(EXIT_UPDATE_AVAILABLE));
            }
        }
        Commands::Watch(args) => {
            ConfigManager::ensure_state_dirs(&config).await?;
            commands::watch(args, &config).await?
        }
        Commands::Purge(args) => {
            ConfigManager::ensure_state_dirs(&config).await?;
            commands::purge(args, &config).await?
        }
        Commands::Status(args) => commands::status(args, &config).await?,
        Commands::Ack(args) => {
            ConfigManager::ensure_state_dirs(&config).await?;
            commands::ack(args, &config).await?
        }
        Commands::Config(args) => commands::config(args, &config, &config_manager).await?,
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(ExitCode::SUCCESS)
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => "info",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::new(format!("freshen={}", level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
