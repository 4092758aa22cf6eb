//! CLI argument definitions using clap derive

use crate::purge::PurgePolicy;
use crate::version::VersionScheme;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Freshen - build-version publishing and stale-client cache reconciliation
///
/// Stamps each build with a version, and purges and reloads clients that
/// are still running an older one.
#[derive(Parser, Debug)]
#[command(name = "freshen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FRESHEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local freshen.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stamp a build: write version.json and inject the shell globals
    Publish(PublishArgs),

    /// Compare the running build against the latest published one
    Check(CheckArgs),

    /// Poll for new builds and prompt to update
    Watch(WatchArgs),

    /// Clear the client profile's caches and storage
    Purge(PurgeArgs),

    /// Show running build, acknowledgment and profile state
    Status(StatusArgs),

    /// Inspect or change the acknowledged version
    Ack(AckArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

/// Arguments for the publish command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// HTML shell carrying the injection delimiters
    #[arg(long)]
    pub shell: Option<PathBuf>,

    /// Where to write the version resource
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Version scheme
    #[arg(long)]
    pub scheme: Option<SchemeArg>,

    /// Source revision to record (skips env/git detection)
    #[arg(long)]
    pub revision: Option<String>,

    /// Show what would be written without touching files
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Published HTML shell of the running build
    #[arg(long)]
    pub shell: Option<PathBuf>,

    /// Version resource URL or path (defaults to reconcile.version_url)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Published HTML shell of the running build
    #[arg(long)]
    pub shell: Option<PathBuf>,

    /// Version resource URL or path (defaults to reconcile.version_url)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Seconds between polls (0 = check once)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Update without prompting
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the purge command
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    /// Override the configured purge policy
    #[arg(long)]
    pub policy: Option<PolicyArg>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Published HTML shell of the running build
    #[arg(long)]
    pub shell: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the ack command
#[derive(Parser, Debug)]
pub struct AckArgs {
    #[command(subcommand)]
    pub action: AckAction,
}

/// Ack subcommands
#[derive(Subcommand, Debug)]
pub enum AckAction {
    /// Print the acknowledged version
    Show,

    /// Acknowledge a version so it is not prompted
    Set {
        /// Version to acknowledge
        #[arg(id = "ack_version", value_name = "VERSION")]
        version: String,
    },

    /// Forget the acknowledgment
    Clear,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,

        /// Write a project-local freshen.toml in the current directory
        #[arg(long)]
        local: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., reconcile.poll_interval_secs)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local freshen.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Version scheme selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// Millisecond UTC timestamp
    Timestamp,
    /// Hash of the asset tree
    ContentHash,
}

impl From<SchemeArg> for VersionScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Timestamp => VersionScheme::Timestamp,
            SchemeArg::ContentHash => VersionScheme::ContentHash,
        }
    }
}

/// Purge policy selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Remove everything, including the auth token
    ClearAll,
    /// Keep token, userInfo, roles and configured extras
    PreserveAuth,
}

impl From<PolicyArg> for PurgePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::ClearAll => PurgePolicy::ClearAll,
            PolicyArg::PreserveAuth => PurgePolicy::PreserveAuth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_publish() {
        let cli = Cli::parse_from([
            "freshen",
            "publish",
            "--shell",
            "public/index.html",
            "--scheme",
            "content-hash",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Publish(args) => {
                assert_eq!(args.shell, Some(PathBuf::from("public/index.html")));
                assert_eq!(args.scheme, Some(SchemeArg::ContentHash));
                assert!(args.dry_run);
                assert_eq!(args.format, OutputFormat::Text);
            }
            _ => panic!("expected Publish command"),
        }
    }

    #[test]
    fn cli_parses_check_json() {
        let cli = Cli::parse_from([
            "freshen",
            "check",
            "--source",
            "https://queue.example/version.json",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(
                    args.source.as_deref(),
                    Some("https://queue.example/version.json")
                );
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn cli_parses_watch() {
        let cli = Cli::parse_from(["freshen", "watch", "-i", "120", "--yes"]);
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.interval, Some(120));
                assert!(args.yes);
            }
            _ => panic!("expected Watch command"),
        }
    }

    #[test]
    fn cli_parses_purge_policy() {
        let cli = Cli::parse_from(["freshen", "purge", "--policy", "preserve-auth", "-y"]);
        match cli.command {
            Commands::Purge(args) => {
                assert_eq!(args.policy.map(PurgePolicy::from), Some(PurgePolicy::PreserveAuth));
                assert!(args.yes);
            }
            _ => panic!("expected Purge command"),
        }
    }

    #[test]
    fn cli_parses_ack_set() {
        let cli = Cli::parse_from(["freshen", "ack", "set", "1717171717171"]);
        match cli.command {
            Commands::Ack(AckArgs {
                action: AckAction::Set { version },
            }) => assert_eq!(version, "1717171717171"),
            _ => panic!("expected Ack Set command"),
        }
    }

    #[test]
    fn cli_parses_config_set_local() {
        let cli = Cli::parse_from([
            "freshen",
            "config",
            "set",
            "purge.policy",
            "preserve_auth",
            "--local",
        ]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value, local }),
            }) => {
                assert_eq!(key, "purge.policy");
                assert_eq!(value, "preserve_auth");
                assert!(local);
            }
            _ => panic!("expected Config Set command"),
        }
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::parse_from(["freshen", "-vv", "--no-local", "status"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_local);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn cli_parses_completions() {
        let cli = Cli::parse_from(["freshen", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
