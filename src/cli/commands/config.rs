//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_FILE};
use crate::error::{FreshenError, FreshenResult};
use crate::ui::{self, UiContext};
use std::path::{Path, PathBuf};
use tokio::fs;
use toml_edit::{value, Array, DocumentMut};

/// Shape of a settable value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Integer,
    Text,
    List,
}

const KEYS: &[(&str, ValueKind)] = &[
    ("general.verbose", ValueKind::Bool),
    ("general.log_format", ValueKind::Text),
    ("general.audit_log", ValueKind::Bool),
    ("publish.shell", ValueKind::Text),
    ("publish.version_file", ValueKind::Text),
    ("publish.scheme", ValueKind::Text),
    ("publish.asset_root", ValueKind::Text),
    ("publish.source_revision", ValueKind::Text),
    ("reconcile.version_url", ValueKind::Text),
    ("reconcile.poll_interval_secs", ValueKind::Integer),
    ("reconcile.reload_delay_ms", ValueKind::Integer),
    ("reconcile.force_update", ValueKind::Bool),
    ("reconcile.reload_command", ValueKind::Text),
    ("purge.policy", ValueKind::Text),
    ("purge.preserve_keys", ValueKind::List),
    ("profile.dir", ValueKind::Text),
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> FreshenResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force, local }) => {
            let path = if local {
                local_config_path()?
            } else {
                manager.path().to_path_buf()
            };
            init_config(&path, force).await?
        }
        Some(ConfigAction::Set { key, value, local }) => {
            let path = if local {
                local_config_path()?
            } else {
                manager.path().to_path_buf()
            };
            set_value(&path, &key, &value).await?;
            ui::step_ok(
                &UiContext::detect(),
                &format!("Set {} = {} in {}", key, value, path.display()),
            );
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> FreshenResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn local_config_path() -> FreshenResult<PathBuf> {
    let cwd =
        std::env::current_dir().map_err(|e| FreshenError::io("getting current directory", e))?;
    Ok(cwd.join(LOCAL_CONFIG_FILE))
}

async fn init_config(path: &Path, force: bool) -> FreshenResult<()> {
    let ctx = UiContext::detect();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    ConfigManager::with_path(path.to_path_buf())
        .save(&Config::default())
        .await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

/// Set one key in the file at `path`, keeping its comments and layout
///
/// The edited document must still load as a valid config, otherwise the
/// file is left untouched.
pub async fn set_value(path: &Path, key: &str, raw: &str) -> FreshenResult<()> {
    let kind = KEYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| FreshenError::ConfigKeyUnknown(key.to_string()))?;
    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| FreshenError::ConfigKeyUnknown(key.to_string()))?;

    let mut doc = if path.exists() {
        fs::read_to_string(path)
            .await
            .map_err(|e| FreshenError::io(format!("reading {}", path.display()), e))?
            .parse::<DocumentMut>()?
    } else {
        DocumentMut::new()
    };

    if !doc.contains_table(section) {
        doc[section] = toml_edit::table();
    }
    doc[section][field] = match kind {
        ValueKind::Bool => value(parse_bool(raw)?),
        ValueKind::Integer => value(parse_integer(raw)?),
        ValueKind::Text => value(raw),
        ValueKind::List => {
            let mut items = Array::new();
            for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                items.push(item);
            }
            value(items)
        }
    };

    let rendered = doc.to_string();
    toml::from_str::<Config>(&rendered).map_err(|e| FreshenError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| FreshenError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    fs::write(path, rendered)
        .await
        .map_err(|e| FreshenError::io(format!("writing {}", path.display()), e))
}

fn parse_bool(value: &str) -> FreshenResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(FreshenError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_integer(value: &str) -> FreshenResult<i64> {
    value
        .parse::<u32>()
        .map(i64::from)
        .map_err(|_| FreshenError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purge::PurgePolicy;
    use tempfile::TempDir;

    #[tokio::test]
    async fn set_preserves_comments() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("freshen.toml");
        std::fs::write(
            &path,
            "# kiosk settings\n[reconcile]\n# poll slowly\npoll_interval_secs = 300\n",
        )
        .unwrap();

        set_value(&path, "reconcile.force_update", "true").await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("# kiosk settings"));
        assert!(written.contains("# poll slowly"));
        let config: Config = toml::from_str(&written).unwrap();
        assert!(config.reconcile.force_update);
        assert_eq!(config.reconcile.poll_interval_secs, 300);
    }

    #[tokio::test]
    async fn set_creates_missing_file_and_lists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        set_value(&path, "purge.policy", "preserve_auth").await.unwrap();
        set_value(&path, "purge.preserve_keys", "tablePageSize, locale")
            .await
            .unwrap();

        let config: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.purge.policy, PurgePolicy::PreserveAuth);
        assert_eq!(config.purge.preserve_keys, vec!["tablePageSize", "locale"]);
    }

    #[tokio::test]
    async fn unknown_key_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let err = set_value(&path, "vm.name", "x").await.unwrap_err();
        assert!(matches!(err, FreshenError::ConfigKeyUnknown(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn invalid_value_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[purge]\npolicy = \"clear_all\"\n").unwrap();

        let err = set_value(&path, "purge.policy", "shred").await.unwrap_err();
        assert!(matches!(err, FreshenError::ConfigInvalid { .. }));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[purge]\npolicy = \"clear_all\"\n"
        );
    }

    #[test]
    fn parse_bool_values() {
        assert!(parse_bool("yes").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
