//! Integration tests for Freshen

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const SHELL: &str = "<!doctype html>\n<html>\n<head>\n<!-- VERSION_INJECT_START -->\n<!-- VERSION_INJECT_END -->\n</head>\n<body></body>\n</html>\n";

    /// Workspace with an isolated config, profile and state dir
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let profile = dir.path().join("profile");
            fs::write(
                dir.path().join("config.toml"),
                format!(
                    "[general]\naudit_log = false\n\n[profile]\ndir = '{}'\n",
                    profile.display()
                ),
            )
            .unwrap();
            fs::create_dir_all(dir.path().join("dist")).unwrap();
            fs::write(dir.path().join("dist").join("index.html"), SHELL).unwrap();
            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn file(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn freshen(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("freshen");
            cmd.current_dir(self.path())
                .arg("--config")
                .arg(self.file("config.toml"))
                .arg("--no-local")
                .env("FRESHEN_NON_INTERACTIVE", "1")
                .env("HOME", self.path())
                .env("XDG_STATE_HOME", self.file("state"))
                .env("XDG_DATA_HOME", self.file("data"))
                .env_remove("FRESHEN_CONFIG");
            cmd
        }

        fn publish(&self) {
            self.freshen()
                .args(["publish", "--revision", "abc123"])
                .assert()
                .success();
        }

        fn published_version(&self) -> String {
            let manifest: serde_json::Value = serde_json::from_str(
                &fs::read_to_string(self.file("dist/version.json")).unwrap(),
            )
            .unwrap();
            manifest["version"].as_str().unwrap().to_string()
        }
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("freshen")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache reconciliation"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("freshen")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("freshen"));
    }

    #[test]
    fn publish_writes_manifest_and_shell() {
        let ws = Workspace::new();
        ws.publish();

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ws.file("dist/version.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["gitCommit"], "abc123");
        assert!(manifest["buildDate"].as_str().unwrap().ends_with('Z'));

        let shell = fs::read_to_string(ws.file("dist/index.html")).unwrap();
        let version = ws.published_version();
        assert!(shell.contains(&format!("window.__APP_VERSION__ = \"{}\"", version)));
        assert!(shell.contains("window.__BUILD_TIME__"));
    }

    #[test]
    fn republish_replaces_block() {
        let ws = Workspace::new();
        ws.publish();
        let first = ws.published_version();
        ws.publish();
        let second = ws.published_version();

        assert!(second.parse::<u64>().unwrap() > first.parse::<u64>().unwrap());
        let shell = fs::read_to_string(ws.file("dist/index.html")).unwrap();
        assert_eq!(shell.matches("window.__APP_VERSION__").count(), 1);
        assert!(shell.contains(&second));
    }

    #[test]
    fn publish_without_placeholder_fails() {
        let ws = Workspace::new();
        fs::write(ws.file("dist/index.html"), "<html><head></head></html>").unwrap();

        ws.freshen()
            .args(["publish", "--revision", "abc123"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("VERSION_INJECT_START"));
        assert!(!ws.file("dist/version.json").exists());
    }

    #[test]
    fn publish_dry_run_writes_nothing() {
        let ws = Workspace::new();

        ws.freshen()
            .args(["publish", "--revision", "abc123", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"gitCommit\": \"abc123\""));
        assert!(!ws.file("dist/version.json").exists());
        assert_eq!(fs::read_to_string(ws.file("dist/index.html")).unwrap(), SHELL);
    }

    #[test]
    fn check_reports_update_with_exit_code() {
        let ws = Workspace::new();
        ws.publish();
        fs::write(
            ws.file("latest.json"),
            r#"{"version":"99999999999999","buildDate":"2030-01-01T00:00:00.000Z","gitCommit":"def456"}"#,
        )
        .unwrap();

        ws.freshen()
            .args(["check", "--source", "latest.json"])
            .assert()
            .code(10)
            .stdout(predicate::str::contains("99999999999999"));
    }

    #[test]
    fn check_current_build_is_fresh() {
        let ws = Workspace::new();
        ws.publish();

        ws.freshen()
            .args(["check", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"updateAvailable\": false"));
    }

    #[test]
    fn check_dismissed_version_is_quiet() {
        let ws = Workspace::new();
        ws.publish();
        fs::write(
            ws.file("latest.json"),
            r#"{"version":"99999999999999","buildDate":"2030-01-01T00:00:00.000Z","gitCommit":"def456"}"#,
        )
        .unwrap();

        ws.freshen()
            .args(["ack", "set", "99999999999999"])
            .assert()
            .success();
        ws.freshen()
            .args(["check", "--source", "latest.json"])
            .assert()
            .success();
    }

    #[test]
    fn check_unpublished_shell_fails() {
        let ws = Workspace::new();

        ws.freshen()
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("freshen publish"));
    }

    #[test]
    fn purge_clears_profile() {
        let ws = Workspace::new();
        let profile = ws.file("profile");
        fs::create_dir_all(profile.join("caches").join("api-v1")).unwrap();
        fs::write(
            profile.join("local.json"),
            r#"{"token":"jwt","tablePageSize":"20","app_version_ack":"1"}"#,
        )
        .unwrap();

        ws.freshen().args(["purge", "--yes"]).assert().success();

        let local: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(profile.join("local.json")).unwrap())
                .unwrap();
        assert_eq!(local, serde_json::json!({}));
        assert!(!profile.join("caches").join("api-v1").exists());
    }

    #[test]
    fn purge_preserve_auth_keeps_token() {
        let ws = Workspace::new();
        let profile = ws.file("profile");
        fs::create_dir_all(&profile).unwrap();
        fs::write(
            profile.join("local.json"),
            r#"{"token":"jwt","tablePageSize":"20"}"#,
        )
        .unwrap();

        ws.freshen()
            .args(["purge", "--yes", "--policy", "preserve-auth"])
            .assert()
            .success();

        let local: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(profile.join("local.json")).unwrap())
                .unwrap();
        assert_eq!(local, serde_json::json!({ "token": "jwt" }));
    }

    #[test]
    fn purge_without_yes_is_cancelled() {
        let ws = Workspace::new();
        let profile = ws.file("profile");
        fs::create_dir_all(&profile).unwrap();
        fs::write(profile.join("local.json"), r#"{"token":"jwt"}"#).unwrap();

        ws.freshen()
            .arg("purge")
            .assert()
            .success()
            .stdout(predicate::str::contains("cancelled"));
        assert!(fs::read_to_string(profile.join("local.json"))
            .unwrap()
            .contains("jwt"));
    }

    #[test]
    fn ack_roundtrip() {
        let ws = Workspace::new();

        ws.freshen()
            .args(["ack", "set", "1717171717171"])
            .assert()
            .success();
        ws.freshen()
            .args(["ack", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1717171717171"));
        ws.freshen().args(["ack", "clear"]).assert().success();
        ws.freshen()
            .args(["ack", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No version acknowledged"));
    }

    #[test]
    fn status_json_lists_profile() {
        let ws = Workspace::new();
        ws.publish();

        ws.freshen()
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"purgePolicy\": \"clear_all\""));
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.freshen()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.freshen()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[reconcile]"))
            .stdout(predicate::str::contains("audit_log = false"));
    }

    #[test]
    fn config_set_local_writes_project_file() {
        let ws = Workspace::new();

        ws.freshen()
            .args(["config", "set", "reconcile.poll_interval_secs", "300", "--local"])
            .assert()
            .success();

        let local = fs::read_to_string(ws.file("freshen.toml")).unwrap();
        assert!(local.contains("poll_interval_secs = 300"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let ws = Workspace::new();

        ws.freshen()
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("vm.name"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("freshen")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("freshen"));
    }

    #[test]
    fn missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        cargo_bin_cmd!("freshen")
            .current_dir(temp.path())
            .args(["--config", "absent.toml", "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("absent.toml"));
    }
}
