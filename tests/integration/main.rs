//! Integration tests for scaffold-cache
//!
//! Every test points the binary at a throwaway config and cache directory,
//! with the template URL aimed at a closed local port.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const UNREACHABLE_URL: &str = "http://127.0.0.1:9/template.zip";

    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = format!(
                r#"
[cache]
dir = "{}"
lock_wait_ms = 500
lock_poll_ms = 20

[sources]
template_url = "{}"
request_timeout_secs = 2
"#,
                dir.path().join("cache").display(),
                UNREACHABLE_URL
            );
            std::fs::write(dir.path().join("config.toml"), config).unwrap();
            Self { dir }
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn cache_dir(&self) -> PathBuf {
            self.dir.path().join("cache")
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("scaffold-cache");
            cmd.arg("--config")
                .arg(self.config_path())
                .env_remove("SCAFFOLD_CACHE_TTL_MS");
            cmd
        }

        /// Lay out a cache as a previous successful download would
        fn seed(&self) {
            let cache = self.cache_dir();
            seed_cache(&cache);
        }
    }

    fn seed_cache(cache: &Path) {
        std::fs::create_dir_all(cache.join("web-template")).unwrap();
        std::fs::write(cache.join("web-template/PROMPT.md"), "# Seeded prompt\n").unwrap();
        std::fs::create_dir_all(cache.join("openapi")).unwrap();
        std::fs::write(cache.join("openapi/auth.json"), "{}").unwrap();
        let now = chrono::Utc::now().timestamp_millis();
        std::fs::write(
            cache.join("metadata.json"),
            format!(r#"{{"timestamp":{}}}"#, now),
        )
        .unwrap();
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("scaffold-cache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("project templates"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("scaffold-cache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("scaffold-cache"));
    }

    #[test]
    fn config_path() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[sources]"))
            .stdout(predicate::str::contains(UNREACHABLE_URL));
    }

    #[test]
    fn invalid_config_fails_with_hint() {
        let sandbox = Sandbox::new();
        std::fs::write(sandbox.config_path(), "[cache\n").unwrap();
        sandbox
            .cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("Hint:"))
            .stderr(predicate::str::contains("usually temporary").not());
    }

    #[test]
    fn prompt_falls_back_when_offline() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("prompt")
            .assert()
            .success()
            .stdout(predicate::str::contains("could not be downloaded"));
        assert!(!sandbox.cache_dir().join("metadata.json").exists());
    }

    #[test]
    fn prompt_uses_fresh_cache() {
        let sandbox = Sandbox::new();
        sandbox.seed();
        sandbox
            .cmd()
            .arg("prompt")
            .assert()
            .success()
            .stdout(predicate::str::contains("# Seeded prompt"));
    }

    #[test]
    fn fetch_fails_when_template_unreachable() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("fetch")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("usually temporary"));
        assert!(!sandbox.cache_dir().join("metadata.json").exists());
        assert!(!sandbox.cache_dir().join(".download.lock").exists());
    }

    #[test]
    fn fetch_serves_fresh_cache_as_json() {
        let sandbox = Sandbox::new();
        sandbox.seed();
        sandbox
            .cmd()
            .args(["fetch", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"template_dir\""))
            .stdout(predicate::str::contains("auth.json"));
    }

    #[test]
    fn expired_cache_is_not_served() {
        let sandbox = Sandbox::new();
        sandbox.seed();
        sandbox
            .cmd()
            .env("SCAFFOLD_CACHE_TTL_MS", "0")
            .arg("fetch")
            .assert()
            .failure();
    }

    #[test]
    fn status_reports_fresh_cache() {
        let sandbox = Sandbox::new();
        sandbox.seed();
        sandbox
            .cmd()
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"valid\": true"))
            .stdout(predicate::str::contains("\"ttl_ms\": 86400000"));
    }

    #[test]
    fn status_on_empty_cache() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("never"));
    }

    #[test]
    fn clear_removes_cache() {
        let sandbox = Sandbox::new();
        sandbox.seed();
        sandbox.cmd().arg("clear").assert().success();

        let cache = sandbox.cache_dir();
        assert!(!cache.join("web-template").exists());
        assert!(!cache.join("openapi").exists());
        assert!(!cache.join("metadata.json").exists());
    }
}
