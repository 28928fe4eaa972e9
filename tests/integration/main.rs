//! Integration tests for Ailloy

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Command isolated from the user's config, cache, and working directory
    fn ailloy(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("ailloy");
        cmd.current_dir(temp.path())
            .env("AILLOY_CONFIG", temp.path().join("no-such-config.toml"))
            .env("AILLOY_CACHE_DIR", temp.path().join("cache"));
        cmd
    }

    const LOCK: &str = r#"apiVersion = "v1"

[[molds]]
name = "widget"
source = "github.com/acme/widget"
version = "v1.2.0"
commit = "0123456789abcdef"
timestamp = "2026-01-02T03:04:05Z"
"#;

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("mold"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("ailloy"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached molds"));
    }

    #[test]
    fn cache_list_json_empty() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn cache_list_shows_versions() {
        let temp = TempDir::new().unwrap();
        let repo = temp.path().join("cache/github.com/acme/widget");
        fs::create_dir_all(repo.join("git")).unwrap();
        fs::create_dir_all(repo.join("v1.0.0")).unwrap();
        fs::create_dir_all(repo.join("v1.1.0")).unwrap();

        ailloy(&temp)
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("github.com/acme/widget\n"));

        ailloy(&temp)
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("v1.0.0, v1.1.0"));
    }

    #[test]
    fn cache_clean_requires_target() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp).args(["cache", "clean"]).assert().failure();
    }

    #[test]
    fn cache_clean_removes_one_repo() {
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache/github.com/acme");
        fs::create_dir_all(cache.join("widget/v1.0.0")).unwrap();
        fs::create_dir_all(cache.join("other/v2.0.0")).unwrap();

        ailloy(&temp)
            .args(["cache", "clean", "github.com/acme/widget@v1.0.0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("removed github.com/acme/widget"));

        assert!(!cache.join("widget").exists());
        assert!(cache.join("other/v2.0.0").exists());
    }

    #[test]
    fn cache_clean_all_with_yes() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("cache/github.com/acme/widget/v1.0.0")).unwrap();

        ailloy(&temp)
            .args(["cache", "clean", "--all", "--yes"])
            .assert()
            .success();

        assert!(temp.path().join("cache").exists());
        assert_eq!(fs::read_dir(temp.path().join("cache")).unwrap().count(), 0);
    }

    #[test]
    fn cache_clean_refuses_escaping_reference() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("cache")).unwrap();
        fs::create_dir_all(temp.path().join("precious")).unwrap();

        ailloy(&temp)
            .args(["cache", "clean", "a/../../precious"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("escapes"));

        assert!(temp.path().join("precious").exists());
    }

    #[test]
    fn fetch_rejects_malformed_reference() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .args(["fetch", "not-a-reference"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid mold reference"));
    }

    #[test]
    fn lock_list_without_file() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .args(["lock", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No lock file entries"));
    }

    #[test]
    fn lock_list_shows_entries() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ailloy.lock"), LOCK).unwrap();

        ailloy(&temp)
            .args(["lock", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("github.com/acme/widget@v1.2.0\n"));
    }

    #[test]
    fn lock_remove_unpins_entry() {
        let temp = TempDir::new().unwrap();
        let lock = temp.path().join("custom.lock");
        fs::write(&lock, LOCK).unwrap();

        ailloy(&temp)
            .arg("--lockfile")
            .arg(&lock)
            .args(["lock", "remove", "github.com/acme/widget"])
            .assert()
            .success()
            .stdout(predicate::str::contains("unpinned github.com/acme/widget"));

        let content = fs::read_to_string(&lock).unwrap();
        assert!(content.contains("apiVersion = \"v1\""));
        assert!(!content.contains("github.com/acme/widget"));
    }

    #[test]
    fn lock_remove_without_file_fails() {
        let temp = TempDir::new().unwrap();
        ailloy(&temp)
            .args(["lock", "remove", "github.com/acme/widget"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No lock file"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        fs::write(&config, "[cache\nroot = 1").unwrap();

        ailloy(&temp)
            .env("AILLOY_CONFIG", &config)
            .args(["cache", "list"])
            .assert()
            .failure();
    }
}
