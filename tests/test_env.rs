use assert_cmd::Command;
use std::fs;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;

pub fn lock_test_env() -> MutexGuard<'static, ()> {
    static TEST_ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    TEST_ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner())
}

/// Temporary HOME with an rc file pointing at a fresh database
pub struct TestEnv {
    pub temp_dir: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_rc("")
    }

    /// Extra rc lines are appended after `data.location`
    pub fn with_rc(extra: &str) -> Self {
        let guard = lock_test_env();
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let config_dir = temp_dir.path().join(".leadboard");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("rc"),
            format!("data.location={}\n{}", db_path.display(), extra),
        )
        .unwrap();
        Self {
            temp_dir,
            _guard: guard,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("leadboard").unwrap();
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write leads JSON into the temp dir and import it
    pub fn import(&self, json: &str) {
        let path = self.temp_dir.path().join("leads.json");
        fs::write(&path, json).unwrap();
        self.cmd()
            .args(["import", path.to_str().unwrap()])
            .assert()
            .success();
    }
}
