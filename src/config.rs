//! Configuration file handling
//!
//! Settings live in `~/.leadboard/rc` as `key=value` lines. Blank lines and
//! lines starting with `#` are skipped; unknown keys are ignored.
//!
//! | key                      | meaning                                        |
//! |--------------------------|------------------------------------------------|
//! | `data.location`          | database path, relative to the rc directory    |
//! | `pipeline.success_stage` | stage counted as a conversion                  |
//! | `pipeline.on_fetch_error`| `clear` or `retain` the leads on fetch failure |
//! | `launch.opener`          | command used to open tel/mailto/sms URIs       |
//! | `log.level`              | default log filter when `RUST_LOG` is unset    |

use crate::models::DEFAULT_SUCCESS_STAGE;
use crate::pipeline::FetchFailurePolicy;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub data_location: PathBuf,
    pub success_stage: String,
    pub on_fetch_error: FetchFailurePolicy,
    pub opener: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Directory holding the rc file and the default database
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".leadboard"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("rc"))
    }

    /// Load from the default rc file; missing file means defaults
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::defaults(&Self::config_dir()?));
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&content, &base).map_err(anyhow::Error::msg)
    }

    fn defaults(base: &Path) -> Self {
        Self {
            data_location: base.join("leads.db"),
            success_stage: DEFAULT_SUCCESS_STAGE.to_string(),
            on_fetch_error: FetchFailurePolicy::default(),
            opener: None,
            log_level: "warn".to_string(),
        }
    }

    /// Parse rc content. Relative `data.location` paths resolve against `base`.
    pub fn parse(content: &str, base: &Path) -> Result<Self, String> {
        let mut config = Self::defaults(base);
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "data.location" => {
                    let path = PathBuf::from(value);
                    config.data_location = if path.is_relative() { base.join(path) } else { path };
                }
                "pipeline.success_stage" => config.success_stage = value.to_string(),
                "pipeline.on_fetch_error" => {
                    config.on_fetch_error = FetchFailurePolicy::from_str(value).ok_or_else(|| {
                        format!(
                            "Invalid pipeline.on_fetch_error: '{}'. Expected 'clear' or 'retain'",
                            value
                        )
                    })?;
                }
                "launch.opener" => {
                    config.opener = if value.is_empty() { None } else { Some(value.to_string()) };
                }
                "log.level" => config.log_level = value.to_string(),
                other => log::debug!("Ignoring unknown config key '{}'", other),
            }
        }
        Ok(config)
    }
}
