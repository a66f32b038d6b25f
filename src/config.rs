use std::fs;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

pub const CONFIG_FILE_NAME: &str = "studyplan.yaml";
pub const DEFAULT_LOG_DIRECTIVES: &str = "info,app::planning=debug,app::db=info";

const ENV_DATA_DIR: &str = "STUDYPLAN_DATA_DIR";
const ENV_TIMEZONE: &str = "STUDYPLAN_TIMEZONE";
const ENV_LOG: &str = "STUDYPLAN_LOG";

/// Process-level configuration. Study settings live in the database, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default = "default_log_directives")]
    pub log_directives: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            log_directives: default_log_directives(),
            timezone: default_timezone(),
        }
    }
}

impl AppConfig {
    /// Reads `studyplan.yaml` from `dir` when present, then applies env overrides.
    pub fn load_from_dir(dir: &Path) -> AppResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let parsed = Self::from_yaml(&raw)?;
            info!(target: "app::config", path = %path.display(), "configuration loaded");
            parsed
        } else {
            debug!(target: "app::config", path = %path.display(), "no config file, using defaults");
            Self {
                data_dir: dir.to_path_buf(),
                ..Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> AppResult<Self> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| AppError::config(format!("unknown timezone {}: {err}", self.timezone)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(tz) = std::env::var(ENV_TIMEZONE) {
            if !tz.trim().is_empty() {
                self.timezone = tz.trim().to_string();
            }
        }
        if let Ok(directives) = std::env::var(ENV_LOG) {
            if !directives.trim().is_empty() {
                self.log_directives = directives;
            }
        }
    }

    fn validate(&self) -> AppResult<()> {
        if self.database_file.trim().is_empty() {
            return Err(AppError::config("databaseFile must not be empty"));
        }
        self.tz()?;
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_database_file() -> String {
    "studyplan.sqlite".to_string()
}

fn default_log_directives() -> String {
    DEFAULT_LOG_DIRECTIVES.to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}
