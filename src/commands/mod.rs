pub mod actions;
pub mod course;
pub mod planning;
pub mod profile;
pub mod settings;
pub mod task;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::course_service::CourseService;
use crate::services::planning_service::PlanningService;
use crate::services::profile_sync::ProfileSyncService;
use crate::services::settings_service::SettingsService;
use crate::services::task_service::TaskService;
use crate::utils::clock::{Clock, SystemClock};

/// Single owner of every service; all mutations go through it.
#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    settings_service: Arc<SettingsService>,
    course_service: Arc<CourseService>,
    task_service: Arc<TaskService>,
    planning_service: Arc<PlanningService>,
    profile_service: Arc<ProfileSyncService>,
}

impl AppState {
    pub fn new(db_pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        let settings_service = Arc::new(SettingsService::new(db_pool.clone()));
        let course_service = Arc::new(CourseService::new(db_pool.clone()));
        let task_service = Arc::new(TaskService::new(db_pool.clone()));
        let planning_service = Arc::new(PlanningService::new(
            db_pool.clone(),
            Arc::clone(&settings_service),
            clock,
        ));
        let profile_service = Arc::new(ProfileSyncService::new(
            db_pool.clone(),
            Arc::clone(&settings_service),
        ));

        Self {
            db_pool,
            settings_service,
            course_service,
            task_service,
            planning_service,
            profile_service,
        }
    }

    /// Logging, database and wall clock from `config`.
    pub fn bootstrap(config: &AppConfig) -> AppResult<Self> {
        crate::utils::logger::init_logging(config)?;

        let clock = SystemClock::new(config.tz()?);
        let db_pool = DbPool::new(config.database_path())?;
        info!(
            target: "app::state",
            data_dir = %config.data_dir.display(),
            timezone = %config.timezone,
            "application state ready"
        );
        Ok(Self::new(db_pool, Arc::new(clock)))
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.course_service)
    }

    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.task_service)
    }

    pub fn planning(&self) -> Arc<PlanningService> {
        Arc::clone(&self.planning_service)
    }

    pub fn profile(&self) -> Arc<ProfileSyncService> {
        Arc::clone(&self.profile_service)
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Runs a service call on behalf of a named command and converts its error.
pub(crate) fn run_command<T>(
    command: &'static str,
    task: impl FnOnce() -> AppResult<T>,
) -> CommandResult<T> {
    debug!(target: "app::command", command, "command invoked");
    task().map_err(|err| {
        debug!(target: "app::command", command, error = %err, "command failed");
        CommandError::from(err)
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => {
                CommandError::new("NOT_FOUND", "the requested record does not exist", None)
            }
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::StaleRevision { expected, actual } => {
                warn!(target: "app::command", expected, actual, "stale revision in command");
                CommandError::new(
                    "STALE_REVISION",
                    "the plan was changed elsewhere, reload it and try again",
                    Some(serde_json::json!({ "expected": expected, "actual": actual })),
                )
            }
            AppError::Config(message) => {
                error!(target: "app::command", %message, "configuration error in command");
                CommandError::new("CONFIG_ERROR", message, None)
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "failed to encode or decode data", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "file system access failed", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
