use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::course_repository::CourseRepository;
use crate::db::repositories::task_repository::{TaskRepository, TaskRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::task::{TaskCreateInput, TaskRecord, TaskUpdateInput};
use crate::services::settings_service::touch_last_updated;

pub const VALID_STATUSES: &[&str] = &["todo", "in-progress", "done"];
pub const VALID_PRIORITIES: &[&str] = &["low", "medium", "high"];

const DEFAULT_STATUS: &str = "todo";
const DEFAULT_PRIORITY: &str = "medium";

#[derive(Clone)]
pub struct TaskService {
    db: DbPool,
}

impl TaskService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_task(&self, input: TaskCreateInput) -> AppResult<TaskRecord> {
        let now = Utc::now().to_rfc3339();
        let record = TaskRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: normalize_title(&input.title)?,
            description: normalize_optional_string(input.description),
            course_id: normalize_optional_string(input.course_id),
            status: normalize_status(input.status)?,
            priority: normalize_priority(input.priority)?,
            created_at: now.clone(),
            updated_at: now,
        };

        let row = TaskRow::from_record(&record);
        self.db.with_transaction(|tx| {
            ensure_course_exists(tx, record.course_id.as_deref())?;
            TaskRepository::insert(tx, &row)?;
            touch_last_updated(tx)?;
            Ok(())
        })?;
        info!(target: "app::tasks", task_id = %record.id, "task created");
        Ok(record)
    }

    pub fn update_task(&self, id: &str, update: TaskUpdateInput) -> AppResult<TaskRecord> {
        let mut existing = self.get_task(id)?;

        if let Some(title) = update.title.as_deref() {
            existing.title = normalize_title(title)?;
        }
        if let Some(description) = update.description {
            existing.description = normalize_optional_string(description);
        }
        if let Some(course_id) = update.course_id {
            existing.course_id = normalize_optional_string(course_id);
        }
        if update.status.is_some() {
            existing.status = normalize_status(update.status)?;
        }
        if update.priority.is_some() {
            existing.priority = normalize_priority(update.priority)?;
        }
        existing.updated_at = Utc::now().to_rfc3339();

        let row = TaskRow::from_record(&existing);
        self.db.with_transaction(|tx| {
            ensure_course_exists(tx, existing.course_id.as_deref())?;
            TaskRepository::update(tx, &row)?;
            touch_last_updated(tx)?;
            Ok(())
        })?;
        info!(target: "app::tasks", task_id = %existing.id, status = %existing.status, "task updated");
        Ok(existing)
    }

    pub fn delete_task(&self, id: &str) -> AppResult<()> {
        self.db.with_transaction(|tx| {
            TaskRepository::delete(tx, id)?;
            touch_last_updated(tx)?;
            Ok(())
        })?;
        info!(target: "app::tasks", task_id = %id, "task deleted");
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> AppResult<TaskRecord> {
        let row = self
            .db
            .with_connection(|conn| TaskRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?;
        Ok(row.into_record())
    }

    /// All tasks, or only the column matching `status`.
    pub fn list_tasks(&self, status: Option<&str>) -> AppResult<Vec<TaskRecord>> {
        let rows = match status {
            Some(raw) => {
                let status = normalize_status(Some(raw.to_string()))?;
                self.db
                    .with_connection(|conn| TaskRepository::list_by_status(conn, &status))?
            }
            None => self.db.with_connection(TaskRepository::list_all)?,
        };
        let tasks: Vec<TaskRecord> = rows.into_iter().map(TaskRow::into_record).collect();
        debug!(target: "app::tasks", count = tasks.len(), "tasks listed");
        Ok(tasks)
    }
}

/// Checks a task that arrives whole, as in a profile import.
pub(crate) fn validate_record(record: &TaskRecord) -> AppResult<()> {
    normalize_title(&record.title)?;
    if !VALID_STATUSES.contains(&record.status.as_str()) {
        return Err(AppError::validation_with_details(
            "unknown task status",
            json!({"taskId": record.id, "status": record.status}),
        ));
    }
    if !VALID_PRIORITIES.contains(&record.priority.as_str()) {
        return Err(AppError::validation_with_details(
            "unknown task priority",
            json!({"taskId": record.id, "priority": record.priority}),
        ));
    }
    Ok(())
}

fn ensure_course_exists(conn: &Connection, course_id: Option<&str>) -> AppResult<()> {
    let Some(course_id) = course_id else {
        return Ok(());
    };
    if CourseRepository::find_by_id(conn, course_id)?.is_none() {
        return Err(AppError::validation_with_details(
            "task refers to an unknown course",
            json!({"courseId": course_id}),
        ));
    }
    Ok(())
}

fn normalize_title(title: &str) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("task title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn normalize_status(status: Option<String>) -> AppResult<String> {
    let Some(raw) = status else {
        return Ok(DEFAULT_STATUS.to_string());
    };
    let normalized = raw.trim().to_lowercase().replace('_', "-");
    if VALID_STATUSES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(AppError::validation_with_details(
            "unknown task status",
            json!({"status": raw, "allowed": VALID_STATUSES}),
        ))
    }
}

fn normalize_priority(priority: Option<String>) -> AppResult<String> {
    let Some(raw) = priority else {
        return Ok(DEFAULT_PRIORITY.to_string());
    };
    let normalized = raw.trim().to_lowercase();
    if VALID_PRIORITIES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(AppError::validation_with_details(
            "unknown task priority",
            json!({"priority": raw, "allowed": VALID_PRIORITIES}),
        ))
    }
}
