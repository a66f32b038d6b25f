use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::course_repository::{CourseRepository, CourseRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::course::{
    CourseCreateInput, CourseRecord, CourseUpdateInput, DEFAULT_DIFFICULTY, DEFAULT_IMPORTANCE,
};
use crate::services::settings_service::touch_last_updated;

const MAX_NAME_LENGTH: usize = 120;

#[derive(Clone)]
pub struct CourseService {
    db: DbPool,
}

impl CourseService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create_course(&self, input: CourseCreateInput) -> AppResult<CourseRecord> {
        let now = Utc::now().to_rfc3339();
        let record = CourseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: normalize_name(&input.name)?,
            exam_date: input.exam_date,
            importance: input.importance.unwrap_or(DEFAULT_IMPORTANCE),
            difficulty: input.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
            time_studied_so_far: 0.0,
            created_at: now.clone(),
            updated_at: now,
        };
        validate_record(&record)?;

        let row = CourseRow::from_record(&record);
        self.db.with_transaction(|tx| {
            CourseRepository::insert(tx, &row)?;
            touch_last_updated(tx)?;
            Ok(())
        })?;
        info!(target: "app::courses", course_id = %record.id, "course created");
        Ok(record)
    }

    pub fn update_course(&self, id: &str, update: CourseUpdateInput) -> AppResult<CourseRecord> {
        let mut existing = self.get_course(id)?;

        if let Some(name) = update.name.as_deref() {
            existing.name = normalize_name(name)?;
        }
        if let Some(exam_date) = update.exam_date {
            existing.exam_date = exam_date;
        }
        if let Some(importance) = update.importance {
            existing.importance = importance;
        }
        if let Some(difficulty) = update.difficulty {
            existing.difficulty = difficulty;
        }
        existing.updated_at = Utc::now().to_rfc3339();
        validate_record(&existing)?;

        let row = CourseRow::from_record(&existing);
        self.db.with_transaction(|tx| {
            CourseRepository::update(tx, &row)?;
            touch_last_updated(tx)?;
            Ok(())
        })?;
        info!(target: "app::courses", course_id = %existing.id, "course updated");
        Ok(existing)
    }

    /// Linked tasks go with the course.
    pub fn delete_course(&self, id: &str) -> AppResult<()> {
        self.db.with_transaction(|tx| {
            CourseRepository::delete(tx, id)?;
            touch_last_updated(tx)?;
            Ok(())
        })?;
        info!(target: "app::courses", course_id = %id, "course deleted");
        Ok(())
    }

    pub fn get_course(&self, id: &str) -> AppResult<CourseRecord> {
        let row = self
            .db
            .with_connection(|conn| CourseRepository::find_by_id(conn, id))?
            .ok_or_else(AppError::not_found)?;
        row.into_record()
    }

    pub fn list_courses(&self) -> AppResult<Vec<CourseRecord>> {
        let rows = self.db.with_connection(CourseRepository::list_all)?;
        let courses = rows
            .into_iter()
            .map(CourseRow::into_record)
            .collect::<AppResult<Vec<_>>>()?;
        debug!(target: "app::courses", count = courses.len(), "courses listed");
        Ok(courses)
    }

    /// Adds a finished study stint to the course's running total.
    pub fn record_study_time(&self, id: &str, hours: f64) -> AppResult<CourseRecord> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(AppError::validation_with_details(
                "studied hours must be a positive number",
                json!({"hours": hours}),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let row = self.db.with_transaction(|tx| {
            CourseRepository::add_study_time(tx, id, hours, &now)?;
            touch_last_updated(tx)?;
            CourseRepository::find_by_id(tx, id)?.ok_or_else(AppError::not_found)
        })?;
        let record = row.into_record()?;
        info!(
            target: "app::courses",
            course_id = %record.id,
            hours,
            total = record.time_studied_so_far,
            "study time recorded"
        );
        Ok(record)
    }
}

pub(crate) fn validate_record(record: &CourseRecord) -> AppResult<()> {
    if !(1..=5).contains(&record.importance) {
        return Err(AppError::validation_with_details(
            "importance must be between 1 and 5",
            json!({"importance": record.importance}),
        ));
    }
    if !(1..=5).contains(&record.difficulty) {
        return Err(AppError::validation_with_details(
            "difficulty must be between 1 and 5",
            json!({"difficulty": record.difficulty}),
        ));
    }
    if !record.time_studied_so_far.is_finite() || record.time_studied_so_far < 0.0 {
        return Err(AppError::validation_with_details(
            "time studied cannot be negative",
            json!({"timeStudiedSoFar": record.time_studied_so_far}),
        ));
    }
    Ok(())
}

fn normalize_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("course name cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation_with_details(
            "course name is too long",
            json!({"maxLength": MAX_NAME_LENGTH}),
        ));
    }
    Ok(trimmed.to_string())
}
