use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::task::TaskRecord;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        title,
        description,
        course_id,
        status,
        priority,
        created_at,
        updated_at
    FROM tasks
"#;

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub course_id: Option<String>,
    pub status: String,
    pub priority: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            course_id: record.course_id.clone(),
            status: record.status.clone(),
            priority: record.priority.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> TaskRecord {
        TaskRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            course_id: self.course_id,
            status: self.status,
            priority: self.priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<&Row<'_>> for TaskRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(TaskRow {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            course_id: row.get("course_id")?,
            status: row.get("status")?,
            priority: row.get("priority")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct TaskRepository;

impl TaskRepository {
    pub fn insert(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO tasks (
                    id,
                    title,
                    description,
                    course_id,
                    status,
                    priority,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :title,
                    :description,
                    :course_id,
                    :status,
                    :priority,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":course_id": &row.course_id,
                ":status": &row.status,
                ":priority": &row.priority,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &TaskRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE tasks SET
                    title = :title,
                    description = :description,
                    course_id = :course_id,
                    status = :status,
                    priority = :priority,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":title": &row.title,
                ":description": &row.description,
                ":course_id": &row.course_id,
                ":status": &row.status,
                ":priority": &row.priority,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn delete_all(conn: &Connection) -> AppResult<usize> {
        Ok(conn.execute("DELETE FROM tasks", [])?)
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<TaskRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| TaskRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<TaskRow>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at ASC, id ASC", BASE_SELECT))?;
        let rows = stmt
            .query_map([], |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn list_by_status(conn: &Connection, status: &str) -> AppResult<Vec<TaskRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = ?1 ORDER BY created_at ASC, id ASC",
            BASE_SELECT
        ))?;
        let rows = stmt
            .query_map([status], |row| TaskRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
