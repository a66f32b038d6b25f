use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::course::CourseRecord;
use crate::services::schedule_utils;

const BASE_SELECT: &str = r#"
    SELECT
        id,
        name,
        exam_date,
        importance,
        difficulty,
        time_studied_so_far,
        created_at,
        updated_at
    FROM courses
"#;

#[derive(Debug, Clone)]
pub struct CourseRow {
    pub id: String,
    pub name: String,
    pub exam_date: Option<String>,
    pub importance: i64,
    pub difficulty: i64,
    pub time_studied_so_far: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl CourseRow {
    pub fn from_record(record: &CourseRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            exam_date: record.exam_date.map(schedule_utils::format_date),
            importance: i64::from(record.importance),
            difficulty: i64::from(record.difficulty),
            time_studied_so_far: record.time_studied_so_far,
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<CourseRecord> {
        let exam_date = match self.exam_date.as_deref() {
            Some(raw) if !raw.is_empty() => Some(parse_stored_date(raw)?),
            _ => None,
        };

        Ok(CourseRecord {
            id: self.id,
            name: self.name,
            exam_date,
            importance: narrow_factor(self.importance)?,
            difficulty: narrow_factor(self.difficulty)?,
            time_studied_so_far: self.time_studied_so_far,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for CourseRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(CourseRow {
            id: row.get("id")?,
            name: row.get("name")?,
            exam_date: row.get("exam_date")?,
            importance: row.get("importance")?,
            difficulty: row.get("difficulty")?,
            time_studied_so_far: row.get("time_studied_so_far")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct CourseRepository;

impl CourseRepository {
    pub fn insert(conn: &Connection, row: &CourseRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO courses (
                    id,
                    name,
                    exam_date,
                    importance,
                    difficulty,
                    time_studied_so_far,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :name,
                    :exam_date,
                    :importance,
                    :difficulty,
                    :time_studied_so_far,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":exam_date": &row.exam_date,
                ":importance": row.importance,
                ":difficulty": row.difficulty,
                ":time_studied_so_far": row.time_studied_so_far,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, row: &CourseRow) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE courses SET
                    name = :name,
                    exam_date = :exam_date,
                    importance = :importance,
                    difficulty = :difficulty,
                    time_studied_so_far = :time_studied_so_far,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":exam_date": &row.exam_date,
                ":importance": row.importance,
                ":difficulty": row.difficulty,
                ":time_studied_so_far": row.time_studied_so_far,
                ":updated_at": &row.updated_at,
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    /// Adds `hours` to the studied counter in one statement.
    pub fn add_study_time(conn: &Connection, id: &str, hours: f64, updated_at: &str) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE courses SET
                    time_studied_so_far = time_studied_so_far + :hours,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {":id": id, ":hours": hours, ":updated_at": updated_at},
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        let affected = conn.execute("DELETE FROM courses WHERE id = ?1", [id])?;
        if affected == 0 {
            return Err(AppError::not_found());
        }
        Ok(())
    }

    pub fn delete_all(conn: &Connection) -> AppResult<usize> {
        Ok(conn.execute("DELETE FROM courses", [])?)
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<CourseRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| CourseRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    /// Creation order, so allocation output is stable across reads.
    pub fn list_all(conn: &Connection) -> AppResult<Vec<CourseRow>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at ASC, id ASC", BASE_SELECT))?;
        let rows = stmt
            .query_map([], |row| CourseRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn parse_stored_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, schedule_utils::DATE_FORMAT)
        .map_err(|err| AppError::database(format!("corrupt exam_date {raw:?}: {err}")))
}

fn narrow_factor(value: i64) -> AppResult<u8> {
    u8::try_from(value).map_err(|_| AppError::database(format!("weight factor out of range: {value}")))
}
