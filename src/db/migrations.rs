use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use crate::error::AppResult;

pub const USER_VERSION: i32 = 2;

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 1, "Add plan override table")?;
    }

    if current_version < 2 {
        info!(target: "app::db", version = current_version, "running migration v2");
        migrate_to_v2(conn)?;
        current_version = 2;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 2, "Index tasks by course and status")?;
    }

    Ok(())
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    // Single row. plan_json is NULL while no override exists; the revision
    // keeps counting across resets so old tokens never match again.
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS plan_override (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            plan_json TEXT,
            revision INTEGER NOT NULL DEFAULT 0,
            source_fingerprint TEXT,
            created_at TEXT,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn migrate_to_v2(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_tasks_course_id ON tasks(course_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        "#,
    )?;
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, description: &str) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description, applied_at) VALUES (?1, ?2, ?3)",
        (version, description, Utc::now().to_rfc3339()),
    )?;
    Ok(())
}
