use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct PlanOverrideRow {
    pub plan_json: Option<String>,
    pub revision: i64,
    pub source_fingerprint: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for PlanOverrideRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            plan_json: row.get("plan_json")?,
            revision: row.get("revision")?,
            source_fingerprint: row.get("source_fingerprint")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Single-row store for the user's frozen plan.
pub struct PlanOverrideRepository;

impl PlanOverrideRepository {
    pub fn get(conn: &Connection) -> AppResult<Option<PlanOverrideRow>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT plan_json, revision, source_fingerprint, created_at, updated_at
                FROM plan_override
                WHERE id = 1
            "#,
        )?;

        let row = stmt
            .query_row([], |row| PlanOverrideRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    /// Row only when a plan is actually stored.
    pub fn get_active(conn: &Connection) -> AppResult<Option<PlanOverrideRow>> {
        Ok(Self::get(conn)?.filter(|row| row.plan_json.is_some()))
    }

    pub fn current_revision(conn: &Connection) -> AppResult<i64> {
        Ok(Self::get(conn)?.map(|row| row.revision).unwrap_or(0))
    }

    pub fn save(
        conn: &Connection,
        plan_json: &str,
        source_fingerprint: Option<&str>,
        revision: i64,
        timestamp: &str,
    ) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO plan_override (
                    id, plan_json, revision, source_fingerprint, created_at, updated_at
                ) VALUES (
                    1, :plan_json, :revision, :source_fingerprint, :timestamp, :timestamp
                )
                ON CONFLICT(id) DO UPDATE SET
                    plan_json = excluded.plan_json,
                    revision = excluded.revision,
                    source_fingerprint = excluded.source_fingerprint,
                    created_at = COALESCE(plan_override.created_at, excluded.created_at),
                    updated_at = excluded.updated_at
            "#,
            named_params! {
                ":plan_json": plan_json,
                ":revision": revision,
                ":source_fingerprint": source_fingerprint,
                ":timestamp": timestamp,
            },
        )?;

        Ok(())
    }

    /// Drops the stored plan but keeps the row so the revision stays monotonic.
    pub fn clear(conn: &Connection, revision: i64, timestamp: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO plan_override (
                    id, plan_json, revision, source_fingerprint, created_at, updated_at
                ) VALUES (
                    1, NULL, :revision, NULL, NULL, :timestamp
                )
                ON CONFLICT(id) DO UPDATE SET
                    plan_json = NULL,
                    revision = excluded.revision,
                    source_fingerprint = NULL,
                    created_at = NULL,
                    updated_at = excluded.updated_at
            "#,
            named_params! {":revision": revision, ":timestamp": timestamp},
        )?;

        Ok(())
    }
}
