//! Plan Override Store on top of SQLite, plus resolution of the plan the
//! calendar shows.
//!
//! The override is frozen data: once stored it is returned as-is whatever
//! happens to settings or courses, until `generate` or `reset` replaces it.
//! Every write bumps a revision; callers that pass `expected_revision` get
//! `StaleRevision` instead of overwriting someone else's edit.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::db::repositories::course_repository::{CourseRepository, CourseRow};
use crate::db::repositories::plan_override_repository::{PlanOverrideRepository, PlanOverrideRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::course::CourseRecord;
use crate::models::planning::{
    AllocationBreakdown, PlanOverrideRecord, PlanSource, PlanView, SessionAddInput,
    SessionEditInput, SessionMoveInput, SessionRemoveInput, StudyPlan,
};
use crate::models::settings::{PreferredTimeSlots, StudySettings};
use crate::services::allocator::compute_allocation;
use crate::services::plan_override;
use crate::services::scheduler::generate_schedule;
use crate::services::settings_service::{touch_last_updated, SettingsService};
use crate::utils::clock::Clock;

const MAX_SESSION_HOURS: f64 = 24.0;

#[derive(Clone)]
pub struct PlanningService {
    db: DbPool,
    settings: Arc<SettingsService>,
    clock: Arc<dyn Clock>,
}

impl PlanningService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            settings,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn allocation(&self) -> AppResult<AllocationBreakdown> {
        let settings = self.settings.get()?;
        let courses = self.db.with_connection(load_courses)?;
        Ok(compute_allocation(&settings, &courses, self.today()))
    }

    /// Live Allocator + Scheduler output, ignoring any override.
    pub fn generated_plan(&self) -> AppResult<StudyPlan> {
        let settings = self.settings.get()?;
        let courses = self.db.with_connection(load_courses)?;
        Ok(build_plan(&settings, &courses, self.today()))
    }

    /// The override when one exists, the live plan otherwise.
    pub fn current_plan(&self) -> AppResult<PlanView> {
        let settings = self.settings.get()?;
        let today = self.today();

        self.db.with_connection(|conn| {
            let courses = load_courses(conn)?;

            if let Some(record) = load_override(conn)? {
                let fingerprint = planning_fingerprint(&settings, &courses)?;
                let override_is_stale = record
                    .source_fingerprint
                    .as_deref()
                    .is_some_and(|stored| stored != fingerprint);
                return Ok(PlanView {
                    source: PlanSource::Override,
                    plan: record.plan,
                    revision: Some(record.revision),
                    override_is_stale,
                });
            }

            let revision = revision_from_db(PlanOverrideRepository::current_revision(conn)?);
            Ok(PlanView {
                source: PlanSource::Generated,
                plan: build_plan(&settings, &courses, today),
                revision: Some(revision),
                override_is_stale: false,
            })
        })
    }

    pub fn override_record(&self) -> AppResult<Option<PlanOverrideRecord>> {
        self.db.with_connection(load_override)
    }

    /// Freezes the live plan as the override, replacing any previous one.
    pub fn generate(&self, expected_revision: Option<u64>) -> AppResult<PlanView> {
        let settings = self.settings.get()?;
        let today = self.today();

        if settings.start_block_date.is_none() || settings.end_block_date.is_none() {
            return Err(AppError::validation(
                "set the study block start and end dates before generating a plan",
            ));
        }

        self.db.with_transaction(|tx| {
            let current = PlanOverrideRepository::current_revision(tx)?;
            ensure_revision(expected_revision, current)?;

            let courses = load_courses(tx)?;
            if !courses.iter().any(|course| course.exam_date.is_some()) {
                return Err(AppError::validation(
                    "add at least one course with an exam date before generating a plan",
                ));
            }

            let plan = build_plan(&settings, &courses, today);
            if plan.is_empty() {
                return Err(AppError::validation_with_details(
                    "nothing left to schedule before the exams",
                    json!({"today": today.to_string()}),
                ));
            }

            let fingerprint = planning_fingerprint(&settings, &courses)?;
            let revision = store_override(tx, &plan, Some(&fingerprint), current)?;
            touch_last_updated(tx)?;
            info!(
                target: "app::planning",
                revision,
                total_days = plan.total_days,
                total_sessions = plan.total_sessions,
                "plan override generated"
            );
            Ok(())
        })?;

        self.current_plan()
    }

    pub fn edit_session(&self, input: SessionEditInput) -> AppResult<PlanView> {
        ensure_duration(input.duration)?;
        self.mutate_override(input.expected_revision, "edit", |conn, plan| {
            let course = find_course(conn, &input.course_id)?;
            Ok(plan_override::edit_session(
                plan,
                input.date,
                input.session_index,
                &course.id,
                &course.name,
                input.duration,
            ))
        })
    }

    pub fn add_session(&self, input: SessionAddInput) -> AppResult<PlanView> {
        ensure_duration(input.duration)?;
        self.mutate_override(input.expected_revision, "add", |conn, plan| {
            let course = find_course(conn, &input.course_id)?;
            plan_override::add_session(plan, input.date, &course.id, &course.name, input.duration);
            Ok(true)
        })
    }

    pub fn remove_session(&self, input: SessionRemoveInput) -> AppResult<PlanView> {
        self.mutate_override(input.expected_revision, "remove", |_, plan| {
            Ok(plan_override::remove_session(plan, input.date, input.session_index).is_some())
        })
    }

    pub fn move_session(&self, input: SessionMoveInput) -> AppResult<PlanView> {
        self.mutate_override(input.expected_revision, "move", |_, plan| {
            Ok(plan_override::move_session(
                plan,
                input.from_date,
                input.session_index,
                input.to_date,
            ))
        })
    }

    /// Drops the override; reads fall back to the live plan.
    pub fn reset(&self, expected_revision: Option<u64>) -> AppResult<PlanView> {
        self.db.with_transaction(|tx| {
            let current = PlanOverrideRepository::current_revision(tx)?;
            ensure_revision(expected_revision, current)?;

            if PlanOverrideRepository::get_active(tx)?.is_none() {
                debug!(target: "app::planning", "reset without override, nothing to clear");
                return Ok(());
            }

            let revision = clear_override(tx, current)?;
            touch_last_updated(tx)?;
            info!(target: "app::planning", revision, "plan override cleared");
            Ok(())
        })?;

        self.current_plan()
    }

    /// Read-modify-write of the override in one immediate transaction. With no
    /// override stored, the edit applies to a copy of the live plan. `edit`
    /// returns `false` when its day or index no longer exists; nothing is
    /// written then.
    fn mutate_override<F>(
        &self,
        expected_revision: Option<u64>,
        action: &'static str,
        edit: F,
    ) -> AppResult<PlanView>
    where
        F: FnOnce(&Connection, &mut StudyPlan) -> AppResult<bool>,
    {
        let settings = self.settings.get()?;
        let today = self.today();

        self.db.with_transaction(|tx| {
            let conn: &Connection = tx;
            let current = PlanOverrideRepository::current_revision(conn)?;
            ensure_revision(expected_revision, current)?;

            let (mut plan, fingerprint) = match PlanOverrideRepository::get_active(conn)? {
                Some(row) => {
                    let fingerprint = row.source_fingerprint.clone();
                    (decode_plan(&row)?, fingerprint)
                }
                None => {
                    let courses = load_courses(conn)?;
                    let fingerprint = planning_fingerprint(&settings, &courses)?;
                    (build_plan(&settings, &courses, today), Some(fingerprint))
                }
            };

            if !edit(conn, &mut plan)? {
                debug!(target: "app::planning", action, "stale session reference ignored");
                return Ok(());
            }

            let revision = store_override(conn, &plan, fingerprint.as_deref(), current)?;
            touch_last_updated(conn)?;
            debug!(
                target: "app::planning",
                action,
                revision,
                total_sessions = plan.total_sessions,
                "plan override edited"
            );
            Ok(())
        })?;

        self.current_plan()
    }
}

/// Hash of everything the Allocator reads, so a frozen plan can be flagged
/// once its inputs move on.
pub fn planning_fingerprint(settings: &StudySettings, courses: &[CourseRecord]) -> AppResult<String> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct CourseInput<'a> {
        id: &'a str,
        name: &'a str,
        exam_date: Option<NaiveDate>,
        importance: u8,
        difficulty: u8,
        time_studied_so_far: f64,
    }

    let course_inputs: Vec<CourseInput<'_>> = courses
        .iter()
        .map(|course| CourseInput {
            id: &course.id,
            name: &course.name,
            exam_date: course.exam_date,
            importance: course.importance,
            difficulty: course.difficulty,
            time_studied_so_far: course.time_studied_so_far,
        })
        .collect();

    // Time slots do not feed the allocator.
    let planning_settings = StudySettings {
        preferred_time_slots: PreferredTimeSlots::default(),
        ..settings.clone()
    };
    let payload = serde_json::to_vec(&json!({
        "settings": planning_settings,
        "courses": course_inputs,
    }))?;
    let digest = Sha256::digest(&payload);
    Ok(Base64.encode(digest))
}

pub(crate) fn load_courses(conn: &Connection) -> AppResult<Vec<CourseRecord>> {
    CourseRepository::list_all(conn)?
        .into_iter()
        .map(CourseRow::into_record)
        .collect()
}

pub(crate) fn load_override(conn: &Connection) -> AppResult<Option<PlanOverrideRecord>> {
    let Some(row) = PlanOverrideRepository::get_active(conn)? else {
        return Ok(None);
    };

    let plan = decode_plan(&row)?;
    Ok(Some(PlanOverrideRecord {
        plan,
        revision: revision_from_db(row.revision),
        source_fingerprint: row.source_fingerprint,
        created_at: row.created_at.unwrap_or_else(|| row.updated_at.clone()),
        updated_at: row.updated_at,
    }))
}

/// Writes `plan` as the override at `current + 1` and returns that revision.
pub(crate) fn store_override(
    conn: &Connection,
    plan: &StudyPlan,
    fingerprint: Option<&str>,
    current: i64,
) -> AppResult<u64> {
    let mut plan = plan.clone();
    plan.refresh_totals();
    let plan_json = serde_json::to_string(&plan)?;
    let revision = current + 1;
    PlanOverrideRepository::save(conn, &plan_json, fingerprint, revision, &Utc::now().to_rfc3339())?;
    Ok(revision_from_db(revision))
}

pub(crate) fn clear_override(conn: &Connection, current: i64) -> AppResult<u64> {
    let revision = current + 1;
    PlanOverrideRepository::clear(conn, revision, &Utc::now().to_rfc3339())?;
    Ok(revision_from_db(revision))
}

fn build_plan(settings: &StudySettings, courses: &[CourseRecord], today: NaiveDate) -> StudyPlan {
    let breakdown = compute_allocation(settings, courses, today);
    generate_schedule(settings, &breakdown.courses_breakdown, today)
}

fn decode_plan(row: &PlanOverrideRow) -> AppResult<StudyPlan> {
    let raw = row.plan_json.as_deref().ok_or_else(AppError::not_found)?;
    let mut plan: StudyPlan = serde_json::from_str(raw)?;
    plan.refresh_totals();
    Ok(plan)
}

fn find_course(conn: &Connection, course_id: &str) -> AppResult<CourseRecord> {
    CourseRepository::find_by_id(conn, course_id)?
        .ok_or_else(AppError::not_found)?
        .into_record()
}

fn ensure_revision(expected: Option<u64>, current: i64) -> AppResult<()> {
    let actual = revision_from_db(current);
    match expected {
        Some(expected) if expected != actual => Err(AppError::stale_revision(expected, actual)),
        _ => Ok(()),
    }
}

fn ensure_duration(duration: f64) -> AppResult<()> {
    if !duration.is_finite() || duration <= 0.0 || duration > MAX_SESSION_HOURS {
        return Err(AppError::validation_with_details(
            "session duration must be a positive number of hours",
            json!({"duration": duration}),
        ));
    }
    Ok(())
}

fn revision_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: &str, exam: Option<NaiveDate>) -> CourseRecord {
        CourseRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            exam_date: exam,
            importance: 3,
            difficulty: 3,
            time_studied_so_far: 0.0,
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn fingerprint_ignores_bookkeeping_timestamps() {
        let settings = StudySettings::default();
        let exam = NaiveDate::from_ymd_opt(2025, 6, 20);
        let mut touched = course("a", exam);
        touched.updated_at = "2025-02-01T00:00:00Z".into();

        assert_eq!(
            planning_fingerprint(&settings, &[course("a", exam)]).expect("fingerprint"),
            planning_fingerprint(&settings, &[touched]).expect("fingerprint")
        );
    }

    #[test]
    fn fingerprint_ignores_time_slot_preferences() {
        let settings = StudySettings::default();
        let exam = NaiveDate::from_ymd_opt(2025, 6, 20);
        let mut evenings_off = settings.clone();
        evenings_off.preferred_time_slots.evening = Some(false);

        assert_eq!(
            planning_fingerprint(&settings, &[course("a", exam)]).expect("fingerprint"),
            planning_fingerprint(&evenings_off, &[course("a", exam)]).expect("fingerprint")
        );
    }

    #[test]
    fn fingerprint_tracks_study_time_and_settings() {
        let settings = StudySettings::default();
        let exam = NaiveDate::from_ymd_opt(2025, 6, 20);
        let base = planning_fingerprint(&settings, &[course("a", exam)]).expect("fingerprint");

        let mut studied = course("a", exam);
        studied.time_studied_so_far = 2.0;
        assert_ne!(base, planning_fingerprint(&settings, &[studied]).expect("fingerprint"));

        let mut longer_days = settings.clone();
        longer_days.hours_per_day = 8.0;
        assert_ne!(
            base,
            planning_fingerprint(&longer_days, &[course("a", exam)]).expect("fingerprint")
        );
    }

    #[test]
    fn revision_check_only_applies_when_expected_is_given() {
        assert!(ensure_revision(None, 4).is_ok());
        assert!(ensure_revision(Some(4), 4).is_ok());
        assert!(matches!(
            ensure_revision(Some(3), 4),
            Err(AppError::StaleRevision {
                expected: 3,
                actual: 4
            })
        ));
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert!(ensure_duration(2.0).is_ok());
        assert!(ensure_duration(0.0).is_err());
        assert!(ensure_duration(f64::NAN).is_err());
    }
}
