use std::sync::Arc;

use chrono::NaiveDate;
use studyplan_lib::commands::AppState;
use studyplan_lib::db::DbPool;
use studyplan_lib::error::AppError;
use studyplan_lib::models::course::{CourseCreateInput, CourseRecord};
use studyplan_lib::models::planning::{
    PlanSource, SessionAddInput, SessionEditInput, SessionKind, SessionMoveInput,
    SessionRemoveInput,
};
use studyplan_lib::models::settings::StudySettingsUpdate;
use studyplan_lib::utils::clock::FixedClock;
use tempfile::{tempdir, TempDir};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Monday 2025-06-02 with a one-week block ending on the exam day.
fn setup() -> (TempDir, AppState) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("planning.sqlite")).expect("db pool");
    let state = AppState::new(pool, Arc::new(FixedClock(date(2025, 6, 2))));

    state
        .settings()
        .update(StudySettingsUpdate {
            start_block_date: Some(Some(date(2025, 6, 2))),
            end_block_date: Some(Some(date(2025, 6, 8))),
            study_days_per_week: Some(5),
            hours_per_day: Some(6.0),
            session_duration: Some(2.0),
            ..Default::default()
        })
        .expect("settings");

    (dir, state)
}

fn add_algebra(state: &AppState) -> CourseRecord {
    state
        .courses()
        .create_course(CourseCreateInput {
            name: "Algebra".into(),
            exam_date: Some(date(2025, 6, 8)),
            importance: Some(3),
            difficulty: Some(3),
        })
        .expect("create course")
}

#[test]
fn one_week_window_allocates_thirty_hours_and_leaves_remainder() {
    let (_dir, state) = setup();
    let course = add_algebra(&state);

    let breakdown = state.planning().allocation().expect("allocation");
    assert_eq!(breakdown.total_days, 7);
    assert_eq!(breakdown.total_potential_hours, 30.0);
    assert_eq!(breakdown.courses_breakdown[0].recommended_hours, 30.0);

    let plan = state.planning().generated_plan().expect("generated");
    // 4h on the eve plus five 2h sessions Monday to Friday; the rest does not fit.
    assert_eq!(plan.total_days, 6);
    assert_eq!(plan.total_sessions, 6);
    assert_eq!(plan.hours_for_course(&course.id), 14.0);

    let eve = plan.day(date(2025, 6, 7)).expect("eve scheduled");
    assert_eq!(eve.sessions.len(), 1);
    assert_eq!(eve.sessions[0].kind, SessionKind::RevisionFinale);
    assert_eq!(eve.sessions[0].duration, 4.0);
}

#[test]
fn override_stays_frozen_until_reset() {
    let (_dir, state) = setup();
    add_algebra(&state);

    let before = state.planning().current_plan().expect("current");
    assert_eq!(before.source, PlanSource::Generated);

    let generated = state.planning().generate(None).expect("generate");
    assert_eq!(generated.source, PlanSource::Override);
    assert_eq!(generated.revision, Some(1));
    assert!(!generated.override_is_stale);

    state
        .settings()
        .update(StudySettingsUpdate {
            session_duration: Some(3.0),
            ..Default::default()
        })
        .expect("change settings");

    let frozen = state.planning().current_plan().expect("current");
    assert_eq!(frozen.source, PlanSource::Override);
    assert_eq!(frozen.plan, generated.plan);
    assert!(frozen.override_is_stale);

    let live = state.planning().generated_plan().expect("live");
    assert_ne!(live, generated.plan);

    let reset = state.planning().reset(Some(1)).expect("reset");
    assert_eq!(reset.source, PlanSource::Generated);
    assert_eq!(reset.plan, live);
    assert!(state.planning().override_record().expect("record").is_none());
}

#[test]
fn stale_revision_is_rejected() {
    let (_dir, state) = setup();
    let course = add_algebra(&state);
    state.planning().generate(None).expect("generate");

    let edited = state
        .planning()
        .edit_session(SessionEditInput {
            date: date(2025, 6, 2),
            session_index: 0,
            course_id: course.id.clone(),
            duration: 1.0,
            expected_revision: Some(1),
        })
        .expect("edit");
    assert_eq!(edited.revision, Some(2));

    let err = state
        .planning()
        .remove_session(SessionRemoveInput {
            date: date(2025, 6, 3),
            session_index: 0,
            expected_revision: Some(1),
        })
        .expect_err("stale token");
    assert!(matches!(
        err,
        AppError::StaleRevision {
            expected: 1,
            actual: 2
        }
    ));

    let current = state.planning().current_plan().expect("current");
    assert!(current.plan.day(date(2025, 6, 3)).is_some());
}

#[test]
fn revision_keeps_counting_across_reset() {
    let (_dir, state) = setup();
    add_algebra(&state);

    state.planning().generate(None).expect("generate");
    let reset = state.planning().reset(None).expect("reset");
    assert_eq!(reset.revision, Some(2));

    let again = state.planning().generate(Some(2)).expect("generate again");
    assert_eq!(again.revision, Some(3));
    assert!(matches!(
        state.planning().reset(Some(1)),
        Err(AppError::StaleRevision { .. })
    ));
}

#[test]
fn session_edits_update_totals() {
    let (_dir, state) = setup();
    let course = add_algebra(&state);
    state.planning().generate(None).expect("generate");

    let view = state
        .planning()
        .edit_session(SessionEditInput {
            date: date(2025, 6, 2),
            session_index: 0,
            course_id: course.id.clone(),
            duration: 3.5,
            expected_revision: None,
        })
        .expect("edit");
    let monday = view.plan.day(date(2025, 6, 2)).expect("monday");
    assert_eq!(monday.total_hours, 3.5);

    let view = state
        .planning()
        .add_session(SessionAddInput {
            date: date(2025, 6, 10),
            course_id: course.id.clone(),
            duration: 1.0,
            expected_revision: None,
        })
        .expect("add");
    assert_eq!(view.plan.total_days, 7);
    assert_eq!(view.plan.total_sessions, 7);
    let dates: Vec<NaiveDate> = view.plan.daily_planning.iter().map(|d| d.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    let view = state
        .planning()
        .remove_session(SessionRemoveInput {
            date: date(2025, 6, 10),
            session_index: 0,
            expected_revision: None,
        })
        .expect("remove");
    assert!(view.plan.day(date(2025, 6, 10)).is_none());
    assert_eq!(view.plan.total_days, 6);

    let view = state
        .planning()
        .move_session(SessionMoveInput {
            from_date: date(2025, 6, 7),
            session_index: 0,
            to_date: date(2025, 6, 6),
            expected_revision: None,
        })
        .expect("move");
    assert!(view.plan.day(date(2025, 6, 7)).is_none());
    let friday = view.plan.day(date(2025, 6, 6)).expect("friday");
    assert_eq!(friday.sessions.len(), 2);
    assert_eq!(friday.total_hours, 6.0);
    assert!(friday
        .sessions
        .iter()
        .any(|s| s.kind == SessionKind::RevisionFinale));
}

#[test]
fn stale_references_are_ignored() {
    let (_dir, state) = setup();
    add_algebra(&state);
    let generated = state.planning().generate(None).expect("generate");

    let view = state
        .planning()
        .remove_session(SessionRemoveInput {
            date: date(2025, 6, 2),
            session_index: 9,
            expected_revision: None,
        })
        .expect("remove out of range");
    assert_eq!(view.plan, generated.plan);
    assert_eq!(view.revision, generated.revision);

    let view = state
        .planning()
        .move_session(SessionMoveInput {
            from_date: date(2025, 7, 1),
            session_index: 0,
            to_date: date(2025, 6, 3),
            expected_revision: None,
        })
        .expect("move missing day");
    assert_eq!(view.plan, generated.plan);
}

#[test]
fn editing_without_override_starts_from_live_plan() {
    let (_dir, state) = setup();
    let course = add_algebra(&state);
    let live = state.planning().generated_plan().expect("live");

    let view = state
        .planning()
        .edit_session(SessionEditInput {
            date: date(2025, 6, 3),
            session_index: 0,
            course_id: course.id.clone(),
            duration: 1.0,
            expected_revision: None,
        })
        .expect("edit");

    assert_eq!(view.source, PlanSource::Override);
    assert_eq!(view.plan.total_sessions, live.total_sessions);
    assert_eq!(view.plan.total_hours(), live.total_hours() - 1.0);
}

#[test]
fn generate_requires_block_dates_and_exams() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("planning.sqlite")).expect("db pool");
    let state = AppState::new(pool, Arc::new(FixedClock(date(2025, 6, 2))));

    let err = state.planning().generate(None).expect_err("no block dates");
    assert!(matches!(err, AppError::Validation { .. }));

    state
        .settings()
        .update(StudySettingsUpdate {
            start_block_date: Some(Some(date(2025, 6, 2))),
            end_block_date: Some(Some(date(2025, 6, 8))),
            ..Default::default()
        })
        .expect("settings");
    state
        .courses()
        .create_course(CourseCreateInput {
            name: "Undated".into(),
            ..Default::default()
        })
        .expect("course without exam");

    let err = state.planning().generate(None).expect_err("no exam dates");
    assert!(matches!(err, AppError::Validation { .. }));
    assert!(state.planning().override_record().expect("record").is_none());
}

#[test]
fn editing_with_unknown_course_is_not_found() {
    let (_dir, state) = setup();
    add_algebra(&state);
    state.planning().generate(None).expect("generate");

    let err = state
        .planning()
        .add_session(SessionAddInput {
            date: date(2025, 6, 4),
            course_id: "missing".into(),
            duration: 1.0,
            expected_revision: None,
        })
        .expect_err("unknown course");
    assert!(matches!(err, AppError::NotFound));
}
