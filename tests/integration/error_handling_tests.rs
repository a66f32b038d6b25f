// Error handling and edge case tests

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use studyplan_lib::commands::actions::{dispatch, ActionOutcome, AppAction};
use studyplan_lib::commands::{course, planning, task, AppState, CommandError};
use studyplan_lib::config::AppConfig;
use studyplan_lib::db::DbPool;
use studyplan_lib::models::course::CourseCreateInput;
use studyplan_lib::models::planning::SessionRemoveInput;
use studyplan_lib::models::settings::StudySettingsUpdate;
use studyplan_lib::utils::clock::FixedClock;
use tempfile::tempdir;

fn setup_test_environment() -> (AppState, tempfile::TempDir) {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("test.sqlite");
    let pool = DbPool::new(db_path).expect("db pool");
    let today = NaiveDate::from_ymd_opt(2025, 6, 2).expect("today");
    (AppState::new(pool, Arc::new(FixedClock(today))), dir)
}

#[test]
fn test_validation_errors_surface_as_command_codes() {
    let (state, _dir) = setup_test_environment();

    let err = course::courses_create(
        &state,
        CourseCreateInput {
            name: "Too important".into(),
            importance: Some(9),
            ..Default::default()
        },
    )
    .expect_err("importance out of range");
    assert_eq!(err.code, "VALIDATION_ERROR");
    assert_eq!(err.details, Some(json!({"importance": 9})));
}

#[test]
fn test_missing_records_are_not_found() {
    let (state, _dir) = setup_test_environment();

    let err = task::tasks_delete(&state, "ghost").expect_err("missing task");
    assert_eq!(err.code, "NOT_FOUND");

    let err = course::courses_record_study_time(
        &state,
        course::StudyTimePayload {
            course_id: "ghost".into(),
            hours: 1.0,
        },
    )
    .expect_err("missing course");
    assert_eq!(err.code, "NOT_FOUND");
}

#[test]
fn test_stale_revision_code() {
    let (state, _dir) = setup_test_environment();
    state
        .settings()
        .update(StudySettingsUpdate {
            start_block_date: Some(NaiveDate::from_ymd_opt(2025, 6, 2)),
            end_block_date: Some(NaiveDate::from_ymd_opt(2025, 6, 15)),
            ..Default::default()
        })
        .expect("settings");
    state
        .courses()
        .create_course(CourseCreateInput {
            name: "Biology".into(),
            exam_date: NaiveDate::from_ymd_opt(2025, 6, 15),
            ..Default::default()
        })
        .expect("course");

    planning::planning_generate(&state, None).expect("generate");

    let err = planning::planning_session_remove(
        &state,
        SessionRemoveInput {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).expect("date"),
            session_index: 0,
            expected_revision: Some(0),
        },
    )
    .expect_err("stale");
    assert_eq!(err.code, "STALE_REVISION");
    assert_eq!(err.details, Some(json!({"expected": 0, "actual": 1})));
}

#[test]
fn test_degenerate_inputs_produce_empty_results() {
    let (state, _dir) = setup_test_environment();

    let breakdown = planning::planning_allocation(&state).expect("allocation");
    assert_eq!(breakdown.total_potential_hours, 0.0);
    assert!(breakdown.courses_breakdown.is_empty());

    let view = planning::planning_current(&state).expect("current plan");
    assert!(view.plan.is_empty());
    assert_eq!(view.plan.total_sessions, 0);

    let err = planning::planning_generate(&state, None).expect_err("nothing to freeze");
    assert_eq!(err.code, "VALIDATION_ERROR");
}

#[test]
fn test_dispatch_reports_errors_and_outcomes() {
    let (state, _dir) = setup_test_environment();

    let action: AppAction = serde_json::from_value(json!({
        "type": "addCourse",
        "payload": {"name": "Economics", "examDate": "2025-06-20"}
    }))
    .expect("parse action");
    let outcome = dispatch(&state, action).expect("add course");
    let ActionOutcome::Course(created) = outcome else {
        panic!("expected a course outcome");
    };
    assert_eq!(created.exam_date, NaiveDate::from_ymd_opt(2025, 6, 20));

    let action: AppAction = serde_json::from_value(json!({
        "type": "recordStudyTime",
        "payload": {"courseId": created.id, "hours": -2}
    }))
    .expect("parse action");
    let err: CommandError = dispatch(&state, action).expect_err("negative hours");
    assert_eq!(err.code, "VALIDATION_ERROR");

    let action: AppAction = serde_json::from_value(json!({
        "type": "deleteCourse",
        "payload": {"id": created.id}
    }))
    .expect("parse action");
    assert!(matches!(
        dispatch(&state, action).expect("delete"),
        ActionOutcome::Deleted { .. }
    ));
}

#[test]
fn test_invalid_config_maps_to_config_error() {
    let err = AppConfig::from_yaml("timezone: Mars/Olympus_Mons\n").expect_err("bad tz");
    assert_eq!(CommandError::from(err).code, "CONFIG_ERROR");

    let err = AppConfig::from_yaml("databaseFile: [not, a, string]\n").expect_err("bad yaml");
    assert_eq!(CommandError::from(err).code, "CONFIG_ERROR");
}

#[test]
fn test_bootstrap_creates_database_and_logs() {
    let dir = tempdir().expect("temp dir");
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };

    let state = AppState::bootstrap(&config).expect("bootstrap");
    assert!(config.database_path().exists());
    assert!(config.log_dir().exists());
    assert!(state.courses().list_courses().expect("list").is_empty());
}
