use chrono::NaiveDate;
use studyplan_lib::db::DbPool;
use studyplan_lib::error::AppError;
use studyplan_lib::models::course::{CourseCreateInput, CourseUpdateInput};
use studyplan_lib::services::course_service::CourseService;
use tempfile::tempdir;

fn service() -> (tempfile::TempDir, CourseService) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("courses.sqlite")).expect("db pool");
    (dir, CourseService::new(pool))
}

#[test]
fn course_crud_flow() {
    let (_dir, service) = service();

    let created = service
        .create_course(CourseCreateInput {
            name: "  Organic Chemistry ".into(),
            exam_date: NaiveDate::from_ymd_opt(2025, 6, 18),
            ..Default::default()
        })
        .expect("create course");
    assert_eq!(created.name, "Organic Chemistry");
    assert_eq!(created.importance, 3);
    assert_eq!(created.difficulty, 3);
    assert_eq!(created.time_studied_so_far, 0.0);
    assert_eq!(created.weight(), 9);

    let updated = service
        .update_course(
            &created.id,
            CourseUpdateInput {
                importance: Some(5),
                exam_date: Some(None),
                ..Default::default()
            },
        )
        .expect("update course");
    assert_eq!(updated.importance, 5);
    assert_eq!(updated.exam_date, None);
    assert_eq!(service.get_course(&created.id).expect("get"), updated);

    let listed = service.list_courses().expect("list");
    assert_eq!(listed.len(), 1);

    service.delete_course(&created.id).expect("delete");
    assert!(matches!(service.get_course(&created.id), Err(AppError::NotFound)));
}

#[test]
fn study_time_accumulates() {
    let (_dir, service) = service();
    let course = service
        .create_course(CourseCreateInput {
            name: "Statistics".into(),
            ..Default::default()
        })
        .expect("create");

    service.record_study_time(&course.id, 1.5).expect("first stint");
    let after = service.record_study_time(&course.id, 0.75).expect("second stint");
    assert_eq!(after.time_studied_so_far, 2.25);
}

#[test]
fn study_time_rejects_bad_input() {
    let (_dir, service) = service();
    let course = service
        .create_course(CourseCreateInput {
            name: "History".into(),
            ..Default::default()
        })
        .expect("create");

    for hours in [0.0, -1.0, f64::INFINITY, f64::NAN] {
        assert!(matches!(
            service.record_study_time(&course.id, hours),
            Err(AppError::Validation { .. })
        ));
    }
    assert!(matches!(
        service.record_study_time("missing", 1.0),
        Err(AppError::NotFound)
    ));
}

#[test]
fn weight_factors_must_be_in_range() {
    let (_dir, service) = service();
    for (importance, difficulty) in [(0, 3), (6, 3), (3, 0), (3, 9)] {
        let result = service.create_course(CourseCreateInput {
            name: "Out of range".into(),
            exam_date: None,
            importance: Some(importance),
            difficulty: Some(difficulty),
        });
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
    assert!(matches!(
        service.create_course(CourseCreateInput {
            name: " ".into(),
            ..Default::default()
        }),
        Err(AppError::Validation { .. })
    ));
    assert!(service.list_courses().expect("list").is_empty());
}
