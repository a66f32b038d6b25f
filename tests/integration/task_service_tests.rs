use chrono::NaiveDate;
use studyplan_lib::db::DbPool;
use studyplan_lib::error::AppError;
use studyplan_lib::models::course::CourseCreateInput;
use studyplan_lib::models::task::{TaskCreateInput, TaskUpdateInput};
use studyplan_lib::services::course_service::CourseService;
use studyplan_lib::services::task_service::TaskService;
use tempfile::tempdir;

#[test]
fn task_crud_flow() {
    let dir = tempdir().expect("temp dir");
    let db_path = dir.path().join("integration.sqlite");
    let pool = DbPool::new(db_path).expect("db pool");
    let service = TaskService::new(pool.clone());

    // create
    let created = service
        .create_task(TaskCreateInput {
            title: "Summarise chapter 4".into(),
            priority: Some("high".into()),
            ..Default::default()
        })
        .expect("create task");

    assert!(!created.id.is_empty());
    assert_eq!(created.status, "todo");
    assert_eq!(created.priority, "high");

    // list
    let tasks = service.list_tasks(None).expect("list tasks");
    assert_eq!(tasks.len(), 1);

    // update
    let mut update = TaskUpdateInput::default();
    update.status = Some("in-progress".into());
    update.description = Some(Some("with diagrams".into()));

    let updated = service
        .update_task(&created.id, update)
        .expect("update task");
    assert_eq!(updated.status, "in-progress");
    assert_eq!(updated.description.as_deref(), Some("with diagrams"));

    // filter
    assert_eq!(service.list_tasks(Some("in-progress")).expect("filter").len(), 1);
    assert!(service.list_tasks(Some("done")).expect("filter").is_empty());

    // clear description
    let cleared = service
        .update_task(
            &created.id,
            TaskUpdateInput {
                description: Some(None),
                ..Default::default()
            },
        )
        .expect("clear description");
    assert_eq!(cleared.description, None);

    // delete
    service.delete_task(&created.id).expect("delete task");
    assert!(matches!(service.get_task(&created.id), Err(AppError::NotFound)));
    assert!(matches!(service.delete_task(&created.id), Err(AppError::NotFound)));
}

#[test]
fn task_course_link_must_exist() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("links.sqlite")).expect("db pool");
    let tasks = TaskService::new(pool.clone());
    let courses = CourseService::new(pool.clone());

    let err = tasks
        .create_task(TaskCreateInput {
            title: "Orphan".into(),
            course_id: Some("nope".into()),
            ..Default::default()
        })
        .expect_err("unknown course");
    assert!(matches!(err, AppError::Validation { .. }));

    let course = courses
        .create_course(CourseCreateInput {
            name: "Physics".into(),
            exam_date: NaiveDate::from_ymd_opt(2025, 6, 20),
            ..Default::default()
        })
        .expect("course");
    let linked = tasks
        .create_task(TaskCreateInput {
            title: "Lab report".into(),
            course_id: Some(course.id.clone()),
            ..Default::default()
        })
        .expect("linked task");
    assert_eq!(linked.course_id.as_deref(), Some(course.id.as_str()));

    courses.delete_course(&course.id).expect("delete course");
    assert!(matches!(tasks.get_task(&linked.id), Err(AppError::NotFound)));
}

#[test]
fn invalid_status_and_priority_are_rejected() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("invalid.sqlite")).expect("db pool");
    let service = TaskService::new(pool);

    for input in [
        TaskCreateInput {
            title: "x".into(),
            status: Some("archived".into()),
            ..Default::default()
        },
        TaskCreateInput {
            title: "x".into(),
            priority: Some("urgent".into()),
            ..Default::default()
        },
        TaskCreateInput {
            title: "   ".into(),
            ..Default::default()
        },
    ] {
        assert!(matches!(
            service.create_task(input),
            Err(AppError::Validation { .. })
        ));
    }
    assert!(service.list_tasks(None).expect("list").is_empty());
}
