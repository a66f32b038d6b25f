pub mod course_repository;
pub mod plan_override_repository;
pub mod settings_repository;
pub mod task_repository;
