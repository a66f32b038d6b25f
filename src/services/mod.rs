pub mod allocator;
pub mod course_service;
pub mod plan_override;
pub mod planning_service;
pub mod profile_sync;
pub mod schedule_utils;
pub mod scheduler;
pub mod settings_service;
pub mod task_service;
