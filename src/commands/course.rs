use serde::Deserialize;

use crate::models::course::{CourseCreateInput, CourseRecord, CourseUpdateInput};

use super::{run_command, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyTimePayload {
    pub course_id: String,
    pub hours: f64,
}

pub fn courses_list(state: &AppState) -> CommandResult<Vec<CourseRecord>> {
    run_command("courses_list", || state.courses().list_courses())
}

pub fn courses_get(state: &AppState, id: &str) -> CommandResult<CourseRecord> {
    run_command("courses_get", || state.courses().get_course(id))
}

pub fn courses_create(state: &AppState, payload: CourseCreateInput) -> CommandResult<CourseRecord> {
    run_command("courses_create", || state.courses().create_course(payload))
}

pub fn courses_update(
    state: &AppState,
    id: &str,
    payload: CourseUpdateInput,
) -> CommandResult<CourseRecord> {
    run_command("courses_update", || state.courses().update_course(id, payload))
}

pub fn courses_delete(state: &AppState, id: &str) -> CommandResult<()> {
    run_command("courses_delete", || state.courses().delete_course(id))
}

pub fn courses_record_study_time(
    state: &AppState,
    payload: StudyTimePayload,
) -> CommandResult<CourseRecord> {
    run_command("courses_record_study_time", || {
        state
            .courses()
            .record_study_time(&payload.course_id, payload.hours)
    })
}
