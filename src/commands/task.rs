use serde::Deserialize;

use crate::models::task::{TaskCreateInput, TaskRecord, TaskUpdateInput};

use super::{run_command, AppState, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskListFilters {
    pub status: Option<String>,
    pub course_id: Option<String>,
}

pub fn tasks_list(
    state: &AppState,
    filters: Option<TaskListFilters>,
) -> CommandResult<Vec<TaskRecord>> {
    let filters = filters.unwrap_or_default();
    run_command("tasks_list", || {
        let mut tasks = state.tasks().list_tasks(filters.status.as_deref())?;
        if let Some(course_id) = filters.course_id.as_deref() {
            tasks.retain(|task| task.course_id.as_deref() == Some(course_id));
        }
        Ok(tasks)
    })
}

pub fn tasks_create(state: &AppState, payload: TaskCreateInput) -> CommandResult<TaskRecord> {
    run_command("tasks_create", || state.tasks().create_task(payload))
}

pub fn tasks_update(
    state: &AppState,
    id: &str,
    payload: TaskUpdateInput,
) -> CommandResult<TaskRecord> {
    run_command("tasks_update", || state.tasks().update_task(id, payload))
}

pub fn tasks_delete(state: &AppState, id: &str) -> CommandResult<()> {
    run_command("tasks_delete", || state.tasks().delete_task(id))
}
