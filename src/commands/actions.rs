//! Mutations as data. A UI store can send one `AppAction` per user gesture
//! and get back the record or plan it changed.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::course::{CourseCreateInput, CourseRecord, CourseUpdateInput};
use crate::models::planning::PlanView;
use crate::models::settings::{StudySettings, StudySettingsUpdate};
use crate::models::task::{TaskCreateInput, TaskRecord, TaskUpdateInput};

use super::{run_command, AppState, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum AppAction {
    AddCourse(CourseCreateInput),
    #[serde(rename_all = "camelCase")]
    UpdateCourse {
        id: String,
        changes: CourseUpdateInput,
    },
    DeleteCourse {
        id: String,
    },
    AddTask(TaskCreateInput),
    #[serde(rename_all = "camelCase")]
    UpdateTask {
        id: String,
        changes: TaskUpdateInput,
    },
    DeleteTask {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    RecordStudyTime {
        course_id: String,
        hours: f64,
    },
    UpdateSettings(StudySettingsUpdate),
    #[serde(rename_all = "camelCase")]
    SetOverridePlan {
        #[serde(default)]
        expected_revision: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    ClearOverridePlan {
        #[serde(default)]
        expected_revision: Option<u64>,
    },
}

impl AppAction {
    pub fn name(&self) -> &'static str {
        match self {
            AppAction::AddCourse(_) => "addCourse",
            AppAction::UpdateCourse { .. } => "updateCourse",
            AppAction::DeleteCourse { .. } => "deleteCourse",
            AppAction::AddTask(_) => "addTask",
            AppAction::UpdateTask { .. } => "updateTask",
            AppAction::DeleteTask { .. } => "deleteTask",
            AppAction::RecordStudyTime { .. } => "recordStudyTime",
            AppAction::UpdateSettings(_) => "updateSettings",
            AppAction::SetOverridePlan { .. } => "setOverridePlan",
            AppAction::ClearOverridePlan { .. } => "clearOverridePlan",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ActionOutcome {
    Course(CourseRecord),
    Task(TaskRecord),
    Settings(StudySettings),
    Plan(PlanView),
    Deleted { id: String },
}

pub fn dispatch(state: &AppState, action: AppAction) -> CommandResult<ActionOutcome> {
    let name = action.name();
    let outcome = run_command(name, || match action {
        AppAction::AddCourse(input) => state.courses().create_course(input).map(ActionOutcome::Course),
        AppAction::UpdateCourse { id, changes } => state
            .courses()
            .update_course(&id, changes)
            .map(ActionOutcome::Course),
        AppAction::DeleteCourse { id } => state
            .courses()
            .delete_course(&id)
            .map(|_| ActionOutcome::Deleted { id }),
        AppAction::AddTask(input) => state.tasks().create_task(input).map(ActionOutcome::Task),
        AppAction::UpdateTask { id, changes } => state
            .tasks()
            .update_task(&id, changes)
            .map(ActionOutcome::Task),
        AppAction::DeleteTask { id } => state
            .tasks()
            .delete_task(&id)
            .map(|_| ActionOutcome::Deleted { id }),
        AppAction::RecordStudyTime { course_id, hours } => state
            .courses()
            .record_study_time(&course_id, hours)
            .map(ActionOutcome::Course),
        AppAction::UpdateSettings(update) => {
            state.settings().update(update).map(ActionOutcome::Settings)
        }
        AppAction::SetOverridePlan { expected_revision } => state
            .planning()
            .generate(expected_revision)
            .map(ActionOutcome::Plan),
        AppAction::ClearOverridePlan { expected_revision } => state
            .planning()
            .reset(expected_revision)
            .map(ActionOutcome::Plan),
    })?;

    info!(target: "app::command", action = name, "action applied");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_actions() {
        let action: AppAction = serde_json::from_value(json!({
            "type": "recordStudyTime",
            "payload": {"courseId": "c1", "hours": 1.5}
        }))
        .expect("parse action");
        assert_eq!(action.name(), "recordStudyTime");
        assert!(matches!(
            action,
            AppAction::RecordStudyTime { ref course_id, hours } if course_id == "c1" && hours == 1.5
        ));
    }

    #[test]
    fn revision_is_optional_on_override_actions() {
        let action: AppAction = serde_json::from_value(json!({
            "type": "clearOverridePlan",
            "payload": {}
        }))
        .expect("parse action");
        assert!(matches!(
            action,
            AppAction::ClearOverridePlan {
                expected_revision: None
            }
        ));
    }
}
