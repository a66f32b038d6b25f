use serde::Deserialize;

use crate::models::planning::{
    AllocationBreakdown, PlanView, SessionAddInput, SessionEditInput, SessionMoveInput,
    SessionRemoveInput, StudyPlan,
};
use crate::services::schedule_utils;

use super::{run_command, AppState, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevisionPayload {
    pub expected_revision: Option<u64>,
}

pub fn planning_allocation(state: &AppState) -> CommandResult<AllocationBreakdown> {
    run_command("planning_allocation", || state.planning().allocation())
}

pub fn planning_generated(state: &AppState) -> CommandResult<StudyPlan> {
    run_command("planning_generated", || state.planning().generated_plan())
}

pub fn planning_current(state: &AppState) -> CommandResult<PlanView> {
    run_command("planning_current", || state.planning().current_plan())
}

pub fn planning_generate(
    state: &AppState,
    payload: Option<RevisionPayload>,
) -> CommandResult<PlanView> {
    let payload = payload.unwrap_or_default();
    run_command("planning_generate", || {
        state.planning().generate(payload.expected_revision)
    })
}

pub fn planning_reset(state: &AppState, payload: Option<RevisionPayload>) -> CommandResult<PlanView> {
    let payload = payload.unwrap_or_default();
    run_command("planning_reset", || state.planning().reset(payload.expected_revision))
}

pub fn planning_session_edit(state: &AppState, payload: SessionEditInput) -> CommandResult<PlanView> {
    run_command("planning_session_edit", || state.planning().edit_session(payload))
}

pub fn planning_session_add(state: &AppState, payload: SessionAddInput) -> CommandResult<PlanView> {
    run_command("planning_session_add", || state.planning().add_session(payload))
}

pub fn planning_session_remove(
    state: &AppState,
    payload: SessionRemoveInput,
) -> CommandResult<PlanView> {
    run_command("planning_session_remove", || state.planning().remove_session(payload))
}

pub fn planning_session_move(state: &AppState, payload: SessionMoveInput) -> CommandResult<PlanView> {
    run_command("planning_session_move", || state.planning().move_session(payload))
}

/// Display form of an hour amount: "35min", "2.5h".
pub fn planning_format_hours(hours: f64) -> String {
    schedule_utils::format_hours(hours)
}
