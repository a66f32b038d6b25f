use crate::models::settings::{StudySettings, StudySettingsUpdate};

use super::{run_command, AppState, CommandResult};

pub fn settings_get(state: &AppState) -> CommandResult<StudySettings> {
    run_command("settings_get", || state.settings().get())
}

pub fn settings_update(
    state: &AppState,
    payload: StudySettingsUpdate,
) -> CommandResult<StudySettings> {
    run_command("settings_update", || state.settings().update(payload))
}
