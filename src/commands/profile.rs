use crate::models::profile::{ProfileSnapshot, ResolvedProfile};

use super::{run_command, AppState, CommandResult};

pub fn profile_export(state: &AppState) -> CommandResult<ProfileSnapshot> {
    run_command("profile_export", || state.profile().export_profile())
}

pub fn profile_import(state: &AppState, snapshot: ProfileSnapshot) -> CommandResult<()> {
    run_command("profile_import", || state.profile().import_profile(snapshot))
}

/// Merges a remotely stored profile into the local one.
pub fn profile_reconcile(
    state: &AppState,
    remote: ProfileSnapshot,
) -> CommandResult<ResolvedProfile> {
    run_command("profile_reconcile", || state.profile().reconcile(remote))
}
