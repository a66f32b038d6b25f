use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::course::CourseRecord;
use crate::models::planning::StudyPlan;
use crate::models::settings::StudySettings;
use crate::models::task::TaskRecord;

/// Everything a storage backend keeps for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub settings: StudySettings,
    #[serde(default)]
    pub courses: Vec<CourseRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub custom_planning: Option<StudyPlan>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MergeWinner {
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedProfile {
    pub profile: ProfileSnapshot,
    pub winner: MergeWinner,
    /// Collections taken from the losing side because the winner had none.
    pub backfilled: Vec<String>,
}
