use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::date_format;

/// Length of the mandatory session on the eve of an exam.
pub const FINAL_REVISION_HOURS: f64 = 4.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseAllocation {
    pub course_id: String,
    pub course_name: String,
    pub recommended_hours: f64,
    pub time_studied: f64,
    pub remaining_hours: f64,
    pub weight: u32,
    #[serde(default, with = "date_format::optional")]
    pub exam_date: Option<NaiveDate>,
    /// time studied over recommended hours; 0 when nothing is recommended.
    #[serde(default)]
    pub progress: f64,
}

/// Derived from settings and courses on every read; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBreakdown {
    pub total_potential_hours: f64,
    pub total_remaining_hours: f64,
    pub courses_breakdown: Vec<CourseAllocation>,
    #[serde(default, with = "date_format::optional")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "date_format::optional")]
    pub end_date: Option<NaiveDate>,
    pub total_days: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionKind {
    /// Sorts first within a day.
    #[serde(rename = "revision-finale")]
    RevisionFinale,
    #[serde(rename = "revision")]
    Revision,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSession {
    pub course_id: String,
    pub course_name: String,
    pub duration: f64,
    #[serde(rename = "type")]
    pub kind: SessionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub date: NaiveDate,
    pub sessions: Vec<PlanSession>,
    pub total_hours: f64,
}

impl PlanDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sessions: Vec::new(),
            total_hours: 0.0,
        }
    }

    pub fn recompute_total(&mut self) {
        self.total_hours = self.sessions.iter().map(|s| s.duration).sum();
    }
}

/// Calendarized plan, ordered by date. Shared shape of the generated plan
/// and the user override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub daily_planning: Vec<PlanDay>,
    #[serde(default)]
    pub total_days: usize,
    #[serde(default)]
    pub total_sessions: usize,
}

impl StudyPlan {
    pub fn from_days(daily_planning: Vec<PlanDay>) -> Self {
        let mut plan = Self {
            daily_planning,
            total_days: 0,
            total_sessions: 0,
        };
        plan.refresh_totals();
        plan
    }

    pub fn refresh_totals(&mut self) {
        for day in &mut self.daily_planning {
            day.recompute_total();
        }
        self.total_days = self.daily_planning.len();
        self.total_sessions = self.daily_planning.iter().map(|d| d.sessions.len()).sum();
    }

    pub fn is_empty(&self) -> bool {
        self.daily_planning.is_empty()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&PlanDay> {
        self.daily_planning.iter().find(|d| d.date == date)
    }

    pub fn hours_for_course(&self, course_id: &str) -> f64 {
        self.daily_planning
            .iter()
            .flat_map(|d| d.sessions.iter())
            .filter(|s| s.course_id == course_id)
            .map(|s| s.duration)
            .sum()
    }

    pub fn total_hours(&self) -> f64 {
        self.daily_planning.iter().map(|d| d.total_hours).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanOverrideRecord {
    pub plan: StudyPlan,
    pub revision: u64,
    #[serde(default)]
    pub source_fingerprint: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlanSource {
    Override,
    Generated,
}

/// What the calendar shows: the override when one exists, the live plan
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub source: PlanSource,
    pub plan: StudyPlan,
    #[serde(default)]
    pub revision: Option<u64>,
    /// Settings or courses changed since the override was generated.
    #[serde(default)]
    pub override_is_stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEditInput {
    pub date: NaiveDate,
    pub session_index: usize,
    pub course_id: String,
    pub duration: f64,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionAddInput {
    pub date: NaiveDate,
    pub course_id: String,
    pub duration: f64,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRemoveInput {
    pub date: NaiveDate,
    pub session_index: usize,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMoveInput {
    pub from_date: NaiveDate,
    pub session_index: usize,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub expected_revision: Option<u64>,
}
