use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::date_format;

pub const DEFAULT_STUDY_DAYS_PER_WEEK: u8 = 5;
pub const DEFAULT_HOURS_PER_DAY: f64 = 6.0;
pub const DEFAULT_SESSION_DURATION: f64 = 2.0;
pub const DEFAULT_BREAK_MINUTES: u32 = 30;
pub const DEFAULT_EXAM_HOUR: f64 = 9.0;

/// Day of week with a single canonical mapping to the UI picker keys
/// (`day0` = Monday … `day6` = Sunday) and to chrono.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Index used by the day picker: Monday = 0.
    pub fn picker_index(self) -> usize {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }

    pub fn from_picker_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

/// Weekday availability as sent by the day picker. A missing flag means the
/// day is available; only an explicit `false` disables it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedDays {
    #[serde(rename = "day0", default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<bool>,
    #[serde(rename = "day1", default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<bool>,
    #[serde(rename = "day2", default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<bool>,
    #[serde(rename = "day3", default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<bool>,
    #[serde(rename = "day4", default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<bool>,
    #[serde(rename = "day5", default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<bool>,
    #[serde(rename = "day6", default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<bool>,
}

impl SelectedDays {
    pub fn only(days: &[Weekday]) -> Self {
        let mut selected = Self::default();
        for day in Weekday::ALL {
            selected.set(day, days.contains(&day));
        }
        selected
    }

    fn flag(&self, day: Weekday) -> Option<bool> {
        match day {
            Weekday::Monday => self.monday,
            Weekday::Tuesday => self.tuesday,
            Weekday::Wednesday => self.wednesday,
            Weekday::Thursday => self.thursday,
            Weekday::Friday => self.friday,
            Weekday::Saturday => self.saturday,
            Weekday::Sunday => self.sunday,
        }
    }

    pub fn set(&mut self, day: Weekday, selected: bool) {
        let slot = match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        };
        *slot = Some(selected);
    }

    pub fn is_selected(&self, day: Weekday) -> bool {
        self.flag(day) != Some(false)
    }

    /// Days available for regular sessions; all seven when none is selected.
    pub fn active_weekdays(&self) -> Vec<Weekday> {
        let active: Vec<Weekday> = Weekday::ALL
            .into_iter()
            .filter(|day| self.is_selected(*day))
            .collect();
        if active.is_empty() {
            Weekday::ALL.to_vec()
        } else {
            active
        }
    }
}

/// Parts of the day the user prefers to study in. Informational; a missing
/// flag means the slot is preferred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferredTimeSlots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<bool>,
}

impl PreferredTimeSlots {
    pub fn is_unset(&self) -> bool {
        self.morning.is_none() && self.afternoon.is_none() && self.evening.is_none()
    }

    pub fn prefers_morning(&self) -> bool {
        self.morning != Some(false)
    }

    pub fn prefers_afternoon(&self) -> bool {
        self.afternoon != Some(false)
    }

    pub fn prefers_evening(&self) -> bool {
        self.evening != Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySettings {
    #[serde(default, with = "date_format::optional")]
    pub start_block_date: Option<NaiveDate>,
    #[serde(default, with = "date_format::optional")]
    pub end_block_date: Option<NaiveDate>,
    #[serde(default = "default_study_days")]
    pub study_days_per_week: u8,
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
    #[serde(default)]
    pub selected_days: SelectedDays,
    #[serde(default = "default_session_duration")]
    pub session_duration: f64,
    /// Informational; the scheduler does not consume it.
    #[serde(default = "default_break_minutes")]
    pub break_duration: u32,
    /// Hour of day the exams start. Only the exam date bounds scheduling.
    #[serde(default = "default_exam_hour")]
    pub exam_hour: f64,
    #[serde(default, skip_serializing_if = "PreferredTimeSlots::is_unset")]
    pub preferred_time_slots: PreferredTimeSlots,
}

impl Default for StudySettings {
    fn default() -> Self {
        Self {
            start_block_date: None,
            end_block_date: None,
            study_days_per_week: DEFAULT_STUDY_DAYS_PER_WEEK,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            selected_days: SelectedDays::default(),
            session_duration: DEFAULT_SESSION_DURATION,
            break_duration: DEFAULT_BREAK_MINUTES,
            exam_hour: DEFAULT_EXAM_HOUR,
            preferred_time_slots: PreferredTimeSlots::default(),
        }
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySettingsUpdate {
    #[serde(default, deserialize_with = "date_format::patch::deserialize")]
    pub start_block_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "date_format::patch::deserialize")]
    pub end_block_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub study_days_per_week: Option<u8>,
    #[serde(default)]
    pub hours_per_day: Option<f64>,
    #[serde(default)]
    pub selected_days: Option<SelectedDays>,
    #[serde(default)]
    pub session_duration: Option<f64>,
    #[serde(default)]
    pub break_duration: Option<u32>,
    #[serde(default)]
    pub exam_hour: Option<f64>,
    #[serde(default)]
    pub preferred_time_slots: Option<PreferredTimeSlots>,
}

fn default_study_days() -> u8 {
    DEFAULT_STUDY_DAYS_PER_WEEK
}

fn default_hours_per_day() -> f64 {
    DEFAULT_HOURS_PER_DAY
}

fn default_session_duration() -> f64 {
    DEFAULT_SESSION_DURATION
}

fn default_break_minutes() -> u32 {
    DEFAULT_BREAK_MINUTES
}

fn default_exam_hour() -> f64 {
    DEFAULT_EXAM_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn picker_keys_map_monday_first() {
        let days: SelectedDays =
            serde_json::from_value(json!({"day0": false, "day6": false})).expect("parse days");
        assert!(!days.is_selected(Weekday::Monday));
        assert!(!days.is_selected(Weekday::Sunday));
        assert!(days.is_selected(Weekday::Tuesday));
        assert_eq!(
            Weekday::from_chrono(chrono::Weekday::Sun).picker_index(),
            6
        );
    }

    #[test]
    fn all_days_disabled_falls_back_to_full_week() {
        let days = SelectedDays::only(&[]);
        assert_eq!(days.active_weekdays(), Weekday::ALL.to_vec());
    }

    #[test]
    fn empty_date_strings_deserialize_as_unset() {
        let settings: StudySettings = serde_json::from_value(json!({
            "startBlockDate": "",
            "endBlockDate": "2025-06-30",
            "studyDaysPerWeek": 6
        }))
        .expect("parse settings");
        assert_eq!(settings.start_block_date, None);
        assert_eq!(
            settings.end_block_date,
            NaiveDate::from_ymd_opt(2025, 6, 30)
        );
        assert_eq!(settings.hours_per_day, DEFAULT_HOURS_PER_DAY);
        assert_eq!(settings.session_duration, DEFAULT_SESSION_DURATION);
    }

    #[test]
    fn time_slots_survive_a_json_round_trip() {
        let settings: StudySettings = serde_json::from_value(json!({
            "preferredTimeSlots": {"morning": true, "evening": false}
        }))
        .expect("parse settings");
        assert!(settings.preferred_time_slots.prefers_morning());
        assert!(settings.preferred_time_slots.prefers_afternoon());
        assert!(!settings.preferred_time_slots.prefers_evening());

        let value = serde_json::to_value(&settings).expect("json");
        assert_eq!(
            value["preferredTimeSlots"],
            json!({"morning": true, "evening": false})
        );
        assert!(serde_json::to_value(StudySettings::default())
            .expect("json")
            .get("preferredTimeSlots")
            .is_none());
    }

    #[test]
    fn update_distinguishes_clear_from_absent() {
        let update: StudySettingsUpdate =
            serde_json::from_value(json!({"startBlockDate": ""})).expect("parse update");
        assert_eq!(update.start_block_date, Some(None));
        assert_eq!(update.end_block_date, None);
    }
}
