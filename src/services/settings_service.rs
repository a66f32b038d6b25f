use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde_json::json;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::{AppSettingRow, SettingsRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::{
    PreferredTimeSlots, SelectedDays, StudySettings, StudySettingsUpdate, DEFAULT_BREAK_MINUTES,
    DEFAULT_EXAM_HOUR, DEFAULT_HOURS_PER_DAY, DEFAULT_SESSION_DURATION,
    DEFAULT_STUDY_DAYS_PER_WEEK,
};
use crate::services::schedule_utils;

const KEY_PREFIX: &str = "study.";
const KEY_START_BLOCK: &str = "study.start_block_date";
const KEY_END_BLOCK: &str = "study.end_block_date";
const KEY_DAYS_PER_WEEK: &str = "study.days_per_week";
const KEY_HOURS_PER_DAY: &str = "study.hours_per_day";
const KEY_SELECTED_DAYS: &str = "study.selected_days";
const KEY_SESSION_DURATION: &str = "study.session_duration";
const KEY_BREAK_DURATION: &str = "study.break_duration";
const KEY_EXAM_HOUR: &str = "study.exam_hour";
const KEY_TIME_SLOTS: &str = "study.preferred_time_slots";

pub const KEY_PROFILE_LAST_UPDATED: &str = "profile.last_updated";

pub const SESSION_DURATION_OPTIONS: [f64; 5] = [0.5, 1.0, 2.0, 3.0, 4.0];
pub const BREAK_DURATION_OPTIONS: [u32; 3] = [15, 30, 60];
const MIN_HOURS_PER_DAY: f64 = 0.5;
const MAX_HOURS_PER_DAY: f64 = 12.0;

pub struct SettingsService {
    db: DbPool,
    cache: RwLock<Option<StudySettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<StudySettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.db.with_connection(read_settings)?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    /// Merges `input` over the current settings; absent fields are kept.
    pub fn update(&self, input: StudySettingsUpdate) -> AppResult<StudySettings> {
        let current = self.db.with_transaction(|tx| {
            let mut current = read_settings(tx)?;
            apply_update(&mut current, input);
            validate_settings(&current)?;
            write_settings(tx, &current)?;
            touch_last_updated(tx)?;
            Ok(current)
        })?;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }

        info!(
            target: "app::settings",
            days_per_week = current.study_days_per_week,
            hours_per_day = current.hours_per_day,
            "study settings updated"
        );
        Ok(current)
    }

    /// Drops the cached copy; the next `get` reads the store again.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cache.write() {
            *guard = None;
        }
    }
}

pub fn validate_settings(settings: &StudySettings) -> AppResult<()> {
    if !(1..=7).contains(&settings.study_days_per_week) {
        return Err(AppError::validation_with_details(
            "study days per week must be between 1 and 7",
            json!({"studyDaysPerWeek": settings.study_days_per_week}),
        ));
    }

    let hours = settings.hours_per_day;
    if !hours.is_finite()
        || !(MIN_HOURS_PER_DAY..=MAX_HOURS_PER_DAY).contains(&hours)
        || (hours * 2.0).fract() != 0.0
    {
        return Err(AppError::validation_with_details(
            "hours per day must be between 0.5 and 12 in half-hour steps",
            json!({"hoursPerDay": hours}),
        ));
    }

    if !SESSION_DURATION_OPTIONS.contains(&settings.session_duration) {
        return Err(AppError::validation_with_details(
            "session duration must be one of 0.5, 1, 2, 3 or 4 hours",
            json!({"sessionDuration": settings.session_duration}),
        ));
    }

    if !BREAK_DURATION_OPTIONS.contains(&settings.break_duration) {
        return Err(AppError::validation_with_details(
            "break duration must be 15, 30 or 60 minutes",
            json!({"breakDuration": settings.break_duration}),
        ));
    }

    if !settings.exam_hour.is_finite() || !(0.0..24.0).contains(&settings.exam_hour) {
        return Err(AppError::validation_with_details(
            "exam hour must be within the day",
            json!({"examHour": settings.exam_hour}),
        ));
    }

    if let (Some(start), Some(end)) = (settings.start_block_date, settings.end_block_date) {
        if start > end {
            return Err(AppError::validation_with_details(
                "study block must start before it ends",
                json!({
                    "startBlockDate": schedule_utils::format_date(start),
                    "endBlockDate": schedule_utils::format_date(end),
                }),
            ));
        }
    }

    Ok(())
}

fn apply_update(current: &mut StudySettings, input: StudySettingsUpdate) {
    if let Some(start) = input.start_block_date {
        current.start_block_date = start;
    }
    if let Some(end) = input.end_block_date {
        current.end_block_date = end;
    }
    if let Some(days) = input.study_days_per_week {
        current.study_days_per_week = days;
    }
    if let Some(hours) = input.hours_per_day {
        current.hours_per_day = hours;
    }
    if let Some(selected) = input.selected_days {
        current.selected_days = selected;
    }
    if let Some(duration) = input.session_duration {
        current.session_duration = duration;
    }
    if let Some(minutes) = input.break_duration {
        current.break_duration = minutes;
    }
    if let Some(hour) = input.exam_hour {
        current.exam_hour = hour;
    }
    if let Some(slots) = input.preferred_time_slots {
        current.preferred_time_slots = slots;
    }
}

/// Reads study settings from the key/value table. Unreadable entries fall
/// back to their defaults.
pub(crate) fn read_settings(conn: &Connection) -> AppResult<StudySettings> {
    let rows = SettingsRepository::list_with_prefix(conn, KEY_PREFIX)?;
    let map: HashMap<String, AppSettingRow> =
        rows.into_iter().map(|row| (row.key.clone(), row)).collect();

    let selected_days = match map.get(KEY_SELECTED_DAYS) {
        Some(row) => serde_json::from_str::<SelectedDays>(&row.value).unwrap_or_else(|err| {
            warn!(target: "app::settings", error = %err, "stored weekday selection unreadable");
            SelectedDays::default()
        }),
        None => SelectedDays::default(),
    };

    let preferred_time_slots = match map.get(KEY_TIME_SLOTS) {
        Some(row) => serde_json::from_str::<PreferredTimeSlots>(&row.value).unwrap_or_else(|err| {
            warn!(target: "app::settings", error = %err, "stored time slots unreadable");
            PreferredTimeSlots::default()
        }),
        None => PreferredTimeSlots::default(),
    };

    Ok(StudySettings {
        start_block_date: stored_date(&map, KEY_START_BLOCK),
        end_block_date: stored_date(&map, KEY_END_BLOCK),
        study_days_per_week: stored_value(&map, KEY_DAYS_PER_WEEK)
            .unwrap_or(DEFAULT_STUDY_DAYS_PER_WEEK),
        hours_per_day: stored_value(&map, KEY_HOURS_PER_DAY).unwrap_or(DEFAULT_HOURS_PER_DAY),
        selected_days,
        session_duration: stored_value(&map, KEY_SESSION_DURATION)
            .unwrap_or(DEFAULT_SESSION_DURATION),
        break_duration: stored_value(&map, KEY_BREAK_DURATION).unwrap_or(DEFAULT_BREAK_MINUTES),
        exam_hour: stored_value(&map, KEY_EXAM_HOUR).unwrap_or(DEFAULT_EXAM_HOUR),
        preferred_time_slots,
    })
}

pub(crate) fn write_settings(conn: &Connection, settings: &StudySettings) -> AppResult<()> {
    write_date(conn, KEY_START_BLOCK, settings.start_block_date)?;
    write_date(conn, KEY_END_BLOCK, settings.end_block_date)?;
    SettingsRepository::upsert(
        conn,
        KEY_DAYS_PER_WEEK,
        &settings.study_days_per_week.to_string(),
    )?;
    SettingsRepository::upsert(conn, KEY_HOURS_PER_DAY, &settings.hours_per_day.to_string())?;
    SettingsRepository::upsert(
        conn,
        KEY_SELECTED_DAYS,
        &serde_json::to_string(&settings.selected_days)?,
    )?;
    SettingsRepository::upsert(
        conn,
        KEY_SESSION_DURATION,
        &settings.session_duration.to_string(),
    )?;
    SettingsRepository::upsert(
        conn,
        KEY_BREAK_DURATION,
        &settings.break_duration.to_string(),
    )?;
    SettingsRepository::upsert(conn, KEY_EXAM_HOUR, &settings.exam_hour.to_string())?;
    SettingsRepository::upsert(
        conn,
        KEY_TIME_SLOTS,
        &serde_json::to_string(&settings.preferred_time_slots)?,
    )?;
    Ok(())
}

/// Stamps the profile as modified now.
pub(crate) fn touch_last_updated(conn: &Connection) -> AppResult<DateTime<Utc>> {
    let now = Utc::now();
    write_last_updated(conn, now)?;
    Ok(now)
}

pub(crate) fn write_last_updated(conn: &Connection, at: DateTime<Utc>) -> AppResult<()> {
    SettingsRepository::upsert(conn, KEY_PROFILE_LAST_UPDATED, &at.to_rfc3339())
}

pub(crate) fn read_last_updated(conn: &Connection) -> AppResult<Option<DateTime<Utc>>> {
    let Some(row) = SettingsRepository::get(conn, KEY_PROFILE_LAST_UPDATED)? else {
        return Ok(None);
    };

    match DateTime::parse_from_rfc3339(&row.value) {
        Ok(parsed) => Ok(Some(parsed.with_timezone(&Utc))),
        Err(err) => {
            warn!(target: "app::settings", error = %err, "stored profile timestamp unreadable");
            Ok(None)
        }
    }
}

fn write_date(conn: &Connection, key: &str, value: Option<NaiveDate>) -> AppResult<()> {
    match value {
        Some(date) => SettingsRepository::upsert(conn, key, &schedule_utils::format_date(date)),
        None => SettingsRepository::delete(conn, key),
    }
}

fn stored_date(map: &HashMap<String, AppSettingRow>, key: &str) -> Option<NaiveDate> {
    let row = map.get(key)?;
    match schedule_utils::parse_date(&row.value) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(target: "app::settings", key, value = %row.value, "stored date unreadable");
            None
        }
    }
}

fn stored_value<T: std::str::FromStr>(map: &HashMap<String, AppSettingRow>, key: &str) -> Option<T> {
    map.get(key).and_then(|row| row.value.parse::<T>().ok())
}
