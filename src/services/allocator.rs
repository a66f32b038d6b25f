//! Weighted distribution of the window's study hours across courses.
//!
//! Pure: no I/O, no clock reads. "Today" is an argument so the same inputs
//! always produce the same breakdown.

use chrono::NaiveDate;
use tracing::debug;

use crate::models::course::CourseRecord;
use crate::models::planning::{AllocationBreakdown, CourseAllocation};
use crate::models::settings::StudySettings;
use crate::services::schedule_utils;

pub fn compute_allocation(
    settings: &StudySettings,
    courses: &[CourseRecord],
    today: NaiveDate,
) -> AllocationBreakdown {
    let with_exams: Vec<(&CourseRecord, NaiveDate)> = courses
        .iter()
        .filter_map(|course| course.exam_date.map(|exam| (course, exam)))
        .collect();

    let (Some(earliest_exam), Some(latest_exam)) = (
        with_exams.iter().map(|(_, exam)| *exam).min(),
        with_exams.iter().map(|(_, exam)| *exam).max(),
    ) else {
        debug!(target: "app::planning", "no course has an exam date, empty allocation");
        return AllocationBreakdown::default();
    };

    let start = settings
        .start_block_date
        .unwrap_or_else(|| today.min(earliest_exam));
    let end = settings.end_block_date.unwrap_or(latest_exam);
    let effective_start = start.max(today);

    let total_days = schedule_utils::inclusive_days(effective_start, end);
    let study_days = schedule_utils::prorated_study_days(total_days, settings.study_days_per_week);
    let total_potential_hours = study_days as f64 * settings.hours_per_day;

    let total_weight: u32 = with_exams.iter().map(|(course, _)| course.weight()).sum();

    let courses_breakdown: Vec<CourseAllocation> = with_exams
        .iter()
        .map(|(course, exam)| {
            let weight = course.weight();
            let recommended_hours = if total_weight > 0 {
                (f64::from(weight) / f64::from(total_weight) * total_potential_hours).round()
            } else {
                0.0
            };
            let time_studied = course.time_studied_so_far;
            let remaining_hours = (recommended_hours - time_studied).max(0.0);
            let progress = if recommended_hours > 0.0 {
                time_studied / recommended_hours
            } else {
                0.0
            };

            CourseAllocation {
                course_id: course.id.clone(),
                course_name: course.name.clone(),
                recommended_hours,
                time_studied,
                remaining_hours,
                weight,
                exam_date: Some(*exam),
                progress,
            }
        })
        .collect();

    let total_remaining_hours: f64 = courses_breakdown.iter().map(|c| c.remaining_hours).sum();

    debug!(
        target: "app::planning",
        courses = courses_breakdown.len(),
        total_days,
        study_days,
        total_potential_hours,
        "allocation computed"
    );

    AllocationBreakdown {
        total_potential_hours: total_potential_hours.max(0.0),
        total_remaining_hours: total_remaining_hours.max(0.0),
        courses_breakdown,
        start_date: Some(effective_start),
        end_date: Some(end),
        total_days,
    }
}
