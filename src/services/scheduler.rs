//! Turns an allocation breakdown into dated study sessions.
//!
//! Each course is packed independently: a 4h final block on the eve of its
//! exam, then regular sessions on active weekdays from today onward. Days are
//! the union of whatever lands on them. Hours that do not fit before the exam
//! are left unscheduled.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::planning::{
    CourseAllocation, PlanDay, PlanSession, SessionKind, StudyPlan, FINAL_REVISION_HOURS,
};
use crate::models::settings::StudySettings;
use crate::services::schedule_utils;

pub fn generate_schedule(
    settings: &StudySettings,
    courses_breakdown: &[CourseAllocation],
    today: NaiveDate,
) -> StudyPlan {
    let active_days = settings.selected_days.active_weekdays();
    let session_duration = settings.session_duration;
    let mut calendar: BTreeMap<NaiveDate, Vec<PlanSession>> = BTreeMap::new();

    for course in courses_breakdown {
        let Some(limit_date) = course.exam_date else {
            continue;
        };
        if course.remaining_hours <= 0.0 {
            continue;
        }

        let mut remaining = course.remaining_hours;
        // The eve of the exam is reserved for the final block whether or not
        // one gets placed.
        let eve = schedule_utils::previous_day(limit_date);

        if remaining >= FINAL_REVISION_HOURS {
            match eve {
                Some(eve) if eve >= today => {
                    calendar.entry(eve).or_default().push(PlanSession {
                        course_id: course.course_id.clone(),
                        course_name: course.course_name.clone(),
                        duration: FINAL_REVISION_HOURS,
                        kind: SessionKind::RevisionFinale,
                    });
                    remaining -= FINAL_REVISION_HOURS;
                }
                _ => {
                    debug!(
                        target: "app::planning",
                        course_id = %course.course_id,
                        "eve of exam already past, final block skipped"
                    );
                }
            }
        }

        if remaining > 0.0 && session_duration > 0.0 {
            let available = schedule_utils::dates_until(today, limit_date).filter(|date| {
                Some(*date) != eve
                    && active_days.contains(&schedule_utils::weekday_of(*date))
            });

            for date in available {
                if remaining <= 0.0 {
                    break;
                }
                let hours = session_duration.min(remaining);
                calendar.entry(date).or_default().push(PlanSession {
                    course_id: course.course_id.clone(),
                    course_name: course.course_name.clone(),
                    duration: hours,
                    kind: SessionKind::Revision,
                });
                remaining -= hours;
            }
        }

        if remaining > 0.0 {
            debug!(
                target: "app::planning",
                course_id = %course.course_id,
                unscheduled_hours = remaining,
                "not enough study days before exam"
            );
        }
    }

    let days = calendar
        .into_iter()
        .map(|(date, mut sessions)| {
            sort_sessions(&mut sessions);
            let mut day = PlanDay {
                date,
                sessions,
                total_hours: 0.0,
            };
            day.recompute_total();
            day
        })
        .collect();

    let plan = StudyPlan::from_days(days);
    debug!(
        target: "app::planning",
        days = plan.total_days,
        sessions = plan.total_sessions,
        "schedule generated"
    );
    plan
}

/// Final blocks first, then by course name.
pub fn sort_sessions(sessions: &mut [PlanSession]) {
    sessions.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then_with(|| a.course_name.cmp(&b.course_name))
    });
}
