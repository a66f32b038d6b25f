//! In-place edits on a user-owned plan. A reference to a day or session index
//! that no longer exists is ignored and reported as `false`.

use chrono::NaiveDate;

use crate::models::planning::{PlanDay, PlanSession, SessionKind, StudyPlan};

pub fn edit_session(
    plan: &mut StudyPlan,
    date: NaiveDate,
    session_index: usize,
    course_id: &str,
    course_name: &str,
    duration: f64,
) -> bool {
    let Some(session) = plan
        .daily_planning
        .iter_mut()
        .find(|day| day.date == date)
        .and_then(|day| day.sessions.get_mut(session_index))
    else {
        return false;
    };

    session.course_id = course_id.to_string();
    session.course_name = course_name.to_string();
    session.duration = duration;
    plan.refresh_totals();
    true
}

pub fn add_session(
    plan: &mut StudyPlan,
    date: NaiveDate,
    course_id: &str,
    course_name: &str,
    duration: f64,
) {
    push_session(
        plan,
        date,
        PlanSession {
            course_id: course_id.to_string(),
            course_name: course_name.to_string(),
            duration,
            kind: SessionKind::Revision,
        },
    );
}

pub fn remove_session(plan: &mut StudyPlan, date: NaiveDate, session_index: usize) -> Option<PlanSession> {
    let day_position = plan.daily_planning.iter().position(|day| day.date == date)?;
    let day = &mut plan.daily_planning[day_position];
    if session_index >= day.sessions.len() {
        return None;
    }

    let removed = day.sessions.remove(session_index);
    if day.sessions.is_empty() {
        plan.daily_planning.remove(day_position);
    }
    plan.refresh_totals();
    Some(removed)
}

/// Moves a session to another day, keeping its course, duration and kind.
pub fn move_session(
    plan: &mut StudyPlan,
    from_date: NaiveDate,
    session_index: usize,
    to_date: NaiveDate,
) -> bool {
    match remove_session(plan, from_date, session_index) {
        Some(session) => {
            push_session(plan, to_date, session);
            true
        }
        None => false,
    }
}

fn push_session(plan: &mut StudyPlan, date: NaiveDate, session: PlanSession) {
    match plan
        .daily_planning
        .binary_search_by(|day| day.date.cmp(&date))
    {
        Ok(position) => plan.daily_planning[position].sessions.push(session),
        Err(position) => {
            let mut day = PlanDay::new(date);
            day.sessions.push(session);
            plan.daily_planning.insert(position, day);
        }
    }
    plan.refresh_totals();
}
