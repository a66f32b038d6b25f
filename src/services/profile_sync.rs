//! Reconciles the local profile with a copy held by another store, and
//! moves whole profiles in and out of the database.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use crate::db::repositories::course_repository::{CourseRepository, CourseRow};
use crate::db::repositories::plan_override_repository::PlanOverrideRepository;
use crate::db::repositories::task_repository::{TaskRepository, TaskRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::profile::{MergeWinner, ProfileSnapshot, ResolvedProfile};
use crate::services::planning_service::{clear_override, load_courses, load_override, store_override};
use crate::services::settings_service::{
    read_last_updated, read_settings, validate_settings, write_last_updated, write_settings,
    SettingsService,
};
use crate::services::{course_service, task_service};

/// Newest `last_updated` wins; ties and missing timestamps favour `local`.
/// Collections the winner has left empty are taken from the other side.
pub fn merge(remote: ProfileSnapshot, local: ProfileSnapshot) -> ResolvedProfile {
    let (winner, mut profile, loser) = if remote.last_updated > local.last_updated {
        (MergeWinner::Remote, remote, local)
    } else {
        (MergeWinner::Local, local, remote)
    };

    let mut backfilled = Vec::new();
    if profile.courses.is_empty() && !loser.courses.is_empty() {
        profile.courses = loser.courses;
        backfilled.push("courses".to_string());
    }
    if profile.tasks.is_empty() && !loser.tasks.is_empty() {
        profile.tasks = loser.tasks;
        backfilled.push("tasks".to_string());
    }
    if profile.custom_planning.is_none() && loser.custom_planning.is_some() {
        profile.custom_planning = loser.custom_planning;
        backfilled.push("customPlanning".to_string());
    }

    // Tasks may come from the other side than the courses they point at.
    let course_ids: HashSet<&str> = profile.courses.iter().map(|c| c.id.as_str()).collect();
    let mut unlinked = 0usize;
    for task in &mut profile.tasks {
        if task
            .course_id
            .as_deref()
            .is_some_and(|id| !course_ids.contains(id))
        {
            task.course_id = None;
            unlinked += 1;
        }
    }
    if unlinked > 0 {
        debug!(target: "app::sync", unlinked, "tasks detached from courses missing after merge");
    }

    ResolvedProfile {
        profile,
        winner,
        backfilled,
    }
}

pub struct ProfileSyncService {
    db: DbPool,
    settings: Arc<SettingsService>,
}

impl ProfileSyncService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>) -> Self {
        Self { db, settings }
    }

    pub fn export_profile(&self) -> AppResult<ProfileSnapshot> {
        self.db.with_connection(|conn| {
            let tasks = TaskRepository::list_all(conn)?
                .into_iter()
                .map(TaskRow::into_record)
                .collect();
            Ok(ProfileSnapshot {
                settings: read_settings(conn)?,
                courses: load_courses(conn)?,
                tasks,
                custom_planning: load_override(conn)?.map(|record| record.plan),
                last_updated: read_last_updated(conn)?,
            })
        })
    }

    /// Replaces all local state with `snapshot`. Nothing is written unless
    /// every part of it is accepted.
    pub fn import_profile(&self, snapshot: ProfileSnapshot) -> AppResult<()> {
        validate_settings(&snapshot.settings)?;
        for course in &snapshot.courses {
            if course.id.trim().is_empty() || course.name.trim().is_empty() {
                return Err(AppError::validation_with_details(
                    "imported course needs an id and a name",
                    json!({"courseId": course.id}),
                ));
            }
            course_service::validate_record(course)?;
        }
        for task in &snapshot.tasks {
            task_service::validate_record(task)?;
        }

        self.db.with_transaction(|tx| {
            TaskRepository::delete_all(tx)?;
            CourseRepository::delete_all(tx)?;

            for course in &snapshot.courses {
                CourseRepository::insert(tx, &CourseRow::from_record(course))?;
            }
            for task in &snapshot.tasks {
                TaskRepository::insert(tx, &TaskRow::from_record(task))?;
            }

            write_settings(tx, &snapshot.settings)?;

            let current = PlanOverrideRepository::current_revision(tx)?;
            match snapshot.custom_planning.as_ref() {
                Some(plan) => {
                    store_override(tx, plan, None, current)?;
                }
                None if PlanOverrideRepository::get_active(tx)?.is_some() => {
                    clear_override(tx, current)?;
                }
                None => {}
            }

            write_last_updated(tx, snapshot.last_updated.unwrap_or_else(Utc::now))?;
            Ok(())
        })?;

        self.settings.invalidate();
        info!(
            target: "app::sync",
            courses = snapshot.courses.len(),
            tasks = snapshot.tasks.len(),
            has_override = snapshot.custom_planning.is_some(),
            "profile imported"
        );
        Ok(())
    }

    /// Merges `remote` with the local profile and stores the result locally.
    pub fn reconcile(&self, remote: ProfileSnapshot) -> AppResult<ResolvedProfile> {
        let local = self.export_profile()?;
        let resolved = merge(remote, local);

        if resolved.winner == MergeWinner::Remote || !resolved.backfilled.is_empty() {
            self.import_profile(resolved.profile.clone())?;
        }

        info!(
            target: "app::sync",
            winner = ?resolved.winner,
            backfilled = ?resolved.backfilled,
            "profile reconciled"
        );
        Ok(resolved)
    }
}
