//! Session-level operations: create, read, patch and delete.

use chrono::Utc;
use diesel::prelude::*;
use log::{debug, info};

use crate::db::models;
use crate::db::schema::{performed_exercises, sets, workout_sessions};
use crate::error::{EntityKind, Result, StoreError};
use crate::session::aggregate::{assemble, delete_session_rows, load_session, require_session};
use crate::session::objects::{SessionInput, SessionPatch, WorkoutSession};
use crate::session::ordering::position_from_index;
use crate::session::session::{SessionStore, warn_on_conflict};
use crate::{exercises, plans, users};

impl SessionStore {
    /// Create a session, optionally pre-populated with performed exercises.
    ///
    /// Each exercise gets `order` equal to its index in the input, and each
    /// set its index within that exercise. The session, exercise and set
    /// rows are written in one transaction.
    pub async fn create_session(&self, input: SessionInput) -> Result<WorkoutSession> {
        input.validate()?;

        let result = self
            .db
            .transaction(move |conn| {
                users::require_user(conn, input.user_id)?;
                if let Some(plan_id) = input.workout_plan_id {
                    plans::require_plan(conn, plan_id)?;
                }

                let now = Utc::now().naive_utc();
                let session_id: i32 = diesel::insert_into(workout_sessions::table)
                    .values(&models::NewWorkoutSession {
                        user_id: input.user_id,
                        workout_plan_id: input.workout_plan_id,
                        date: input.date.unwrap_or(now),
                        notes: input.notes,
                        completed: false,
                        created_at: now,
                        updated_at: now,
                    })
                    .returning(workout_sessions::id)
                    .get_result(conn)?;

                for (index, exercise) in input.performed_exercises.iter().enumerate() {
                    exercises::require_exercise(conn, exercise.exercise_id)?;
                    let performed_exercise_id: i32 =
                        diesel::insert_into(performed_exercises::table)
                            .values(&models::NewPerformedExercise {
                                session_id,
                                exercise_id: exercise.exercise_id,
                                position: position_from_index(index)?,
                            })
                            .returning(performed_exercises::id)
                            .get_result(conn)?;

                    let new_sets = exercise
                        .sets
                        .iter()
                        .enumerate()
                        .map(|(set_index, set)| {
                            Ok(models::NewWorkoutSet {
                                performed_exercise_id,
                                reps: set.reps,
                                weight: set.weight,
                                position: position_from_index(set_index)?,
                                rest_time: set.rest_time,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?;
                    if !new_sets.is_empty() {
                        diesel::insert_into(sets::table)
                            .values(&new_sets)
                            .execute(conn)?;
                    }
                }

                load_session(conn, session_id)
            })
            .await;

        let session = warn_on_conflict("create_session", result)?;
        info!(
            "Created workout session {} for user {} with {} exercises",
            session.id,
            session.user_id,
            session.exercises.len()
        );
        Ok(session)
    }

    /// Get a session with its exercises and sets sorted by `order`.
    pub async fn get_session(&self, id: i32) -> Result<WorkoutSession> {
        debug!("Loading workout session {}", id);
        self.db.read(move |conn| load_session(conn, id)).await
    }

    /// All sessions by ascending id, each fully populated.
    pub async fn list_sessions(&self) -> Result<Vec<WorkoutSession>> {
        let sessions = self
            .db
            .read(|conn| {
                let rows = workout_sessions::table
                    .select(models::WorkoutSession::as_select())
                    .order(workout_sessions::id.asc())
                    .load(conn)?;
                assemble(conn, rows)
            })
            .await?;
        debug!("Listed {} workout sessions", sessions.len());
        Ok(sessions)
    }

    /// A user's sessions, most recent first.
    pub async fn list_sessions_for_user(&self, user_id: i32) -> Result<Vec<WorkoutSession>> {
        self.db
            .read(move |conn| {
                users::require_user(conn, user_id)?;
                let rows = workout_sessions::table
                    .filter(workout_sessions::user_id.eq(user_id))
                    .select(models::WorkoutSession::as_select())
                    .order((workout_sessions::date.desc(), workout_sessions::id.desc()))
                    .load(conn)?;
                assemble(conn, rows)
            })
            .await
    }

    /// Apply the provided fields only. An empty patch changes nothing,
    /// not even `updated_at`.
    pub async fn update_session_fields(
        &self,
        id: i32,
        patch: SessionPatch,
    ) -> Result<WorkoutSession> {
        let completing = patch.completed == Some(true);
        let (before, session) = self
            .db
            .transaction(move |conn| {
                let before = require_session(conn, id)?;
                if !patch.is_empty() {
                    if let Some(Some(plan_id)) = patch.workout_plan_id {
                        plans::require_plan(conn, plan_id)?;
                    }
                    let now = Utc::now().naive_utc();
                    diesel::update(workout_sessions::table.find(id))
                        .set(&patch.into_changeset(now))
                        .execute(conn)?;
                }
                Ok((before, load_session(conn, id)?))
            })
            .await?;

        if completing && !before.completed {
            info!("Workout session {} completed", id);
        } else {
            debug!("Updated workout session {}", id);
        }
        Ok(session)
    }

    /// Delete a session with its exercises and sets. Deleting a missing
    /// session is an error, not a silent success.
    pub async fn delete_session(&self, id: i32) -> Result<()> {
        self.db
            .transaction(move |conn| {
                require_session(conn, id)?;
                match delete_session_rows(conn, &[id])? {
                    0 => Err(StoreError::not_found(EntityKind::WorkoutSession, id)),
                    _ => Ok(()),
                }
            })
            .await?;
        info!("Deleted workout session {}", id);
        Ok(())
    }
}
