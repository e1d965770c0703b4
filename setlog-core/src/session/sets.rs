//! Set operations inside one performed exercise.

use chrono::Utc;
use diesel::prelude::*;
use log::{debug, info};

use crate::db::models;
use crate::db::schema::sets;
use crate::error::Result;
use crate::session::aggregate::{load_session, require_performed_exercise, require_set, touch_session};
use crate::session::objects::{SetInput, SetPatch, WorkoutSession};
use crate::session::ordering::{next_set_position, renumber_sets};
use crate::session::session::{SessionStore, warn_on_conflict};

impl SessionStore {
    /// Append a set; its `order` is the exercise's current set count.
    pub async fn add_set(
        &self,
        session_id: i32,
        performed_exercise_id: i32,
        input: SetInput,
    ) -> Result<WorkoutSession> {
        input.validate()?;

        let result = self
            .db
            .transaction(move |conn| {
                require_performed_exercise(conn, session_id, performed_exercise_id)?;
                let position = next_set_position(conn, performed_exercise_id)?;
                diesel::insert_into(sets::table)
                    .values(&models::NewWorkoutSet {
                        performed_exercise_id,
                        reps: input.reps,
                        weight: input.weight,
                        position,
                        rest_time: input.rest_time,
                    })
                    .execute(conn)?;

                touch_session(conn, session_id, Utc::now().naive_utc())?;
                load_session(conn, session_id)
            })
            .await;

        let session = warn_on_conflict("add_set", result)?;
        debug!(
            "Added set to performed exercise {} in workout session {}",
            performed_exercise_id, session_id
        );
        Ok(session)
    }

    /// Update the provided fields of one set. `order` is left alone.
    pub async fn update_set(
        &self,
        session_id: i32,
        performed_exercise_id: i32,
        set_id: i32,
        patch: SetPatch,
    ) -> Result<WorkoutSession> {
        patch.validate()?;

        self.db
            .transaction(move |conn| {
                require_performed_exercise(conn, session_id, performed_exercise_id)?;
                require_set(conn, performed_exercise_id, set_id)?;

                if !patch.is_empty() {
                    diesel::update(sets::table.find(set_id))
                        .set(&patch.into_changeset())
                        .execute(conn)?;
                    touch_session(conn, session_id, Utc::now().naive_utc())?;
                }
                load_session(conn, session_id)
            })
            .await
    }

    /// Delete one set and renumber the survivors to `0..n`, keeping their
    /// relative order.
    pub async fn remove_set(
        &self,
        session_id: i32,
        performed_exercise_id: i32,
        set_id: i32,
    ) -> Result<WorkoutSession> {
        let (moved, session) = self
            .db
            .transaction(move |conn| {
                require_performed_exercise(conn, session_id, performed_exercise_id)?;
                require_set(conn, performed_exercise_id, set_id)?;

                diesel::delete(sets::table.find(set_id)).execute(conn)?;
                let moved = renumber_sets(conn, performed_exercise_id)?;

                touch_session(conn, session_id, Utc::now().naive_utc())?;
                Ok((moved, load_session(conn, session_id)?))
            })
            .await?;

        info!(
            "Removed set {} from performed exercise {} ({} renumbered)",
            set_id, performed_exercise_id, moved
        );
        Ok(session)
    }
}
