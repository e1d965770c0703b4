//! Reading, guarding and deleting the session aggregate on a single connection.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::db::models;
use crate::db::schema::{performed_exercises, sets, workout_sessions};
use crate::error::{EntityKind, Result, StoreError};
use crate::session::objects::{PerformedExercise, WorkoutSession};

pub(crate) fn require_session(conn: &mut SqliteConnection, id: i32) -> Result<models::WorkoutSession> {
    workout_sessions::table
        .find(id)
        .select(models::WorkoutSession::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(EntityKind::WorkoutSession, id))
}

/// Looks up a performed exercise that belongs to `session_id`.
pub(crate) fn require_performed_exercise(
    conn: &mut SqliteConnection,
    session_id: i32,
    performed_exercise_id: i32,
) -> Result<models::PerformedExercise> {
    require_session(conn, session_id)?;
    performed_exercises::table
        .filter(performed_exercises::id.eq(performed_exercise_id))
        .filter(performed_exercises::session_id.eq(session_id))
        .select(models::PerformedExercise::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(
            EntityKind::PerformedExercise,
            performed_exercise_id,
        ))
}

pub(crate) fn require_set(
    conn: &mut SqliteConnection,
    performed_exercise_id: i32,
    set_id: i32,
) -> Result<models::WorkoutSet> {
    sets::table
        .filter(sets::id.eq(set_id))
        .filter(sets::performed_exercise_id.eq(performed_exercise_id))
        .select(models::WorkoutSet::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(EntityKind::Set, set_id))
}

pub(crate) fn touch_session(conn: &mut SqliteConnection, id: i32, now: NaiveDateTime) -> Result<()> {
    diesel::update(workout_sessions::table.find(id))
        .set(workout_sessions::updated_at.eq(now))
        .execute(conn)?;
    Ok(())
}

pub(crate) fn load_session(conn: &mut SqliteConnection, id: i32) -> Result<WorkoutSession> {
    let row = require_session(conn, id)?;
    assemble(conn, vec![row])?
        .into_iter()
        .next()
        .ok_or(StoreError::not_found(EntityKind::WorkoutSession, id))
}

/// Upper bound on ids bound into one `IN (...)` list, well under SQLite's
/// host-parameter limit.
const ID_CHUNK: usize = 10_000;

/// Attaches exercises and sets to each session row, preserving the order of
/// `rows` and sorting children by their `order` column.
///
/// Children are fetched in id chunks, so the number of sessions or exercises
/// is not bounded by the statement parameter limit. Callers that need a
/// consistent view run this inside [`crate::Database::read`].
pub(crate) fn assemble(
    conn: &mut SqliteConnection,
    rows: Vec<models::WorkoutSession>,
) -> Result<Vec<WorkoutSession>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let session_ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut exercises: Vec<models::PerformedExercise> = Vec::new();
    for chunk in session_ids.chunks(ID_CHUNK) {
        exercises.extend(
            performed_exercises::table
                .filter(performed_exercises::session_id.eq_any(chunk))
                .select(models::PerformedExercise::as_select())
                .load::<models::PerformedExercise>(conn)?,
        );
    }

    let exercise_ids: Vec<i32> = exercises.iter().map(|e| e.id).collect();
    let mut sets_by_exercise: HashMap<i32, Vec<models::WorkoutSet>> = HashMap::new();
    for chunk in exercise_ids.chunks(ID_CHUNK) {
        let set_rows = sets::table
            .filter(sets::performed_exercise_id.eq_any(chunk))
            .select(models::WorkoutSet::as_select())
            .load::<models::WorkoutSet>(conn)?;
        for set in set_rows {
            sets_by_exercise
                .entry(set.performed_exercise_id)
                .or_default()
                .push(set);
        }
    }

    let mut exercises_by_session: HashMap<i32, Vec<PerformedExercise>> = HashMap::new();
    for exercise in exercises {
        let sets = sets_by_exercise.remove(&exercise.id).unwrap_or_default();
        exercises_by_session
            .entry(exercise.session_id)
            .or_default()
            .push(PerformedExercise::from_parts(exercise, sets));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let exercises = exercises_by_session.remove(&row.id).unwrap_or_default();
            WorkoutSession::from_parts(row, exercises)
        })
        .collect())
}

/// Deletes sessions children first: sets, then performed exercises, then the
/// session rows themselves. Returns the number of sessions removed.
pub(crate) fn delete_session_rows(conn: &mut SqliteConnection, session_ids: &[i32]) -> Result<usize> {
    let mut removed = 0;
    for chunk in session_ids.chunks(ID_CHUNK) {
        let exercise_ids = performed_exercises::table
            .filter(performed_exercises::session_id.eq_any(chunk))
            .select(performed_exercises::id);

        diesel::delete(sets::table.filter(sets::performed_exercise_id.eq_any(exercise_ids)))
            .execute(conn)?;
        diesel::delete(performed_exercises::table.filter(performed_exercises::session_id.eq_any(chunk)))
            .execute(conn)?;
        removed += diesel::delete(workout_sessions::table.filter(workout_sessions::id.eq_any(chunk)))
            .execute(conn)?;
    }
    Ok(removed)
}
