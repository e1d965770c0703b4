//! Maintenance of the `order` column for performed exercises and sets.
//!
//! Positions are zero-based and contiguous among siblings. A new child is
//! appended at `count`, and after a delete the survivors are rewritten to
//! their rank. All helpers expect to run inside the caller's transaction.

use diesel::prelude::*;

use crate::db::schema::{performed_exercises, sets};
use crate::error::{Result, StoreError};

pub(crate) fn position_from_index(index: usize) -> Result<i32> {
    i32::try_from(index)
        .map_err(|_| StoreError::Validation(format!("position {} is out of range", index)))
}

/// Given `(id, position)` pairs, returns the `(id, new_position)` rewrites
/// that make positions contiguous from zero while keeping relative order.
pub(crate) fn compact(rows: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|&(id, position)| (position, id));
    sorted
        .into_iter()
        .enumerate()
        .filter_map(|(rank, (id, position))| {
            let rank = rank as i32;
            (rank != position).then_some((id, rank))
        })
        .collect()
}

pub(crate) fn next_exercise_position(conn: &mut SqliteConnection, session_id: i32) -> Result<i32> {
    let count: i64 = performed_exercises::table
        .filter(performed_exercises::session_id.eq(session_id))
        .count()
        .get_result(conn)?;
    position_from_index(count as usize)
}

pub(crate) fn next_set_position(conn: &mut SqliteConnection, performed_exercise_id: i32) -> Result<i32> {
    let count: i64 = sets::table
        .filter(sets::performed_exercise_id.eq(performed_exercise_id))
        .count()
        .get_result(conn)?;
    position_from_index(count as usize)
}

/// Rewrites the sets of one performed exercise to positions `0..n`.
/// Returns how many rows moved.
pub(crate) fn renumber_sets(conn: &mut SqliteConnection, performed_exercise_id: i32) -> Result<usize> {
    let rows: Vec<(i32, i32)> = sets::table
        .filter(sets::performed_exercise_id.eq(performed_exercise_id))
        .select((sets::id, sets::position))
        .load(conn)?;

    // Ascending rewrites only ever move a row into a slot that is already
    // free, so the unique (parent, order) index holds after every statement.
    let moves = compact(&rows);
    for &(id, position) in &moves {
        diesel::update(sets::table.find(id))
            .set(sets::position.eq(position))
            .execute(conn)?;
    }
    Ok(moves.len())
}

/// Rewrites the performed exercises of one session to positions `0..n`.
pub(crate) fn renumber_exercises(conn: &mut SqliteConnection, session_id: i32) -> Result<usize> {
    let rows: Vec<(i32, i32)> = performed_exercises::table
        .filter(performed_exercises::session_id.eq(session_id))
        .select((performed_exercises::id, performed_exercises::position))
        .load(conn)?;

    let moves = compact(&rows);
    for &(id, position) in &moves {
        diesel::update(performed_exercises::table.find(id))
            .set(performed_exercises::position.eq(position))
            .execute(conn)?;
    }
    Ok(moves.len())
}
