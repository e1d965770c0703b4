//! Adding and removing performed exercises within a session.

use chrono::Utc;
use diesel::prelude::*;
use log::info;

use crate::db::models;
use crate::db::schema::{performed_exercises, sets};
use crate::error::Result;
use crate::exercises;
use crate::session::aggregate::{
    load_session, require_performed_exercise, require_session, touch_session,
};
use crate::session::objects::{SetInput, WorkoutSession, validate_sets};
use crate::session::ordering::{next_exercise_position, position_from_index, renumber_exercises};
use crate::session::session::{SessionStore, warn_on_conflict};

impl SessionStore {
    /// Append a performed exercise with its sets to a session.
    ///
    /// The new exercise's `order` is the number of exercises the session had
    /// before the call; its sets are ordered as given.
    pub async fn add_exercise(
        &self,
        session_id: i32,
        exercise_id: i32,
        set_inputs: Vec<SetInput>,
    ) -> Result<WorkoutSession> {
        validate_sets(&set_inputs)?;

        let result = self
            .db
            .transaction(move |conn| {
                require_session(conn, session_id)?;
                exercises::require_exercise(conn, exercise_id)?;

                let position = next_exercise_position(conn, session_id)?;
                let performed_exercise_id: i32 = diesel::insert_into(performed_exercises::table)
                    .values(&models::NewPerformedExercise {
                        session_id,
                        exercise_id,
                        position,
                    })
                    .returning(performed_exercises::id)
                    .get_result(conn)?;

                let new_sets = set_inputs
                    .iter()
                    .enumerate()
                    .map(|(index, set)| {
                        Ok(models::NewWorkoutSet {
                            performed_exercise_id,
                            reps: set.reps,
                            weight: set.weight,
                            position: position_from_index(index)?,
                            rest_time: set.rest_time,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                if !new_sets.is_empty() {
                    diesel::insert_into(sets::table)
                        .values(&new_sets)
                        .execute(conn)?;
                }

                touch_session(conn, session_id, Utc::now().naive_utc())?;
                Ok((position, load_session(conn, session_id)?))
            })
            .await;

        let (position, session) = warn_on_conflict("add_exercise", result)?;
        info!(
            "Added exercise {} to workout session {} at position {}",
            exercise_id, session_id, position
        );
        Ok(session)
    }

    /// Remove a performed exercise and its sets from a session.
    ///
    /// Remaining exercises are renumbered so `order` stays contiguous from 0.
    pub async fn remove_exercise(
        &self,
        session_id: i32,
        performed_exercise_id: i32,
    ) -> Result<WorkoutSession> {
        let (moved, session) = self
            .db
            .transaction(move |conn| {
                let performed = require_performed_exercise(conn, session_id, performed_exercise_id)?;

                diesel::delete(sets::table.filter(sets::performed_exercise_id.eq(performed.id)))
                    .execute(conn)?;
                diesel::delete(performed_exercises::table.find(performed.id)).execute(conn)?;
                let moved = renumber_exercises(conn, session_id)?;

                touch_session(conn, session_id, Utc::now().naive_utc())?;
                Ok((moved, load_session(conn, session_id)?))
            })
            .await?;

        info!(
            "Removed performed exercise {} from workout session {} ({} renumbered)",
            performed_exercise_id, session_id, moved
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{EntityKind, StoreError};
    use crate::session::objects::{SessionInput, SetInput};
    use crate::session::SessionStore;
    use crate::testing::TestDatabase;

    #[tokio::test]
    async fn add_exercise_appends_at_current_count() {
        let test_db = TestDatabase::seeded().await;
        let store = SessionStore::new(test_db.db.clone());
        let session = store
            .create_session(SessionInput::new(test_db.user_id))
            .await
            .unwrap();

        let first = store
            .add_exercise(session.id, test_db.squat_id, vec![SetInput::new(5, 100.0)])
            .await
            .unwrap();
        assert_eq!(first.exercises[0].order, 0);

        store
            .add_exercise(session.id, test_db.bench_id, vec![])
            .await
            .unwrap();
        let third = store
            .add_exercise(
                session.id,
                test_db.deadlift_id,
                vec![SetInput::new(3, 180.0), SetInput::new(3, 190.0)],
            )
            .await
            .unwrap();

        let orders: Vec<i32> = third.exercises.iter().map(|e| e.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        let last = &third.exercises[2];
        assert_eq!(last.exercise_id, test_db.deadlift_id);
        let set_orders: Vec<i32> = last.sets.iter().map(|s| s.order).collect();
        assert_eq!(set_orders, vec![0, 1]);
    }

    #[tokio::test]
    async fn add_unknown_exercise_writes_nothing() {
        let test_db = TestDatabase::seeded().await;
        let store = SessionStore::new(test_db.db.clone());
        let session = store
            .create_session(SessionInput::new(test_db.user_id))
            .await
            .unwrap();

        let err = store
            .add_exercise(session.id, 31337, vec![SetInput::new(5, 10.0)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::Exercise,
                id: 31337
            }
        ));
        assert!(store.get_session(session.id).await.unwrap().exercises.is_empty());
    }

    #[tokio::test]
    async fn add_to_missing_session_is_not_found() {
        let test_db = TestDatabase::seeded().await;
        let store = SessionStore::new(test_db.db.clone());

        let err = store
            .add_exercise(12, test_db.squat_id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::WorkoutSession,
                id: 12
            }
        ));
    }

    #[tokio::test]
    async fn remove_exercise_closes_the_gap() {
        let test_db = TestDatabase::seeded().await;
        let store = SessionStore::new(test_db.db.clone());
        let session = store
            .create_session(
                SessionInput::new(test_db.user_id)
                    .with_exercise(test_db.squat_id, vec![SetInput::new(5, 100.0)])
                    .with_exercise(test_db.bench_id, vec![SetInput::new(8, 70.0)])
                    .with_exercise(test_db.deadlift_id, vec![SetInput::new(3, 180.0)]),
            )
            .await
            .unwrap();

        let removed_id = session.exercises[0].id;
        let after = store.remove_exercise(session.id, removed_id).await.unwrap();

        let remaining: Vec<(i32, i32)> = after
            .exercises
            .iter()
            .map(|e| (e.exercise_id, e.order))
            .collect();
        assert_eq!(
            remaining,
            vec![(test_db.bench_id, 0), (test_db.deadlift_id, 1)]
        );

        // Appending after a removal must not collide with a surviving order.
        let appended = store
            .add_exercise(session.id, test_db.squat_id, vec![])
            .await
            .unwrap();
        assert_eq!(appended.exercises[2].order, 2);
        assert_eq!(test_db.child_row_counts().await.1, 2);
    }

    #[tokio::test]
    async fn remove_exercise_from_other_session_is_not_found() {
        let test_db = TestDatabase::seeded().await;
        let store = SessionStore::new(test_db.db.clone());
        let first = store
            .create_session(
                SessionInput::new(test_db.user_id)
                    .with_exercise(test_db.squat_id, vec![]),
            )
            .await
            .unwrap();
        let second = store
            .create_session(SessionInput::new(test_db.user_id))
            .await
            .unwrap();

        let err = store
            .remove_exercise(second.id, first.exercises[0].id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::PerformedExercise,
                ..
            }
        ));
        assert_eq!(store.get_session(first.id).await.unwrap().exercises.len(), 1);
    }
}
