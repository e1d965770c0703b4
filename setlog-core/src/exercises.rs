//! The exercise catalog. Sessions reference catalog entries, they never own
//! them.

use chrono::Utc;
use diesel::prelude::*;
use log::info;

use crate::db::Database;
use crate::db::models::{Exercise, NewExercise, UpdateExercise};
use crate::db::schema::{exercises, performed_exercises};
use crate::error::{EntityKind, Result, StoreError};

pub(crate) fn require_exercise(conn: &mut SqliteConnection, id: i32) -> Result<Exercise> {
    exercises::table
        .find(id)
        .select(Exercise::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(EntityKind::Exercise, id))
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("exercise name must not be empty".into()));
    }
    Ok(())
}

/// Fields for a new catalog entry.
#[derive(Debug, Clone, Default)]
pub struct ExerciseInput {
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
}

impl ExerciseInput {
    pub fn named(name: impl Into<String>) -> Self {
        ExerciseInput {
            name: name.into(),
            ..Default::default()
        }
    }
}

fn insert_exercise(conn: &mut SqliteConnection, input: ExerciseInput) -> Result<Exercise> {
    let now = Utc::now().naive_utc();
    Ok(diesel::insert_into(exercises::table)
        .values(&NewExercise {
            name: input.name.trim().to_string(),
            description: input.description,
            muscle_group: input.muscle_group,
            equipment: input.equipment,
            created_at: now,
            updated_at: now,
        })
        .returning(Exercise::as_returning())
        .get_result(conn)?)
}

#[derive(Clone)]
pub struct ExerciseStore {
    db: Database,
}

impl ExerciseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_exercise(&self, input: ExerciseInput) -> Result<Exercise> {
        validate_name(&input.name)?;
        let exercise = self.db.run(move |conn| insert_exercise(conn, input)).await?;
        info!("Created exercise {}", exercise);
        Ok(exercise)
    }

    pub async fn get_exercise(&self, id: i32) -> Result<Exercise> {
        self.db.run(move |conn| require_exercise(conn, id)).await
    }

    /// Catalog entries sorted by name.
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>> {
        self.db
            .run(|conn| {
                Ok(exercises::table
                    .select(Exercise::as_select())
                    .order(exercises::name.asc())
                    .load(conn)?)
            })
            .await
    }

    pub async fn get_or_create_exercise(&self, name: &str) -> Result<Exercise> {
        validate_name(name)?;
        let name = name.trim().to_string();
        self.db
            .transaction(move |conn| {
                if let Some(exercise) = exercises::table
                    .filter(exercises::name.eq(&name))
                    .select(Exercise::as_select())
                    .first(conn)
                    .optional()?
                {
                    return Ok(exercise);
                }
                insert_exercise(conn, ExerciseInput::named(name))
            })
            .await
    }

    pub async fn update_exercise(&self, id: i32, mut update: UpdateExercise) -> Result<Exercise> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        self.db
            .transaction(move |conn| {
                let current = require_exercise(conn, id)?;
                if update.is_empty() {
                    return Ok(current);
                }
                update.updated_at = Some(Utc::now().naive_utc());
                Ok(diesel::update(exercises::table.find(id))
                    .set(&update)
                    .returning(Exercise::as_returning())
                    .get_result(conn)?)
            })
            .await
    }

    /// Delete a catalog entry. Entries still logged in a session are a
    /// conflict.
    pub async fn delete_exercise(&self, id: i32) -> Result<()> {
        self.db
            .transaction(move |conn| {
                require_exercise(conn, id)?;
                let uses: i64 = performed_exercises::table
                    .filter(performed_exercises::exercise_id.eq(id))
                    .count()
                    .get_result(conn)?;
                if uses > 0 {
                    return Err(StoreError::Conflict(format!(
                        "exercise {} is referenced by {} performed exercises",
                        id, uses
                    )));
                }
                diesel::delete(exercises::table.find(id)).execute(conn)?;
                Ok(())
            })
            .await?;
        info!("Deleted exercise {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionInput, SessionStore};
    use crate::testing::TestDatabase;

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let test_db = TestDatabase::new().await;
        let store = ExerciseStore::new(test_db.db.clone());
        for name in ["Squat", "Bench Press", "Overhead Press"] {
            store.create_exercise(ExerciseInput::named(name)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_exercises()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Bench Press", "Overhead Press", "Squat"]);
    }

    #[tokio::test]
    async fn get_or_create_reuses_existing() {
        let test_db = TestDatabase::new().await;
        let store = ExerciseStore::new(test_db.db.clone());

        let first = store.get_or_create_exercise("Row").await.unwrap();
        let second = store.get_or_create_exercise(" Row ").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_exercises().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let test_db = TestDatabase::new().await;
        let store = ExerciseStore::new(test_db.db.clone());
        let err = store
            .create_exercise(ExerciseInput::named("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn referenced_exercise_cannot_be_deleted() {
        let test_db = TestDatabase::seeded().await;
        let store = ExerciseStore::new(test_db.db.clone());
        let sessions = SessionStore::new(test_db.db.clone());
        sessions
            .create_session(SessionInput::new(test_db.user_id).with_exercise(test_db.squat_id, vec![]))
            .await
            .unwrap();

        let err = store.delete_exercise(test_db.squat_id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.delete_exercise(test_db.bench_id).await.unwrap();
        assert!(store.get_exercise(test_db.bench_id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_keeps_unspecified_fields() {
        let test_db = TestDatabase::new().await;
        let store = ExerciseStore::new(test_db.db.clone());
        let created = store
            .create_exercise(ExerciseInput {
                muscle_group: Some("legs".into()),
                ..ExerciseInput::named("Lunge")
            })
            .await
            .unwrap();

        let updated = store
            .update_exercise(
                created.id,
                UpdateExercise {
                    equipment: Some(Some("dumbbells".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.muscle_group.as_deref(), Some("legs"));
        assert_eq!(updated.equipment.as_deref(), Some("dumbbells"));
    }
}
