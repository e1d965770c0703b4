use diesel::prelude::*;
use tempfile::TempDir;

use crate::config::DatabaseConfig;
use crate::db::Database;
use crate::db::schema::{performed_exercises, sets};
use crate::exercises::{ExerciseInput, ExerciseStore};
use crate::users::UserStore;

/// A migrated database file inside a temporary directory, removed on drop.
pub struct TestDatabase {
    pub db: Database,
    pub user_id: i32,
    pub squat_id: i32,
    pub bench_id: i32,
    pub deadlift_id: i32,
    _dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setlog-test.db");
        let config = DatabaseConfig::new(path.to_string_lossy().to_string());
        let db = Database::open(&config).await.unwrap();
        Self {
            db,
            user_id: 0,
            squat_id: 0,
            bench_id: 0,
            deadlift_id: 0,
            _dir: dir,
        }
    }

    /// One user and three catalog exercises.
    pub async fn seeded() -> Self {
        let mut test_db = Self::new().await;
        let users = UserStore::new(test_db.db.clone());
        let exercises = ExerciseStore::new(test_db.db.clone());

        test_db.user_id = users.create_user("tester", None, None).await.unwrap().id;
        test_db.squat_id = exercises
            .create_exercise(ExerciseInput::named("Squat"))
            .await
            .unwrap()
            .id;
        test_db.bench_id = exercises
            .create_exercise(ExerciseInput::named("Bench Press"))
            .await
            .unwrap()
            .id;
        test_db.deadlift_id = exercises
            .create_exercise(ExerciseInput::named("Deadlift"))
            .await
            .unwrap()
            .id;
        test_db
    }

    /// Row counts of `(performed_exercises, sets)` across all sessions.
    pub async fn child_row_counts(&self) -> (i64, i64) {
        self.db
            .run(|conn| {
                let exercises: i64 = performed_exercises::table.count().get_result(conn)?;
                let sets: i64 = sets::table.count().get_result(conn)?;
                Ok((exercises, sets))
            })
            .await
            .unwrap()
    }
}
