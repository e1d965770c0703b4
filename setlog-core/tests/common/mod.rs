use setlog::{Database, DatabaseConfig, ExerciseInput, ExerciseStore, UserStore};
use tempfile::TempDir;

pub struct Fixture {
    pub db: Database,
    pub user_id: i32,
    pub exercise_a: i32,
    pub exercise_b: i32,
    _dir: TempDir,
}

pub async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aggregate.db");
    let config = DatabaseConfig::new(path.to_string_lossy().to_string()).with_max_connections(4);
    let db = Database::open(&config).await.unwrap();

    let user_id = UserStore::new(db.clone())
        .create_user("athlete", None, Some("idp|athlete".into()))
        .await
        .unwrap()
        .id;
    let exercises = ExerciseStore::new(db.clone());
    let exercise_a = exercises
        .create_exercise(ExerciseInput::named("Front Squat"))
        .await
        .unwrap()
        .id;
    let exercise_b = exercises
        .create_exercise(ExerciseInput::named("Romanian Deadlift"))
        .await
        .unwrap()
        .id;

    Fixture {
        db,
        user_id,
        exercise_a,
        exercise_b,
        _dir: dir,
    }
}
