pub mod models;
pub mod schema;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use log::{debug, info};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{Result, StoreError};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug)]
struct ConnectionOptions {
    busy_timeout: Duration,
    write_ahead_log: bool,
}

impl ConnectionOptions {
    fn apply(&self, conn: &mut SqliteConnection) -> QueryResult<()> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {};",
            self.busy_timeout.as_millis()
        ))?;
        if self.write_ahead_log {
            conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        }
        conn.batch_execute("PRAGMA foreign_keys = ON;")
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        self.apply(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Explicitly constructed handle to the relational store.
///
/// Cloning is cheap; clones share the same connection pool. Blocking diesel
/// work is moved onto tokio's blocking thread pool.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(config.database_url.as_str());
        let options = ConnectionOptions {
            busy_timeout: config.busy_timeout,
            write_ahead_log: !config.is_in_memory(),
        };
        let pool = Pool::builder()
            .max_size(config.max_connections)
            .connection_customizer(Box::new(options))
            .build(manager)?;

        debug!(
            "Database pool created for {} with {} connections",
            config.database_url, config.max_connections
        );
        Ok(Self { pool })
    }

    /// Connects and applies any pending migrations.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::connect(config)?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Runs `f` on a pooled connection outside of any transaction.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut *conn)
        })
        .await?
    }

    /// Runs `f` inside a deferred transaction so every query it issues reads
    /// from the same snapshot. Use for reads that span several tables.
    pub async fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(move |conn| conn.transaction(f)).await
    }

    /// Runs `f` inside `BEGIN IMMEDIATE`; any `Err` rolls the whole call back.
    ///
    /// Taking the write lock up front serialises concurrent writers, so
    /// count-then-insert position assignment cannot interleave.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run(move |conn| conn.immediate_transaction(f)).await
    }

    pub async fn run_migrations(&self) -> Result<()> {
        self.run(|conn| {
            let applied = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(|e| StoreError::Migration(e.to_string()))?;

            if applied.is_empty() {
                debug!("No pending migrations");
            }
            for version in applied {
                info!("Applied migration: {}", version);
            }
            Ok(())
        })
        .await
    }

    /// Deletes every row, children before parents.
    pub async fn clear_all_tables(&self) -> Result<()> {
        use schema::*;

        self.transaction(|conn| {
            diesel::delete(sets::table).execute(conn)?;
            diesel::delete(performed_exercises::table).execute(conn)?;
            diesel::delete(workout_sessions::table).execute(conn)?;
            diesel::delete(progress_records::table).execute(conn)?;
            diesel::delete(workout_plans::table).execute(conn)?;
            diesel::delete(exercises::table).execute(conn)?;
            diesel::delete(users::table).execute(conn)?;
            Ok(())
        })
        .await?;
        info!("Cleared all tables");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDatabase;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let test_db = TestDatabase::new().await;
        test_db.db.run_migrations().await.unwrap();
        test_db.db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        use schema::workout_plans;

        let test_db = TestDatabase::new().await;
        let err = test_db
            .db
            .run(|conn| {
                let now = chrono::Utc::now().naive_utc();
                diesel::insert_into(workout_plans::table)
                    .values((
                        workout_plans::user_id.eq(404),
                        workout_plans::name.eq("orphan"),
                        workout_plans::created_at.eq(now),
                        workout_plans::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn failed_transaction_rolls_back() {
        use schema::users;

        let test_db = TestDatabase::new().await;
        let result: Result<()> = test_db
            .db
            .transaction(|conn| {
                let now = chrono::Utc::now().naive_utc();
                diesel::insert_into(users::table)
                    .values((
                        users::username.eq("ghost"),
                        users::created_at.eq(now),
                        users::updated_at.eq(now),
                    ))
                    .execute(conn)?;
                Err(StoreError::Validation("abort".into()))
            })
            .await;
        assert!(result.is_err());

        let count: i64 = test_db
            .db
            .run(|conn| Ok(users::table.count().get_result(conn)?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn clear_all_tables_removes_rows() {
        use schema::exercises;

        let test_db = TestDatabase::seeded().await;
        test_db.db.clear_all_tables().await.unwrap();
        let count: i64 = test_db
            .db
            .run(|conn| Ok(exercises::table.count().get_result(conn)?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
