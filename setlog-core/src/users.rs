//! Users mirrored from the external identity provider.

use chrono::Utc;
use diesel::prelude::*;
use log::{debug, info};

use crate::db::Database;
use crate::db::models::{NewUser, UpdateUser, User};
use crate::db::schema::{progress_records, users, workout_plans, workout_sessions};
use crate::error::{EntityKind, Result, StoreError};
use crate::session::delete_session_rows;

pub(crate) fn require_user(conn: &mut SqliteConnection, id: i32) -> Result<User> {
    users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(EntityKind::User, id))
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(StoreError::Validation("username must not be empty".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: Option<String>,
        auth_subject: Option<String>,
    ) -> Result<User> {
        validate_username(username)?;
        let username = username.trim().to_string();

        let user = self
            .db
            .run(move |conn| {
                let now = Utc::now().naive_utc();
                Ok(diesel::insert_into(users::table)
                    .values(&NewUser {
                        username,
                        email,
                        auth_subject,
                        created_at: now,
                        updated_at: now,
                    })
                    .returning(User::as_returning())
                    .get_result(conn)?)
            })
            .await?;
        info!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn get_user(&self, id: i32) -> Result<User> {
        self.db.run(move |conn| require_user(conn, id)).await
    }

    /// Resolve the local user for an identity provider subject.
    pub async fn find_by_auth_subject(&self, subject: &str) -> Result<Option<User>> {
        let subject = subject.to_string();
        self.db
            .run(move |conn| {
                Ok(users::table
                    .filter(users::auth_subject.eq(subject))
                    .select(User::as_select())
                    .first(conn)
                    .optional()?)
            })
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.db
            .run(|conn| {
                Ok(users::table
                    .select(User::as_select())
                    .order(users::id.asc())
                    .load(conn)?)
            })
            .await
    }

    pub async fn update_user(&self, id: i32, mut update: UpdateUser) -> Result<User> {
        if let Some(username) = &update.username {
            validate_username(username)?;
        }
        self.db
            .transaction(move |conn| {
                let current = require_user(conn, id)?;
                if update.is_empty() {
                    return Ok(current);
                }
                update.updated_at = Some(Utc::now().naive_utc());
                Ok(diesel::update(users::table.find(id))
                    .set(&update)
                    .returning(User::as_returning())
                    .get_result(conn)?)
            })
            .await
    }

    /// Delete a user and everything they own. Sessions go through the same
    /// child-first deletion as [`crate::session::SessionStore::delete_session`].
    pub async fn delete_user(&self, id: i32) -> Result<()> {
        let sessions_removed = self
            .db
            .transaction(move |conn| {
                require_user(conn, id)?;
                let session_ids: Vec<i32> = workout_sessions::table
                    .filter(workout_sessions::user_id.eq(id))
                    .select(workout_sessions::id)
                    .load(conn)?;
                let removed = delete_session_rows(conn, &session_ids)?;
                diesel::delete(progress_records::table.filter(progress_records::user_id.eq(id)))
                    .execute(conn)?;
                diesel::delete(workout_plans::table.filter(workout_plans::user_id.eq(id)))
                    .execute(conn)?;
                diesel::delete(users::table.find(id)).execute(conn)?;
                Ok(removed)
            })
            .await?;
        info!("Deleted user {}", id);
        debug!("Removed {} sessions owned by user {}", sessions_removed, id);
        Ok(())
    }
}
