use chrono::Utc;
use diesel::prelude::*;
use log::info;

use crate::db::Database;
use crate::db::models::{NewWorkoutPlan, UpdateWorkoutPlan, WorkoutPlan};
use crate::db::schema::workout_plans;
use crate::error::{EntityKind, Result, StoreError};
use crate::users::require_user;

pub(crate) fn require_plan(conn: &mut SqliteConnection, id: i32) -> Result<WorkoutPlan> {
    workout_plans::table
        .find(id)
        .select(WorkoutPlan::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(EntityKind::WorkoutPlan, id))
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("plan name must not be empty".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WorkoutPlanStore {
    db: Database,
}

impl WorkoutPlanStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_plan(
        &self,
        user_id: i32,
        name: &str,
        description: Option<String>,
    ) -> Result<WorkoutPlan> {
        validate_name(name)?;
        let name = name.trim().to_string();

        let plan = self
            .db
            .transaction(move |conn| {
                require_user(conn, user_id)?;
                let now = Utc::now().naive_utc();
                Ok(diesel::insert_into(workout_plans::table)
                    .values(&NewWorkoutPlan {
                        user_id,
                        name,
                        description,
                        created_at: now,
                        updated_at: now,
                    })
                    .returning(WorkoutPlan::as_returning())
                    .get_result(conn)?)
            })
            .await?;
        info!("Created workout plan {} for user {}", plan.id, user_id);
        Ok(plan)
    }

    pub async fn get_plan(&self, id: i32) -> Result<WorkoutPlan> {
        self.db.run(move |conn| require_plan(conn, id)).await
    }

    pub async fn list_plans_for_user(&self, user_id: i32) -> Result<Vec<WorkoutPlan>> {
        self.db
            .read(move |conn| {
                let user = require_user(conn, user_id)?;
                Ok(WorkoutPlan::belonging_to(&user)
                    .select(WorkoutPlan::as_select())
                    .order(workout_plans::name.asc())
                    .load(conn)?)
            })
            .await
    }

    pub async fn update_plan(&self, id: i32, mut update: UpdateWorkoutPlan) -> Result<WorkoutPlan> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        self.db
            .transaction(move |conn| {
                let current = require_plan(conn, id)?;
                if update.is_empty() {
                    return Ok(current);
                }
                update.updated_at = Some(Utc::now().naive_utc());
                Ok(diesel::update(workout_plans::table.find(id))
                    .set(&update)
                    .returning(WorkoutPlan::as_returning())
                    .get_result(conn)?)
            })
            .await
    }

    /// Delete a plan. Sessions that followed it keep existing with the plan
    /// reference cleared.
    pub async fn delete_plan(&self, id: i32) -> Result<()> {
        self.db
            .transaction(move |conn| {
                require_plan(conn, id)?;
                diesel::delete(workout_plans::table.find(id)).execute(conn)?;
                Ok(())
            })
            .await?;
        info!("Deleted workout plan {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionInput, SessionStore};
    use crate::testing::TestDatabase;

    #[tokio::test]
    async fn plans_are_listed_per_user() {
        let test_db = TestDatabase::seeded().await;
        let store = WorkoutPlanStore::new(test_db.db.clone());

        store
            .create_plan(test_db.user_id, "Push", None)
            .await
            .unwrap();
        store
            .create_plan(test_db.user_id, "Legs", Some("squat focus".into()))
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_plans_for_user(test_db.user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Legs", "Push"]);
    }

    #[tokio::test]
    async fn plan_for_unknown_user_is_not_found() {
        let test_db = TestDatabase::seeded().await;
        let store = WorkoutPlanStore::new(test_db.db.clone());
        let err = store.create_plan(999, "Pull", None).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::User,
                id: 999
            }
        ));
    }

    #[tokio::test]
    async fn deleting_plan_detaches_sessions() {
        let test_db = TestDatabase::seeded().await;
        let plans = WorkoutPlanStore::new(test_db.db.clone());
        let sessions = SessionStore::new(test_db.db.clone());

        let plan = plans
            .create_plan(test_db.user_id, "Full body", None)
            .await
            .unwrap();
        let session = sessions
            .create_session(SessionInput {
                workout_plan_id: Some(plan.id),
                ..SessionInput::new(test_db.user_id)
            })
            .await
            .unwrap();
        assert_eq!(session.workout_plan_id, Some(plan.id));

        plans.delete_plan(plan.id).await.unwrap();
        let session = sessions.get_session(session.id).await.unwrap();
        assert_eq!(session.workout_plan_id, None);
    }
}
