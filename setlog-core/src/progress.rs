use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::db::models::{NewProgressRecord, ProgressRecord, UpdateProgressRecord};
use crate::db::schema::progress_records;
use crate::error::{EntityKind, Result, StoreError};
use crate::users::require_user;

fn require_record(conn: &mut SqliteConnection, id: i32) -> Result<ProgressRecord> {
    progress_records::table
        .find(id)
        .select(ProgressRecord::as_select())
        .first(conn)
        .optional()?
        .ok_or(StoreError::not_found(EntityKind::ProgressRecord, id))
}

fn validate_measurements(body_weight: Option<f64>, body_fat: Option<f64>) -> Result<()> {
    if let Some(weight) = body_weight {
        if !weight.is_finite() || weight < 0.0 {
            return Err(StoreError::Validation(format!(
                "body weight must be a non-negative number, got {}",
                weight
            )));
        }
    }
    if let Some(fat) = body_fat {
        if !fat.is_finite() || !(0.0..=100.0).contains(&fat) {
            return Err(StoreError::Validation(format!(
                "body fat must be between 0 and 100, got {}",
                fat
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressInput {
    pub user_id: i32,
    /// Defaults to the current time.
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub body_weight: Option<f64>,
    #[serde(default)]
    pub body_fat: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct ProgressRecordStore {
    db: Database,
}

impl ProgressRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_record(&self, input: ProgressInput) -> Result<ProgressRecord> {
        validate_measurements(input.body_weight, input.body_fat)?;

        let record = self
            .db
            .transaction(move |conn| {
                require_user(conn, input.user_id)?;
                let now = Utc::now().naive_utc();
                Ok(diesel::insert_into(progress_records::table)
                    .values(&NewProgressRecord {
                        user_id: input.user_id,
                        date: input.date.unwrap_or(now),
                        body_weight: input.body_weight,
                        body_fat: input.body_fat,
                        notes: input.notes,
                        created_at: now,
                    })
                    .returning(ProgressRecord::as_returning())
                    .get_result(conn)?)
            })
            .await?;
        info!("Recorded progress {} for user {}", record.id, record.user_id);
        Ok(record)
    }

    pub async fn get_record(&self, id: i32) -> Result<ProgressRecord> {
        self.db.run(move |conn| require_record(conn, id)).await
    }

    /// A user's records, oldest first.
    pub async fn list_records_for_user(&self, user_id: i32) -> Result<Vec<ProgressRecord>> {
        let records = self
            .db
            .read(move |conn| {
                let user = require_user(conn, user_id)?;
                Ok(ProgressRecord::belonging_to(&user)
                    .select(ProgressRecord::as_select())
                    .order((progress_records::date.asc(), progress_records::id.asc()))
                    .load(conn)?)
            })
            .await?;
        debug!("Loaded {} progress records for user {}", records.len(), user_id);
        Ok(records)
    }

    pub async fn update_record(
        &self,
        id: i32,
        update: UpdateProgressRecord,
    ) -> Result<ProgressRecord> {
        validate_measurements(update.body_weight.flatten(), update.body_fat.flatten())?;
        self.db
            .transaction(move |conn| {
                let current = require_record(conn, id)?;
                if update.is_empty() {
                    return Ok(current);
                }
                Ok(diesel::update(progress_records::table.find(id))
                    .set(&update)
                    .returning(ProgressRecord::as_returning())
                    .get_result(conn)?)
            })
            .await
    }

    pub async fn delete_record(&self, id: i32) -> Result<()> {
        self.db
            .transaction(move |conn| {
                require_record(conn, id)?;
                diesel::delete(progress_records::table.find(id)).execute(conn)?;
                Ok(())
            })
            .await?;
        info!("Deleted progress record {}", id);
        Ok(())
    }
}
