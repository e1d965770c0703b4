use log::warn;

use crate::db::Database;
use crate::error::{Result, StoreError};

/// Store for the workout session aggregate.
///
/// Each call checks out one connection, runs to completion and releases it;
/// no state is kept between calls.
#[derive(Clone)]
pub struct SessionStore {
    pub(crate) db: Database,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Logs write conflicts before handing the result back; callers decide
/// whether to retry.
pub(crate) fn warn_on_conflict<T>(operation: &str, result: Result<T>) -> Result<T> {
    if let Err(StoreError::Conflict(message)) = &result {
        warn!("{} hit a write conflict: {}", operation, message);
    }
    result
}
