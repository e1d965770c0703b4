use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::fmt;
use thiserror::Error as ThisError;

/// The kind of record a [`StoreError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Exercise,
    WorkoutPlan,
    ProgressRecord,
    WorkoutSession,
    PerformedExercise,
    Set,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Exercise => "exercise",
            EntityKind::WorkoutPlan => "workout plan",
            EntityKind::ProgressRecord => "progress record",
            EntityKind::WorkoutSession => "workout session",
            EntityKind::PerformedExercise => "performed exercise",
            EntityKind::Set => "set",
        };
        f.write_str(name)
    }
}

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i32 },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("transaction failed: {0}")]
    Transaction(DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("blocking database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(kind: EntityKind, id: i32) -> Self {
        StoreError::NotFound { kind, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether repeating the same call may succeed without changing its input.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Conflict(_) => true,
            StoreError::Transaction(DieselError::DatabaseError(kind, info)) => {
                if matches!(kind, DatabaseErrorKind::SerializationFailure) {
                    return true;
                }
                let message = info.message().to_lowercase();
                message.contains("locked") || message.contains("busy")
            }
            _ => false,
        }
    }
}

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                StoreError::Validation(info.message().to_string())
            }
            other => StoreError::Transaction(other),
        }
    }
}
