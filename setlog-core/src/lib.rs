pub mod config;
pub mod db;
pub mod error;
pub mod exercises;
pub mod logging;
mod nullable;
pub mod plans;
pub mod progress;
pub mod session;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use config::DatabaseConfig;
pub use db::Database;
pub use error::{EntityKind, Result, StoreError};
pub use exercises::{ExerciseInput, ExerciseStore};
pub use plans::WorkoutPlanStore;
pub use progress::{ProgressInput, ProgressRecordStore};
pub use session::SessionStore;
pub use users::UserStore;
