//! Session module for persisting workout sessions and their sets.
//!
//! [`SessionStore`] owns the session aggregate: a session, its performed
//! exercises and each exercise's sets. Multi-table writes run in one
//! immediate transaction and the aggregate is always rebuilt from the
//! explicit `order` columns on read.

mod aggregate;
mod exercises;
pub mod objects;
mod ordering;
mod session;
mod sets;
mod workout;

pub use objects::{
    PerformedExercise, PerformedExerciseInput, SessionInput, SessionPatch, SessionStatus,
    SetInput, SetPatch, WorkoutSession, WorkoutSet,
};
pub use session::SessionStore;

pub(crate) use aggregate::delete_session_rows;
