//! Plain data shapes exchanged with the routing layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::models;
use crate::error::{Result, StoreError};

/// A workout session together with its performed exercises and their sets,
/// both sorted by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: i32,
    pub user_id: i32,
    pub workout_plan_id: Option<i32>,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub exercises: Vec<PerformedExercise>,
}

impl WorkoutSession {
    pub fn status(&self) -> SessionStatus {
        if self.completed {
            SessionStatus::Completed
        } else {
            SessionStatus::Open
        }
    }

    pub fn exercise(&self, performed_exercise_id: i32) -> Option<&PerformedExercise> {
        self.exercises
            .iter()
            .find(|e| e.id == performed_exercise_id)
    }

    pub(crate) fn from_parts(row: models::WorkoutSession, exercises: Vec<PerformedExercise>) -> Self {
        let mut session = WorkoutSession {
            id: row.id,
            user_id: row.user_id,
            workout_plan_id: row.workout_plan_id,
            date: row.date,
            notes: row.notes,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
            exercises,
        };
        // Physical row order is never trusted.
        session.exercises.sort_by_key(|e| (e.order, e.id));
        session
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformedExercise {
    pub id: i32,
    pub session_id: i32,
    /// Catalog exercise this entry logs.
    pub exercise_id: i32,
    pub order: i32,
    pub sets: Vec<WorkoutSet>,
}

impl PerformedExercise {
    pub(crate) fn from_parts(row: models::PerformedExercise, sets: Vec<models::WorkoutSet>) -> Self {
        let mut sets: Vec<WorkoutSet> = sets.into_iter().map(WorkoutSet::from).collect();
        sets.sort_by_key(|s| (s.order, s.id));
        PerformedExercise {
            id: row.id,
            session_id: row.session_id,
            exercise_id: row.exercise_id,
            order: row.position,
            sets,
        }
    }

    pub fn set(&self, set_id: i32) -> Option<&WorkoutSet> {
        self.sets.iter().find(|s| s.id == set_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: i32,
    pub performed_exercise_id: i32,
    pub reps: i32,
    pub weight: f64,
    pub order: i32,
    /// Rest after the set, in seconds.
    pub rest_time: Option<i32>,
}

impl From<models::WorkoutSet> for WorkoutSet {
    fn from(s: models::WorkoutSet) -> Self {
        WorkoutSet {
            id: s.id,
            performed_exercise_id: s.performed_exercise_id,
            reps: s.reps,
            weight: s.weight,
            order: s.position,
            rest_time: s.rest_time,
        }
    }
}

/// Input for [`crate::session::SessionStore::create_session`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInput {
    pub user_id: i32,
    #[serde(default)]
    pub workout_plan_id: Option<i32>,
    /// Defaults to the current time.
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub performed_exercises: Vec<PerformedExerciseInput>,
}

impl SessionInput {
    pub fn new(user_id: i32) -> Self {
        SessionInput {
            user_id,
            ..Default::default()
        }
    }

    pub fn with_exercise(mut self, exercise_id: i32, sets: Vec<SetInput>) -> Self {
        self.performed_exercises
            .push(PerformedExerciseInput { exercise_id, sets });
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for exercise in &self.performed_exercises {
            validate_sets(&exercise.sets)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformedExerciseInput {
    pub exercise_id: i32,
    #[serde(default)]
    pub sets: Vec<SetInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetInput {
    pub reps: i32,
    pub weight: f64,
    #[serde(default)]
    pub rest_time: Option<i32>,
}

impl SetInput {
    pub fn new(reps: i32, weight: f64) -> Self {
        SetInput {
            reps,
            weight,
            rest_time: None,
        }
    }

    pub fn with_rest(mut self, seconds: i32) -> Self {
        self.rest_time = Some(seconds);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_reps(self.reps)?;
        validate_weight(self.weight)?;
        validate_rest_time(self.rest_time)
    }
}

pub(crate) fn validate_sets(sets: &[SetInput]) -> Result<()> {
    sets.iter().try_for_each(SetInput::validate)
}

/// Partial update of the session's own fields. Exercises and sets are never
/// touched by it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub workout_plan_id: Option<Option<i32>>,
}

impl SessionPatch {
    pub fn complete() -> Self {
        SessionPatch {
            completed: Some(true),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_none()
            && self.completed.is_none()
            && self.date.is_none()
            && self.workout_plan_id.is_none()
    }

    pub(crate) fn into_changeset(self, now: NaiveDateTime) -> models::UpdateWorkoutSession {
        models::UpdateWorkoutSession {
            workout_plan_id: self.workout_plan_id,
            date: self.date,
            notes: self.notes,
            completed: self.completed,
            updated_at: Some(now),
        }
    }
}

/// Partial update of one set; its `order` is never changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SetPatch {
    #[serde(default)]
    pub reps: Option<i32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub rest_time: Option<Option<i32>>,
}

impl SetPatch {
    pub fn is_empty(&self) -> bool {
        self.reps.is_none() && self.weight.is_none() && self.rest_time.is_none()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(reps) = self.reps {
            validate_reps(reps)?;
        }
        if let Some(weight) = self.weight {
            validate_weight(weight)?;
        }
        if let Some(rest_time) = self.rest_time {
            validate_rest_time(rest_time)?;
        }
        Ok(())
    }

    pub(crate) fn into_changeset(self) -> models::UpdateWorkoutSet {
        models::UpdateWorkoutSet {
            reps: self.reps,
            weight: self.weight,
            rest_time: self.rest_time,
        }
    }
}

fn validate_reps(reps: i32) -> Result<()> {
    if reps < 1 {
        return Err(StoreError::Validation(format!(
            "reps must be at least 1, got {}",
            reps
        )));
    }
    Ok(())
}

fn validate_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(StoreError::Validation(format!(
            "weight must be a non-negative number, got {}",
            weight
        )));
    }
    Ok(())
}

fn validate_rest_time(rest_time: Option<i32>) -> Result<()> {
    match rest_time {
        Some(seconds) if seconds < 0 => Err(StoreError::Validation(format!(
            "rest time must not be negative, got {}",
            seconds
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_reps_and_negative_weight() {
        assert!(SetInput::new(0, 50.0).validate().is_err());
        assert!(SetInput::new(5, -1.0).validate().is_err());
        assert!(SetInput::new(5, f64::NAN).validate().is_err());
        assert!(SetInput::new(1, 0.0).validate().is_ok());
    }

    #[test]
    fn rejects_negative_rest() {
        assert!(SetInput::new(5, 20.0).with_rest(-30).validate().is_err());
        assert!(SetInput::new(5, 20.0).with_rest(90).validate().is_ok());
    }

    #[test]
    fn session_input_checks_every_set() {
        let input = SessionInput::new(1)
            .with_exercise(1, vec![SetInput::new(10, 100.0)])
            .with_exercise(2, vec![SetInput::new(8, 60.0), SetInput::new(0, 60.0)]);
        assert!(matches!(input.validate(), Err(StoreError::Validation(_))));
    }

    #[test]
    fn empty_patches_are_detected() {
        assert!(SessionPatch::default().is_empty());
        assert!(!SessionPatch::complete().is_empty());
        assert!(SetPatch::default().is_empty());
        let clear_rest = SetPatch {
            rest_time: Some(None),
            ..Default::default()
        };
        assert!(!clear_rest.is_empty());
    }

    #[test]
    fn set_patch_validates_only_given_fields() {
        let patch = SetPatch {
            weight: Some(-5.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        let patch = SetPatch {
            reps: Some(3),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn json_null_clears_nullable_fields() {
        let patch: SessionPatch =
            serde_json::from_str(r#"{"notes": null, "workout_plan_id": null}"#).unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.workout_plan_id, Some(None));
        assert!(!patch.is_empty());

        let patch: SessionPatch = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(patch.notes, None);
        assert_eq!(patch.workout_plan_id, None);

        let patch: SetPatch = serde_json::from_str(r#"{"rest_time": null}"#).unwrap();
        assert_eq!(patch.rest_time, Some(None));
        let patch: SetPatch = serde_json::from_str(r#"{"reps": 4}"#).unwrap();
        assert_eq!(patch.rest_time, None);
    }

    #[test]
    fn reconstruction_sorts_by_order() {
        let row = models::PerformedExercise {
            id: 4,
            session_id: 1,
            exercise_id: 9,
            position: 0,
        };
        let sets = vec![
            models::WorkoutSet {
                id: 12,
                performed_exercise_id: 4,
                reps: 6,
                weight: 80.0,
                position: 2,
                rest_time: None,
            },
            models::WorkoutSet {
                id: 10,
                performed_exercise_id: 4,
                reps: 10,
                weight: 60.0,
                position: 0,
                rest_time: None,
            },
            models::WorkoutSet {
                id: 11,
                performed_exercise_id: 4,
                reps: 8,
                weight: 70.0,
                position: 1,
                rest_time: Some(90),
            },
        ];
        let exercise = PerformedExercise::from_parts(row, sets);
        let orders: Vec<i32> = exercise.sets.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(exercise.sets[0].id, 10);
        assert_eq!(exercise.set(11).and_then(|s| s.rest_time), Some(90));
    }
}
