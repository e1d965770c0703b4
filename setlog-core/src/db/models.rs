use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::schema::{
    exercises, performed_exercises, progress_records, sets, users, workout_plans,
    workout_sessions,
};

// User models
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    /// Subject claim issued by the external identity provider.
    pub auth_subject: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub auth_subject: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Serialize, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub username: Option<String>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub email: Option<Option<String>>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

// Exercise models
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = exercises)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Exercise {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)?;
        if let Some(group) = &self.muscle_group {
            write!(f, " ({})", group)?;
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[diesel(table_name = exercises)]
pub struct NewExercise {
    pub name: String,
    pub description: Option<String>,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Serialize, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = exercises)]
pub struct UpdateExercise {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub muscle_group: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub equipment: Option<Option<String>>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

impl UpdateExercise {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.muscle_group.is_none()
            && self.equipment.is_none()
    }
}

// Workout plan models
#[derive(
    Queryable, Selectable, Identifiable, Associations, Serialize, Deserialize, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(User))]
#[diesel(table_name = workout_plans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutPlan {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = workout_plans)]
pub struct NewWorkoutPlan {
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Serialize, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = workout_plans)]
pub struct UpdateWorkoutPlan {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub description: Option<Option<String>>,
    #[serde(skip)]
    pub updated_at: Option<NaiveDateTime>,
}

impl UpdateWorkoutPlan {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

// Progress record models
#[derive(
    Queryable, Selectable, Identifiable, Associations, Serialize, Deserialize, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(User))]
#[diesel(table_name = progress_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProgressRecord {
    pub id: i32,
    pub user_id: i32,
    pub date: NaiveDateTime,
    pub body_weight: Option<f64>,
    /// Percentage, 0 to 100.
    pub body_fat: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = progress_records)]
pub struct NewProgressRecord {
    pub user_id: i32,
    pub date: NaiveDateTime,
    pub body_weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Serialize, Deserialize, Default, Debug, Clone)]
#[diesel(table_name = progress_records)]
pub struct UpdateProgressRecord {
    pub date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub body_weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub body_fat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "crate::nullable::deserialize")]
    pub notes: Option<Option<String>>,
}

impl UpdateProgressRecord {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.body_weight.is_none()
            && self.body_fat.is_none()
            && self.notes.is_none()
    }
}

// Workout session rows. The nested aggregate returned to callers lives in
// `crate::session::objects`.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = workout_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutSession {
    pub id: i32,
    pub user_id: i32,
    pub workout_plan_id: Option<i32>,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = workout_sessions)]
pub struct NewWorkoutSession {
    pub user_id: i32,
    pub workout_plan_id: Option<i32>,
    pub date: NaiveDateTime,
    pub notes: Option<String>,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = workout_sessions)]
pub struct UpdateWorkoutSession {
    pub workout_plan_id: Option<Option<i32>>,
    pub date: Option<NaiveDateTime>,
    pub notes: Option<Option<String>>,
    pub completed: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(WorkoutSession, foreign_key = session_id))]
#[diesel(table_name = performed_exercises)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PerformedExercise {
    pub id: i32,
    pub session_id: i32,
    pub exercise_id: i32,
    pub position: i32,
}

#[derive(Insertable)]
#[diesel(table_name = performed_exercises)]
pub struct NewPerformedExercise {
    pub session_id: i32,
    pub exercise_id: i32,
    pub position: i32,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(PerformedExercise))]
#[diesel(table_name = sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutSet {
    pub id: i32,
    pub performed_exercise_id: i32,
    pub reps: i32,
    pub weight: f64,
    pub position: i32,
    pub rest_time: Option<i32>,
}

impl fmt::Display for WorkoutSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest_str = self
            .rest_time
            .map(|r| format!(", rest {}s", r))
            .unwrap_or_default();

        write!(
            f,
            "Set {}: {:.1}kg x {} reps{}",
            self.position + 1,
            self.weight,
            self.reps,
            rest_str
        )
    }
}

#[derive(Insertable)]
#[diesel(table_name = sets)]
pub struct NewWorkoutSet {
    pub performed_exercise_id: i32,
    pub reps: i32,
    pub weight: f64,
    pub position: i32,
    pub rest_time: Option<i32>,
}

#[derive(AsChangeset, Debug)]
#[diesel(table_name = sets)]
pub struct UpdateWorkoutSet {
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub rest_time: Option<Option<i32>>,
}
