use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::scoring::{set_score, Lift};
use crate::shared::AppError;

/// One logged exercise set.
///
/// Used for competition sets (`parent_id` is a competition id) and solo sets
/// (`parent_id` is a session id). Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSet {
    pub id: String,
    pub owner_id: String,
    pub parent_id: String,
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
    pub score: f64,
    pub logged_at: DateTime<Utc>,
}

impl WorkoutSet {
    pub fn new(owner_id: &str, parent_id: &str, entry: SetEntry) -> Self {
        let score = set_score(entry.weight, f64::from(entry.reps));
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            parent_id: parent_id.to_string(),
            exercise: entry.exercise,
            weight: entry.weight,
            reps: entry.reps,
            score,
            logged_at: Utc::now(),
        }
    }

    /// Score derived from weight and reps alone
    pub fn recomputed_score(&self) -> f64 {
        set_score(self.weight, f64::from(self.reps))
    }
}

impl Lift for WorkoutSet {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn reps(&self) -> f64 {
        f64::from(self.reps)
    }
}

/// A validated (exercise, weight, reps) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct SetEntry {
    pub exercise: String,
    pub weight: f64,
    pub reps: u32,
}

impl SetEntry {
    /// Validates raw request fields.
    ///
    /// Exercise must be non-blank, weight finite and positive, reps a positive
    /// whole number.
    pub fn parse(
        exercise: Option<&str>,
        weight: Option<f64>,
        reps: Option<f64>,
    ) -> Result<Self, AppError> {
        let (Some(exercise), Some(weight), Some(reps)) = (exercise, weight, reps) else {
            return Err(AppError::Validation(
                "exercise, weight, and reps are required".to_string(),
            ));
        };

        let exercise = exercise.trim();
        if exercise.is_empty() {
            return Err(AppError::Validation(
                "exercise, weight, and reps are required".to_string(),
            ));
        }

        if !weight.is_finite() || !reps.is_finite() || weight <= 0.0 || reps <= 0.0 {
            return Err(AppError::Validation(
                "weight and reps must be positive numbers".to_string(),
            ));
        }

        if reps.fract() != 0.0 || reps > f64::from(u32::MAX) {
            return Err(AppError::Validation(
                "reps must be a whole number".to_string(),
            ));
        }

        Ok(Self {
            exercise: exercise.to_string(),
            weight,
            reps: reps as u32,
        })
    }

    /// Lenient form used for batch entries: anything that does not validate,
    /// including wrong JSON types, yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::parse(
            value.get("exercise").and_then(Value::as_str),
            value.get("weight").and_then(Value::as_f64),
            value.get("reps").and_then(Value::as_f64),
        )
        .ok()
    }
}
