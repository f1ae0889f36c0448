use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::models::WorkoutSet;

/// Request body for POST /api/workouts/sets
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSetRequest {
    pub competition_id: Option<String>,
    pub exercise: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<f64>,
}

/// Request body for POST /api/workouts/sets/batch
///
/// Entries stay untyped so one malformed entry does not reject the batch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSetsBatchRequest {
    pub competition_id: Option<String>,
    pub sets: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetLoggedResponse {
    pub message: String,
    pub set: WorkoutSet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchLoggedResponse {
    pub message: String,
    pub sets: Vec<WorkoutSet>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MySetsResponse {
    pub sets: Vec<WorkoutSet>,
    pub total_score: f64,
}
