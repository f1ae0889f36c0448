use serde::{Deserialize, Serialize};

use super::models::SoloSession;
use crate::workout::models::WorkoutSet;

/// Request body for POST /api/solo/sessions
#[derive(Debug, Default, Deserialize)]
pub struct StartSessionBody {
    pub name: Option<String>,
}

/// Request body for POST /api/solo/sets
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSoloSetRequest {
    pub session_id: Option<String>,
    pub exercise: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub session: SoloSession,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SoloSession>,
}

/// GET /api/solo/sessions/:id response; sets newest first
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: SoloSession,
    pub sets: Vec<WorkoutSet>,
    pub total_score: f64,
}

/// Personal bests across all of a user's solo work
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecords {
    /// Highest-scoring set per exercise
    pub personal_records: Vec<WorkoutSet>,
    /// Highest-scoring completed session
    pub best_session: Option<SoloSession>,
    pub all_time_score: f64,
    pub total_sets: usize,
    pub total_sessions: usize,
}
