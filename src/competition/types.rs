use serde::{Deserialize, Serialize};

use super::models::{Competition, CompetitionRequest};
use crate::workout::models::WorkoutSet;

/// Request body for POST /api/competitions/request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub friend_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestCreatedResponse {
    pub message: String,
    pub request: CompetitionRequest,
}

/// A pending request with the counterpart's display name
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(flatten)]
    pub request: CompetitionRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<RequestView>,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub message: String,
    pub competition: Competition,
}

/// A competition as listed for one of its participants
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionSummary {
    #[serde(flatten)]
    pub competition: Competition,
    pub opponent_name: String,
}

#[derive(Debug, Serialize)]
pub struct CompetitionListResponse {
    pub competitions: Vec<CompetitionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
    pub sets: Vec<WorkoutSet>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participants {
    pub user_a: ParticipantView,
    pub user_b: ParticipantView,
}

/// GET /api/competitions/:id response; scores are recomputed from the sets
#[derive(Debug, Clone, Serialize)]
pub struct CompetitionDetail {
    pub competition: Competition,
    pub participants: Participants,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSummary {
    pub id: String,
    pub name: String,
}

/// Outcome of ending a competition. `winner` is `None` on a tie.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionResult {
    pub competition_id: String,
    pub score_a: f64,
    pub score_b: f64,
    pub winner_id: Option<String>,
    pub user_a: ParticipantSummary,
    pub user_b: ParticipantSummary,
    pub winner: Option<ParticipantSummary>,
}

#[derive(Debug, Serialize)]
pub struct EndResponse {
    pub message: String,
    pub result: CompetitionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_view_flattens_request() {
        let view = RequestView {
            request: CompetitionRequest::new("alice", "bob"),
            from_name: Some("Alice".to_string()),
            to_name: None,
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["from"], "alice");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["fromName"], "Alice");
        assert!(value.get("toName").is_none());
    }

    #[test]
    fn test_tie_result_has_null_winner() {
        let result = CompetitionResult {
            competition_id: "c1".to_string(),
            score_a: 80.0,
            score_b: 80.0,
            winner_id: None,
            user_a: ParticipantSummary {
                id: "a".to_string(),
                name: "A".to_string(),
            },
            user_b: ParticipantSummary {
                id: "b".to_string(),
                name: "B".to_string(),
            },
            winner: None,
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["competitionId"], "c1");
        assert!(value["winner"].is_null());
        assert!(value["winnerId"].is_null());
        assert_eq!(value["userA"]["name"], "A");
    }
}
