use serde::Serialize;
use serde_json::Value;
use strum_macros::IntoStaticStr;

use crate::competition::models::{Competition, CompetitionRequest};
use crate::competition::types::CompetitionResult;
use crate::workout::models::WorkoutSet;

/// A named event with a JSON payload, ready to be framed for a live stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub name: &'static str,
    pub data: Value,
}

impl StreamEvent {
    pub fn new(name: &'static str, data: Value) -> Self {
        Self { name, data }
    }

    pub fn from_payload<T: Serialize>(name: &'static str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self::new(name, serde_json::to_value(payload)?))
    }
}

/// Events fanned out to everyone watching one competition
#[derive(Debug, Clone, Serialize, IntoStaticStr)]
#[serde(untagged)]
#[strum(serialize_all = "kebab-case")]
pub enum CompetitionEvent {
    SetLogged(SetLogged),
    SetsLogged(SetsLogged),
    SetDeleted(SetDeleted),
    CompetitionEnded(CompetitionResult),
}

impl CompetitionEvent {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLogged {
    pub set: WorkoutSet,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetsLogged {
    pub sets: Vec<WorkoutSet>,
    pub user_id: String,
    pub user_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDeleted {
    pub set_id: String,
    pub user_id: String,
}

/// Events delivered to a single user's notification stream
#[derive(Debug, Clone, Serialize, IntoStaticStr)]
#[serde(untagged)]
#[strum(serialize_all = "kebab-case")]
pub enum UserNotification {
    CompetitionRequestReceived(RequestReceived),
    CompetitionRequestAccepted(RequestAccepted),
    CompetitionRequestDeclined(RequestDeclined),
}

impl UserNotification {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReceived {
    pub request: CompetitionRequest,
    pub from_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAccepted {
    pub request_id: String,
    pub competition: Competition,
    pub accepted_by_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDeclined {
    pub request_id: String,
    pub declined_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names_are_kebab_case() {
        let deleted = CompetitionEvent::SetDeleted(SetDeleted {
            set_id: "s1".to_string(),
            user_id: "u1".to_string(),
        });
        assert_eq!(deleted.name(), "set-deleted");

        let declined = UserNotification::CompetitionRequestDeclined(RequestDeclined {
            request_id: "r1".to_string(),
            declined_by: "u2".to_string(),
        });
        assert_eq!(declined.name(), "competition-request-declined");
    }

    #[test]
    fn test_payload_serializes_without_variant_tag() {
        let deleted = CompetitionEvent::SetDeleted(SetDeleted {
            set_id: "s1".to_string(),
            user_id: "u1".to_string(),
        });
        let event = StreamEvent::from_payload(deleted.name(), &deleted).unwrap();

        assert_eq!(event.name, "set-deleted");
        assert_eq!(event.data, json!({ "setId": "s1", "userId": "u1" }));
    }
}
