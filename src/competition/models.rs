use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CompetitionStatus {
    Active,
    Completed,
}

/// A challenge from one friend to another. Terminal once answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionRequest {
    pub id: String,
    pub from: String,
    pub to: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl CompetitionRequest {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: from.to_string(),
            to: to.to_string(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// True when the request is between the two users, sent in either direction
    pub fn between(&self, first: &str, second: &str) -> bool {
        (self.from == first && self.to == second) || (self.from == second && self.to == first)
    }
}

/// Which participant slot a user occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// A two-party duel. `user_a` sent the request, `user_b` accepted it.
///
/// `score_a`/`score_b` are a running cache while active and the final
/// recomputed totals once completed. `winner_id` is `None` for a tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: String,
    pub user_a: String,
    pub user_b: String,
    pub status: CompetitionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub score_a: f64,
    pub score_b: f64,
    pub winner_id: Option<String>,
}

impl Competition {
    /// Starts a competition from an accepted request
    pub fn from_request(request: &CompetitionRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_a: request.from.clone(),
            user_b: request.to.clone(),
            status: CompetitionStatus::Active,
            started_at: Utc::now(),
            ended_at: None,
            score_a: 0.0,
            score_b: 0.0,
            winner_id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CompetitionStatus::Active
    }

    pub fn side_of(&self, user_id: &str) -> Option<Side> {
        if self.user_a == user_id {
            Some(Side::A)
        } else if self.user_b == user_id {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.side_of(user_id).is_some()
    }

    /// True when the competition is between the two users, in either slot order
    pub fn between(&self, first: &str, second: &str) -> bool {
        (self.user_a == first && self.user_b == second)
            || (self.user_a == second && self.user_b == first)
    }

    /// The other participant; `user_b` for anyone who is not `user_b`.
    pub fn opponent_of(&self, user_id: &str) -> &str {
        if self.user_a == user_id {
            &self.user_b
        } else {
            &self.user_a
        }
    }

    pub fn participant(&self, side: Side) -> &str {
        match side {
            Side::A => &self.user_a,
            Side::B => &self.user_b,
        }
    }

    pub fn score_of(&self, side: Side) -> f64 {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    pub fn set_running_score(&mut self, side: Side, score: f64) {
        match side {
            Side::A => self.score_a = score,
            Side::B => self.score_b = score,
        }
    }
}
