//! Friendship lookups. A friendship is one unordered pair of user ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::shared::AppError;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: String,
    pub user_a: String,
    pub user_b: String,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn new(user_a: &str, user_b: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_a: user_a.to_string(),
            user_b: user_b.to_string(),
            created_at: Utc::now(),
        }
    }

    /// True when this friendship links the two users, in either order
    pub fn links(&self, first: &str, second: &str) -> bool {
        (self.user_a == first && self.user_b == second)
            || (self.user_a == second && self.user_b == first)
    }
}

#[derive(Clone)]
pub struct Friendships {
    friendships: Arc<dyn Collection<Friendship>>,
}

impl Friendships {
    pub fn new(friendships: Arc<dyn Collection<Friendship>>) -> Self {
        Self { friendships }
    }

    pub async fn are_friends(&self, first: &str, second: &str) -> Result<bool, AppError> {
        let found = self
            .friendships
            .find_one(&|f: &Friendship| f.links(first, second))
            .await?;
        Ok(found.is_some())
    }

    /// Links two users; an existing link is returned unchanged.
    #[instrument(skip(self))]
    pub async fn befriend(&self, first: &str, second: &str) -> Result<Friendship, AppError> {
        if first == second {
            return Err(AppError::Validation(
                "Users cannot befriend themselves".to_string(),
            ));
        }

        if let Some(existing) = self
            .friendships
            .find_one(&|f: &Friendship| f.links(first, second))
            .await?
        {
            return Ok(existing);
        }

        let friendship = self
            .friendships
            .insert_one(Friendship::new(first, second))
            .await?;
        debug!(friendship_id = %friendship.id, "Created friendship");
        Ok(friendship)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCollection;

    fn friendships() -> Friendships {
        Friendships::new(Arc::new(InMemoryCollection::new()))
    }

    #[tokio::test]
    async fn test_friendship_is_symmetric() {
        let friends = friendships();
        friends.befriend("alice", "bob").await.unwrap();

        assert!(friends.are_friends("alice", "bob").await.unwrap());
        assert!(friends.are_friends("bob", "alice").await.unwrap());
        assert!(!friends.are_friends("alice", "carol").await.unwrap());
    }

    #[tokio::test]
    async fn test_befriend_is_idempotent() {
        let friends = friendships();
        let first = friends.befriend("alice", "bob").await.unwrap();
        let second = friends.befriend("bob", "alice").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_self_friendship_rejected() {
        let result = friendships().befriend("alice", "alice").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
