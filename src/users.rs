//! User records and id → display name lookup.
//!
//! Accounts are created elsewhere; this server only reads them to decorate
//! responses and events with names.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::shared::AppError;
use crate::store::Collection;

/// Name shown for ids with no matching user record
pub const UNKNOWN_USER_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn Collection<User>>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn Collection<User>>) -> Self {
        Self { users }
    }

    /// Adds a user record
    #[instrument(skip(self))]
    pub async fn register(&self, name: &str) -> Result<User, AppError> {
        let user = self.users.insert_one(User::new(name)).await?;
        debug!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.users.find_one(&|user: &User| user.id == user_id).await
    }

    /// Display name for `user_id`, or "Unknown" when there is no such user.
    pub async fn display_name(&self, user_id: &str) -> Result<String, AppError> {
        Ok(self
            .find(user_id)
            .await?
            .map(|user| user.name)
            .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string()))
    }
}
