#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::Router;
use std::collections::HashMap;

use fitfighter::{
    build_router, store::Collection, AppState, EventHub, Friendships, Store, StreamConfig,
    TokenConfig, User,
};

pub const TEST_SECRET: &str = "integration-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app: Router,
    pub state: AppState,
    tokens: HashMap<String, String>,
}

impl TestSetup {
    /// Bearer token for a seeded user
    pub fn token(&self, user_id: &str) -> &str {
        self.tokens
            .get(user_id)
            .unwrap_or_else(|| panic!("{} was not seeded", user_id))
    }
}

pub struct TestSetupBuilder {
    users: Vec<(String, String)>,
    friendships: Vec<(String, String)>,
    stream_config: StreamConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            friendships: vec![],
            stream_config: StreamConfig::default(),
        }
    }

    /// Seeds users as (id, display name) pairs
    pub fn with_users(mut self, users: Vec<(&str, &str)>) -> Self {
        self.users = users
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        self
    }

    pub fn with_friendship(mut self, first: &str, second: &str) -> Self {
        self.friendships
            .push((first.to_string(), second.to_string()));
        self
    }

    /// alice and bob are friends, carol knows nobody
    pub fn with_gym_buddies(self) -> Self {
        self.with_users(vec![("alice", "Alice"), ("bob", "Bob"), ("carol", "Carol")])
            .with_friendship("alice", "bob")
    }

    pub fn with_heartbeat_millis(mut self, millis: u64) -> Self {
        self.stream_config.heartbeat_interval = std::time::Duration::from_millis(millis);
        self
    }

    pub async fn build(self) -> TestSetup {
        let store = Store::in_memory();

        for (id, name) in &self.users {
            store
                .users
                .insert_one(User {
                    id: id.clone(),
                    name: name.clone(),
                })
                .await
                .unwrap();
        }

        let friendships = Friendships::new(store.friendships.clone());
        for (first, second) in &self.friendships {
            friendships.befriend(first, second).await.unwrap();
        }

        let token_config = TokenConfig::new(TEST_SECRET.to_string(), 7);
        let tokens = self
            .users
            .iter()
            .map(|(id, _)| (id.clone(), token_config.create_token(id).unwrap()))
            .collect();

        let state = AppState::new(store, EventHub::new(16), token_config, self.stream_config);
        let app = build_router(state.clone());

        TestSetup { app, state, tokens }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
