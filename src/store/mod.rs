// Document store behind a narrow five-operation interface.
//
// Each call is atomic on its own; there are no transactions spanning calls.

// Public API - what other modules can use
pub use json_file::{JsonCollection, JsonFileStore};
pub use memory::InMemoryCollection;

// Internal modules
mod json_file;
mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::competition::models::{Competition, CompetitionRequest};
use crate::config::StorageConfig;
use crate::friends::Friendship;
use crate::shared::AppError;
use crate::solo::models::SoloSession;
use crate::users::User;
use crate::workout::models::WorkoutSet;

/// Collection names, shared by every backend.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FRIENDSHIPS: &str = "friendships";
    pub const COMPETITION_REQUESTS: &str = "competitionRequests";
    pub const COMPETITIONS: &str = "competitions";
    pub const WORKOUT_SETS: &str = "workoutSets";
    pub const SOLO_SESSIONS: &str = "soloSessions";
    pub const SOLO_SETS: &str = "soloSets";
}

/// Anything that can live in a collection.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Document for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

pub type Predicate<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);
pub type Updater<'a, T> = &'a (dyn Fn(&mut T) + Send + Sync);

/// Whole-document operations over one named collection
#[async_trait]
pub trait Collection<T: Document>: Send + Sync {
    async fn find_one(&self, predicate: Predicate<'_, T>) -> Result<Option<T>, AppError>;

    async fn find_many(&self, predicate: Predicate<'_, T>) -> Result<Vec<T>, AppError>;

    async fn insert_one(&self, document: T) -> Result<T, AppError>;

    /// Applies `updater` to every match and returns how many matched.
    async fn update_many(
        &self,
        predicate: Predicate<'_, T>,
        updater: Updater<'_, T>,
    ) -> Result<usize, AppError>;

    /// Removes every match and returns how many were removed.
    async fn remove_many(&self, predicate: Predicate<'_, T>) -> Result<usize, AppError>;
}

/// The typed collections the server works with
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn Collection<User>>,
    pub friendships: Arc<dyn Collection<Friendship>>,
    pub competition_requests: Arc<dyn Collection<CompetitionRequest>>,
    pub competitions: Arc<dyn Collection<Competition>>,
    pub workout_sets: Arc<dyn Collection<WorkoutSet>>,
    pub solo_sessions: Arc<dyn Collection<SoloSession>>,
    pub solo_sets: Arc<dyn Collection<WorkoutSet>>,
}

impl Store {
    /// Volatile store, empty on creation.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryCollection::new()),
            friendships: Arc::new(InMemoryCollection::new()),
            competition_requests: Arc::new(InMemoryCollection::new()),
            competitions: Arc::new(InMemoryCollection::new()),
            workout_sets: Arc::new(InMemoryCollection::new()),
            solo_sessions: Arc::new(InMemoryCollection::new()),
            solo_sets: Arc::new(InMemoryCollection::new()),
        }
    }

    /// Store whose collections all live in one JSON document.
    pub fn json_file(file: &JsonFileStore) -> Self {
        Self {
            users: Arc::new(file.collection(collections::USERS)),
            friendships: Arc::new(file.collection(collections::FRIENDSHIPS)),
            competition_requests: Arc::new(file.collection(collections::COMPETITION_REQUESTS)),
            competitions: Arc::new(file.collection(collections::COMPETITIONS)),
            workout_sets: Arc::new(file.collection(collections::WORKOUT_SETS)),
            solo_sessions: Arc::new(file.collection(collections::SOLO_SESSIONS)),
            solo_sets: Arc::new(file.collection(collections::SOLO_SETS)),
        }
    }

    pub async fn from_config(storage: &StorageConfig) -> Result<Self, AppError> {
        match storage {
            StorageConfig::Memory => {
                info!("Using in-memory store");
                Ok(Self::in_memory())
            }
            StorageConfig::JsonFile(path) => {
                info!(path = %path.display(), "Using JSON file store");
                let file = JsonFileStore::open(path).await?;
                Ok(Self::json_file(&file))
            }
        }
    }
}
