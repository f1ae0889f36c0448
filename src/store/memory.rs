use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{Collection, Document, Predicate, Updater};
use crate::shared::AppError;

/// In-memory implementation of Collection for development and testing
///
/// Data is lost when the process exits.
pub struct InMemoryCollection<T> {
    documents: RwLock<Vec<T>>,
}

impl<T> Default for InMemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryCollection<T> {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Creates a collection with pre-populated documents
    pub fn with_documents(documents: Vec<T>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl<T: Document> Collection<T> for InMemoryCollection<T> {
    async fn find_one(&self, predicate: Predicate<'_, T>) -> Result<Option<T>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|doc| predicate(doc)).cloned())
    }

    async fn find_many(&self, predicate: Predicate<'_, T>) -> Result<Vec<T>, AppError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, document: T) -> Result<T, AppError> {
        let mut documents = self.documents.write().await;
        documents.push(document.clone());
        Ok(document)
    }

    #[instrument(skip_all)]
    async fn update_many(
        &self,
        predicate: Predicate<'_, T>,
        updater: Updater<'_, T>,
    ) -> Result<usize, AppError> {
        let mut documents = self.documents.write().await;
        let mut count = 0;
        for doc in documents.iter_mut().filter(|doc| predicate(doc)) {
            updater(doc);
            count += 1;
        }
        debug!(updated = count, "Updated documents in memory");
        Ok(count)
    }

    #[instrument(skip_all)]
    async fn remove_many(&self, predicate: Predicate<'_, T>) -> Result<usize, AppError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|doc| !predicate(doc));
        let removed = before - documents.len();
        debug!(removed = removed, "Removed documents from memory");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        owner: String,
        text: String,
    }

    fn note(id: u32, owner: &str) -> Note {
        Note {
            id,
            owner: owner.to_string(),
            text: format!("note {id}"),
        }
    }

    #[tokio::test]
    async fn test_find_on_empty_collection() {
        let collection: InMemoryCollection<Note> = InMemoryCollection::new();

        assert!(collection.find_one(&|_: &Note| true).await.unwrap().is_none());
        assert!(collection.find_many(&|_: &Note| true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let collection = InMemoryCollection::new();
        collection.insert_one(note(1, "alice")).await.unwrap();
        collection.insert_one(note(2, "bob")).await.unwrap();
        collection.insert_one(note(3, "alice")).await.unwrap();

        let found = collection
            .find_one(&|n: &Note| n.id == 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.owner, "bob");

        let alice = collection
            .find_many(&|n: &Note| n.owner == "alice")
            .await
            .unwrap();
        assert_eq!(alice.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_update_many_counts_matches() {
        let collection = InMemoryCollection::with_documents(vec![
            note(1, "alice"),
            note(2, "bob"),
            note(3, "alice"),
        ]);

        let updated = collection
            .update_many(&|n: &Note| n.owner == "alice", &|n: &mut Note| {
                n.text = "edited".to_string()
            })
            .await
            .unwrap();
        assert_eq!(updated, 2);

        let bob = collection
            .find_one(&|n: &Note| n.id == 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bob.text, "note 2");

        let none = collection
            .update_many(&|n: &Note| n.id == 99, &|n: &mut Note| n.id = 0)
            .await
            .unwrap();
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn test_remove_many() {
        let collection = InMemoryCollection::with_documents(vec![
            note(1, "alice"),
            note(2, "bob"),
            note(3, "alice"),
        ]);

        let removed = collection
            .remove_many(&|n: &Note| n.owner == "alice")
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(collection.len().await, 1);

        let removed_again = collection
            .remove_many(&|n: &Note| n.owner == "alice")
            .await
            .unwrap();
        assert_eq!(removed_again, 0);
    }
}
