use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::{Collection, Document, Predicate, Updater};
use crate::shared::AppError;

/// All collections stored as arrays inside one JSON object on disk.
///
/// Every operation reads the whole file, applies its change and writes the
/// file back under one lock, so calls never interleave. Writes go to a
/// sibling temp file first and are renamed into place.
#[derive(Clone)]
pub struct JsonFileStore {
    inner: Arc<JsonFileInner>,
}

struct JsonFileInner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens the database file, creating it (and its directory) when missing.
    #[instrument]
    pub async fn open(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("{}: {}", parent.display(), e)))?;
        }

        let store = Self {
            inner: Arc::new(JsonFileInner {
                path,
                lock: Mutex::new(()),
            }),
        };

        if tokio::fs::try_exists(&store.inner.path)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?
        {
            // Fail fast on a corrupt file rather than on the first request.
            store.read_document().await?;
        } else {
            info!(path = %store.inner.path.display(), "Creating empty database file");
            store.write_document(&Map::new()).await?;
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn collection<T: Document>(&self, name: &'static str) -> JsonCollection<T> {
        JsonCollection {
            store: self.clone(),
            name,
            _marker: PhantomData,
        }
    }

    async fn read_document(&self) -> Result<Map<String, Value>, AppError> {
        let raw = tokio::fs::read_to_string(&self.inner.path)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {}", self.inner.path.display(), e)))?;

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::Storage(
                "database root must be a JSON object".to_string(),
            )),
            Err(e) => Err(AppError::Storage(format!("invalid database file: {}", e))),
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<(), AppError> {
        let serialized = serde_json::to_string_pretty(document)
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let mut tmp_path = self.inner.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        tokio::fs::write(&tmp_path, serialized)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {}", tmp_path.display(), e)))?;
        tokio::fs::rename(&tmp_path, &self.inner.path)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {}", self.inner.path.display(), e)))?;
        Ok(())
    }
}

/// Typed view of one named array inside a JsonFileStore
pub struct JsonCollection<T> {
    store: JsonFileStore,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> JsonCollection<T> {
    fn entries(&self, document: &mut Map<String, Value>) -> Result<Vec<Value>, AppError> {
        match document.remove(self.name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(AppError::Storage(format!(
                "collection '{}' is not an array",
                self.name
            ))),
        }
    }

    /// Decodes one stored entry, skipping entries that do not fit the type.
    fn decode(&self, entry: &Value) -> Option<T> {
        match T::deserialize(entry) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(collection = self.name, error = %e, "Skipping undecodable document");
                None
            }
        }
    }

    fn encode(&self, document: &T) -> Result<Value, AppError> {
        serde_json::to_value(document).map_err(|e| AppError::Storage(e.to_string()))
    }

    async fn load(&self) -> Result<Vec<Value>, AppError> {
        let mut document = self.store.read_document().await?;
        self.entries(&mut document)
    }
}

#[async_trait]
impl<T: Document> Collection<T> for JsonCollection<T> {
    async fn find_one(&self, predicate: Predicate<'_, T>) -> Result<Option<T>, AppError> {
        let _guard = self.store.inner.lock.lock().await;
        let entries = self.load().await?;
        Ok(entries
            .iter()
            .filter_map(|entry| self.decode(entry))
            .find(|doc| predicate(doc)))
    }

    async fn find_many(&self, predicate: Predicate<'_, T>) -> Result<Vec<T>, AppError> {
        let _guard = self.store.inner.lock.lock().await;
        let entries = self.load().await?;
        Ok(entries
            .iter()
            .filter_map(|entry| self.decode(entry))
            .filter(|doc| predicate(doc))
            .collect())
    }

    #[instrument(skip_all, fields(collection = self.name))]
    async fn insert_one(&self, document: T) -> Result<T, AppError> {
        let _guard = self.store.inner.lock.lock().await;
        let mut root = self.store.read_document().await?;
        let mut entries = self.entries(&mut root)?;

        entries.push(self.encode(&document)?);
        root.insert(self.name.to_string(), Value::Array(entries));
        self.store.write_document(&root).await?;

        debug!("Inserted document");
        Ok(document)
    }

    #[instrument(skip_all, fields(collection = self.name))]
    async fn update_many(
        &self,
        predicate: Predicate<'_, T>,
        updater: Updater<'_, T>,
    ) -> Result<usize, AppError> {
        let _guard = self.store.inner.lock.lock().await;
        let mut root = self.store.read_document().await?;
        let mut entries = self.entries(&mut root)?;

        let mut count = 0;
        for entry in entries.iter_mut() {
            // Entries that are not touched keep their exact stored form.
            let Some(mut doc) = self.decode(entry) else {
                continue;
            };
            if predicate(&doc) {
                updater(&mut doc);
                *entry = self.encode(&doc)?;
                count += 1;
            }
        }

        if count > 0 {
            root.insert(self.name.to_string(), Value::Array(entries));
            self.store.write_document(&root).await?;
        }

        debug!(updated = count, "Updated documents");
        Ok(count)
    }

    #[instrument(skip_all, fields(collection = self.name))]
    async fn remove_many(&self, predicate: Predicate<'_, T>) -> Result<usize, AppError> {
        let _guard = self.store.inner.lock.lock().await;
        let mut root = self.store.read_document().await?;
        let entries = self.entries(&mut root)?;

        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .filter(|entry| !self.decode(entry).is_some_and(|doc| predicate(&doc)))
            .collect();
        let removed = before - kept.len();

        if removed > 0 {
            root.insert(self.name.to_string(), Value::Array(kept));
            self.store.write_document(&root).await?;
        }

        debug!(removed = removed, "Removed documents");
        Ok(removed)
    }
}
