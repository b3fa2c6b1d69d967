//! JSON snapshot document store.
//!
//! Collections live in memory behind an async `RwLock`. When opened with a
//! path, every commit writes the full snapshot atomically:
//! 1. Apply the staged operations to a copy
//! 2. Write the copy to a locked temp file and sync it
//! 3. Rename over the original, then swap the copy in
//!
//! The file write runs on tokio's blocking pool while the commit keeps the
//! write lock, so commits are serialized but never stall executor threads.
//! A failed write leaves both the file and the in-memory state unchanged.

use super::{Collection, DocumentStore, Transaction, WriteOp};
use crate::{Config, Error, Result};
use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;

type Snapshot = BTreeMap<Collection, BTreeMap<String, Value>>;

/// Document store kept in memory and optionally mirrored to a JSON file
#[derive(Debug, Default)]
pub struct JsonDocumentStore {
    path: Option<PathBuf>,
    collections: RwLock<Snapshot>,
}

impl JsonDocumentStore {
    /// Volatile store, mostly for tests
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading the snapshot if it exists.
    ///
    /// A snapshot that cannot be parsed is moved aside to `<file>.corrupt`
    /// and the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collections = load_snapshot(&path)?;
        Ok(Self {
            path: Some(path),
            collections: RwLock::new(collections),
        })
    }

    /// Open the store configured in `[data]` / `[store]`
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::open(config.store_path())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn bulk_get(&self, collection: Collection, ids: &[String]) -> Result<Vec<Option<Value>>> {
        let collections = self.collections.read().await;
        let docs = collections.get(&collection);
        Ok(ids
            .iter()
            .map(|id| docs.and_then(|d| d.get(id)).cloned())
            .collect())
    }

    async fn query(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, transaction: Transaction) -> Result<()> {
        if transaction.is_empty() {
            return Ok(());
        }

        let op_count = transaction.len();
        let mut collections = self.collections.write().await;
        let mut next = collections.clone();

        for op in transaction.into_ops() {
            match op {
                WriteOp::Put {
                    collection,
                    id,
                    document,
                } => {
                    next.entry(collection).or_default().insert(id, document);
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(docs) = next.get_mut(&collection) {
                        docs.remove(&id);
                    }
                }
            }
        }

        if let Some(path) = &self.path {
            let path = path.clone();
            next = tokio::task::spawn_blocking(move || {
                save_snapshot(&path, &next)?;
                Ok::<_, Error>(next)
            })
            .await
            .map_err(|e| Error::Store(format!("snapshot writer task failed: {}", e)))??;
        }

        *collections = next;
        tracing::debug!("Committed transaction with {} operations", op_count);
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        tracing::info!("No store file found at {:?}, starting empty", path);
        return Ok(Snapshot::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    match serde_json::from_str::<Snapshot>(&contents) {
        Ok(snapshot) => {
            tracing::debug!("Loaded store snapshot from {:?}", path);
            Ok(snapshot)
        }
        Err(e) => {
            let mut aside = path.as_os_str().to_owned();
            aside.push(".corrupt");
            tracing::warn!(
                "Failed to parse store file {:?}: {}. Moving it to {:?} and starting empty.",
                path,
                e,
                aside
            );
            std::fs::rename(path, &aside)?;
            Ok(Snapshot::new())
        }
    }
}

fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Store(format!("store path {:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    // Temp file in the same directory so the rename stays atomic
    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::debug!("Saved store snapshot to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = JsonDocumentStore::in_memory();
        store
            .put(Collection::Sessions, "s1", json!({ "id": "s1", "name": "Push" }))
            .await
            .unwrap();

        let doc = store.get(Collection::Sessions, "s1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "Push");
        assert!(store.get(Collection::TrainingPlans, "s1").await.unwrap().is_none());

        store.delete(Collection::Sessions, "s1").await.unwrap();
        assert!(store.get(Collection::Sessions, "s1").await.unwrap().is_none());

        // deleting again is a no-op
        store.delete(Collection::Sessions, "s1").await.unwrap();
    }

    #[tokio::test]
    async fn test_bulk_get_is_aligned_with_ids() {
        let store = JsonDocumentStore::in_memory();
        let mut tx = store.begin();
        tx.put(Collection::ExerciseGroups, "a", json!({ "id": "a" }));
        tx.put(Collection::ExerciseGroups, "c", json!({ "id": "c" }));
        store.commit(tx).await.unwrap();

        let ids = vec!["c".to_string(), "b".to_string(), "a".to_string()];
        let docs = store.bulk_get(Collection::ExerciseGroups, &ids).await.unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].as_ref().unwrap()["id"], "c");
        assert!(docs[1].is_none());
        assert_eq!(docs[2].as_ref().unwrap()["id"], "a");
    }

    #[tokio::test]
    async fn test_query_by_field() {
        let store = JsonDocumentStore::in_memory();
        let mut tx = store.begin();
        tx.put(Collection::TrainingPlans, "1", json!({ "id": "1", "profile_id": "p1" }));
        tx.put(Collection::TrainingPlans, "2", json!({ "id": "2", "profile_id": "p2" }));
        tx.put(Collection::TrainingPlans, "3", json!({ "id": "3", "profile_id": "p1" }));
        store.commit(tx).await.unwrap();

        let found = store
            .query(Collection::TrainingPlans, "profile_id", &json!("p1"))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|d| d["profile_id"] == "p1"));

        let none = store
            .query(Collection::Sessions, "profile_id", &json!("p1"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_has_no_effect() {
        let store = JsonDocumentStore::in_memory();
        {
            let mut tx = store.begin();
            tx.put(Collection::Sessions, "s1", json!({}));
        }
        assert_eq!(store.count(Collection::Sessions).await, 0);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("plans.json");

        {
            let store = JsonDocumentStore::open(&path).unwrap();
            let mut tx = store.begin();
            tx.put(Collection::TrainingPlans, "plan-1", json!({ "id": "plan-1" }));
            tx.put(Collection::Sessions, "s1", json!({ "id": "s1" }));
            store.commit(tx).await.unwrap();
        }

        let reopened = JsonDocumentStore::open(&path).unwrap();
        assert_eq!(reopened.count(Collection::TrainingPlans).await, 1);
        assert!(reopened.get(Collection::Sessions, "s1").await.unwrap().is_some());

        // no stray temp files remain
        let extras: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "plans.json")
            .collect();
        assert!(extras.is_empty(), "Expected only plans.json, found extras: {:?}", extras);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_file_commits_all_land() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plans.json");
        let store = std::sync::Arc::new(JsonDocumentStore::open(&path).unwrap());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let id = format!("s{i}");
                    store
                        .put(Collection::Sessions, &id, json!({ "id": id.clone() }))
                        .await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert_eq!(store.count(Collection::Sessions).await, 8);
        let reopened = JsonDocumentStore::open(&path).unwrap();
        assert_eq!(reopened.count(Collection::Sessions).await, 8);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_moved_aside() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("plans.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = JsonDocumentStore::open(&path).unwrap();
        assert_eq!(store.count(Collection::TrainingPlans).await, 0);
        assert!(temp_dir.path().join("plans.json.corrupt").exists());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_persist_keeps_memory_unchanged() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = JsonDocumentStore::open(blocker.join("plans.json")).unwrap();
        store
            .put(Collection::Sessions, "s1", json!({ "id": "s1" }))
            .await
            .unwrap_err();

        assert_eq!(store.count(Collection::Sessions).await, 0);
    }

    #[tokio::test]
    async fn test_from_config_uses_store_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().to_path_buf();
        config.store.file_name = "gym.json".into();

        let store = JsonDocumentStore::from_config(&config).unwrap();
        assert_eq!(store.path(), Some(temp_dir.path().join("gym.json").as_path()));
    }
}
