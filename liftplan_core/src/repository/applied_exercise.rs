//! Applied exercise persistence (leaf level).

use super::{from_document, sort_oldest_first, to_document, Repository};
use crate::model::{AppliedExerciseData, AppliedExerciseModel};
use crate::store::{Collection, DocumentStore, Transaction};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const COLLECTION: Collection = Collection::AppliedExercises;

pub struct AppliedExerciseRepository {
    store: Arc<dyn DocumentStore>,
}

impl AppliedExerciseRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn hydrate(document: Value) -> Result<AppliedExerciseModel> {
        let data: AppliedExerciseData = from_document(document)?;
        Ok(AppliedExerciseModel::hydrate(data))
    }
}

#[async_trait]
impl Repository for AppliedExerciseRepository {
    type Model = AppliedExerciseModel;

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn save_in(&self, model: &AppliedExerciseModel, tx: &mut Transaction) -> Result<()> {
        tx.put(COLLECTION, model.id(), to_document(&model.to_plain_object())?);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AppliedExerciseModel>> {
        self.store
            .get(COLLECTION, id)
            .await?
            .map(Self::hydrate)
            .transpose()
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<AppliedExerciseModel>> {
        let documents = self.store.bulk_get(COLLECTION, ids).await?;
        let models = documents
            .into_iter()
            .flatten()
            .map(Self::hydrate)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Fetched {} of {} applied exercises", models.len(), ids.len());
        Ok(models)
    }

    async fn find_all(&self, profile_id: &str) -> Result<Vec<AppliedExerciseModel>> {
        let documents = self
            .store
            .query(COLLECTION, "profile_id", &Value::from(profile_id))
            .await?;
        let mut models = documents
            .into_iter()
            .map(Self::hydrate)
            .collect::<Result<Vec<_>>>()?;
        sort_oldest_first(&mut models);
        Ok(models)
    }

    async fn delete_in(&self, id: &str, tx: &mut Transaction) -> Result<()> {
        tx.delete(COLLECTION, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RepRange, SetConfiguration};
    use crate::store::JsonDocumentStore;
    use serde_json::json;

    fn repository() -> (Arc<JsonDocumentStore>, AppliedExerciseRepository) {
        let store = Arc::new(JsonDocumentStore::in_memory());
        (store.clone(), AppliedExerciseRepository::new(store))
    }

    fn exercise(profile: &str, name: &str) -> AppliedExerciseModel {
        AppliedExerciseModel::new(profile, name, SetConfiguration::standard(3, RepRange::new(8, 12)))
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let (_, repo) = repository();
        let saved = repo.save(&exercise("p", "squat")).await.unwrap();

        let found = repo.find_by_id(saved.id()).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert!(repo.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_ids_keeps_order_and_skips_unknown() {
        let (_, repo) = repository();
        let a = repo.save(&exercise("p", "a")).await.unwrap();
        let b = repo.save(&exercise("p", "b")).await.unwrap();

        let ids = vec![b.id().to_string(), "ghost".to_string(), a.id().to_string()];
        let found = repo.find_by_ids(&ids).await.unwrap();
        let found_ids: Vec<_> = found.iter().map(|e| e.id()).collect();
        assert_eq!(found_ids, vec![b.id(), a.id()]);
    }

    #[tokio::test]
    async fn test_find_all_is_scoped_by_profile() {
        let (_, repo) = repository();
        let first = repo.save(&exercise("p1", "a")).await.unwrap();
        repo.save(&exercise("p2", "b")).await.unwrap();
        let second = repo.save(&exercise("p1", "c")).await.unwrap();

        let found = repo.find_all("p1").await.unwrap();
        assert_eq!(found, vec![first, second]);
    }

    #[tokio::test]
    async fn test_hydrates_string_encoded_set_configuration() {
        let (store, repo) = repository();
        let mut document = to_document(&exercise("p", "press").to_plain_object()).unwrap();
        let id = document["id"].as_str().unwrap().to_string();
        document["set_configuration"] = json!(
            r#"{"type":"myo_reps","activation_reps":{"min":12,"max":15},"mini_sets":3,"mini_set_reps":5}"#
        );
        store.put(COLLECTION, &id, document).await.unwrap();

        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.set_configuration().set_type(), "myo_reps");
        assert_eq!(found.total_sets(), 4);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, repo) = repository();
        let saved = repo.save(&exercise("p", "row")).await.unwrap();

        repo.delete(saved.id()).await.unwrap();
        repo.delete(saved.id()).await.unwrap();
        assert_eq!(store.count(COLLECTION).await, 0);
    }
}
