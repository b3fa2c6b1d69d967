//! Exercise group persistence.
//!
//! A group record stores its exercises by id; saving writes the record and
//! every exercise, deleting removes the exercises before the record.

use super::{fetch_children, from_document, resolve, sort_oldest_first, to_document, ExerciseRepo, Repository};
use crate::model::{ExerciseGroupData, ExerciseGroupModel};
use crate::store::{Collection, DocumentStore, Transaction};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const COLLECTION: Collection = Collection::ExerciseGroups;

pub struct ExerciseGroupRepository {
    store: Arc<dyn DocumentStore>,
    exercises: ExerciseRepo,
}

impl ExerciseGroupRepository {
    pub fn new(store: Arc<dyn DocumentStore>, exercises: ExerciseRepo) -> Self {
        Self { store, exercises }
    }

    async fn hydrate_all(&self, documents: Vec<Value>) -> Result<Vec<ExerciseGroupModel>> {
        let records = documents
            .into_iter()
            .map(from_document::<ExerciseGroupData>)
            .collect::<Result<Vec<_>>>()?;

        let exercises = fetch_children(
            self.exercises.as_ref(),
            records.iter().map(|r| r.applied_exercise_ids.as_slice()),
        )
        .await?;

        records
            .into_iter()
            .map(|record| {
                let children = resolve(&record.applied_exercise_ids, &exercises);
                ExerciseGroupModel::hydrate(record, children)
            })
            .collect()
    }
}

#[async_trait]
impl Repository for ExerciseGroupRepository {
    type Model = ExerciseGroupModel;

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn save_in(&self, model: &ExerciseGroupModel, tx: &mut Transaction) -> Result<()> {
        tx.put(COLLECTION, model.id(), to_document(&model.to_plain_object())?);
        for exercise in model.applied_exercises() {
            self.exercises.save_in(exercise, tx).await?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ExerciseGroupModel>> {
        let Some(document) = self.store.get(COLLECTION, id).await? else {
            return Ok(None);
        };
        Ok(self.hydrate_all(vec![document]).await?.pop())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<ExerciseGroupModel>> {
        let documents = self.store.bulk_get(COLLECTION, ids).await?;
        self.hydrate_all(documents.into_iter().flatten().collect())
            .await
    }

    async fn find_all(&self, profile_id: &str) -> Result<Vec<ExerciseGroupModel>> {
        let documents = self
            .store
            .query(COLLECTION, "profile_id", &Value::from(profile_id))
            .await?;
        let mut groups = self.hydrate_all(documents).await?;
        sort_oldest_first(&mut groups);
        Ok(groups)
    }

    async fn delete_in(&self, id: &str, tx: &mut Transaction) -> Result<()> {
        // Works from the stored record so groups that no longer hydrate can still be removed
        let Some(document) = self.store.get(COLLECTION, id).await? else {
            tracing::debug!("Exercise group {} not found, nothing to delete", id);
            return Ok(());
        };
        let record: ExerciseGroupData = from_document(document)?;

        for exercise_id in &record.applied_exercise_ids {
            self.exercises.delete_in(exercise_id, tx).await?;
        }
        tx.delete(COLLECTION, id);
        tracing::debug!(
            "Staged delete of exercise group {} with {} exercises",
            id,
            record.applied_exercise_ids.len()
        );
        Ok(())
    }
}
