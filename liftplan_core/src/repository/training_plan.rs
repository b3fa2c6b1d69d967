//! Training plan persistence (aggregate root).
//!
//! Saving checks name uniqueness within the profile before anything is
//! staged, then writes the plan and its whole session tree in one commit.

use super::{fetch_children, from_document, resolve, sort_oldest_first, to_document, Repository, SessionRepo};
use crate::model::{TrainingPlanData, TrainingPlanModel};
use crate::store::{Collection, DocumentStore, Transaction};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const COLLECTION: Collection = Collection::TrainingPlans;

pub struct TrainingPlanRepository {
    store: Arc<dyn DocumentStore>,
    sessions: SessionRepo,
}

impl TrainingPlanRepository {
    pub fn new(store: Arc<dyn DocumentStore>, sessions: SessionRepo) -> Self {
        Self { store, sessions }
    }

    /// Plans assigned to a cycle, by `order` (unset last) then name
    pub async fn find_by_cycle(&self, cycle_id: &str) -> Result<Vec<TrainingPlanModel>> {
        let documents = self
            .store
            .query(COLLECTION, "cycle_id", &Value::from(cycle_id))
            .await?;
        let mut plans = self.hydrate_all(documents).await?;
        plans.sort_by(|a, b| {
            a.order()
                .is_none()
                .cmp(&b.order().is_none())
                .then_with(|| a.order().cmp(&b.order()))
                .then_with(|| a.name().cmp(b.name()))
        });
        Ok(plans)
    }

    /// Fails if another plan of the same profile already uses this name.
    ///
    /// Reads only stored records; nothing is staged.
    async fn ensure_unique_name(&self, plan: &TrainingPlanModel) -> Result<()> {
        let siblings = self
            .store
            .query(COLLECTION, "profile_id", &Value::from(plan.profile_id()))
            .await?;

        for document in siblings {
            let sibling: TrainingPlanData = from_document(document)?;
            if sibling.name == plan.name() && sibling.id != plan.id() {
                tracing::info!(
                    "Training plan name '{}' already used by {} in profile {}",
                    plan.name(),
                    sibling.id,
                    plan.profile_id()
                );
                return Err(Error::TrainingPlanNameConflict {
                    name: plan.name().to_string(),
                    profile_id: plan.profile_id().to_string(),
                });
            }
        }
        Ok(())
    }

    async fn hydrate_all(&self, documents: Vec<Value>) -> Result<Vec<TrainingPlanModel>> {
        let records = documents
            .into_iter()
            .map(from_document::<TrainingPlanData>)
            .collect::<Result<Vec<_>>>()?;

        let sessions = fetch_children(
            self.sessions.as_ref(),
            records.iter().map(|r| r.session_ids.as_slice()),
        )
        .await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let children = resolve(&record.session_ids, &sessions);
                TrainingPlanModel::hydrate(record, children)
            })
            .collect())
    }
}

#[async_trait]
impl Repository for TrainingPlanRepository {
    type Model = TrainingPlanModel;

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn save_in(&self, model: &TrainingPlanModel, tx: &mut Transaction) -> Result<()> {
        self.ensure_unique_name(model).await?;

        tx.put(COLLECTION, model.id(), to_document(&model.to_plain_object())?);
        for session in model.sessions() {
            self.sessions.save_in(session, tx).await?;
        }
        tracing::debug!(
            "Staged training plan {} with {} sessions",
            model.id(),
            model.total_sessions()
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TrainingPlanModel>> {
        match self.store.get(COLLECTION, id).await? {
            Some(document) => Ok(self.hydrate_all(vec![document]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<TrainingPlanModel>> {
        let documents = self.store.bulk_get(COLLECTION, ids).await?;
        self.hydrate_all(documents.into_iter().flatten().collect())
            .await
    }

    async fn find_all(&self, profile_id: &str) -> Result<Vec<TrainingPlanModel>> {
        let documents = self
            .store
            .query(COLLECTION, "profile_id", &Value::from(profile_id))
            .await?;
        let mut plans = self.hydrate_all(documents).await?;
        sort_oldest_first(&mut plans);
        Ok(plans)
    }

    async fn delete_in(&self, id: &str, tx: &mut Transaction) -> Result<()> {
        let Some(document) = self.store.get(COLLECTION, id).await? else {
            tracing::debug!("Training plan {} not found, nothing to delete", id);
            return Ok(());
        };
        let record: TrainingPlanData = from_document(document)?;

        for session_id in &record.session_ids {
            self.sessions.delete_in(session_id, tx).await?;
        }
        tx.delete(COLLECTION, id);
        tracing::debug!(
            "Staged delete of training plan {} ({} sessions)",
            id,
            record.session_ids.len()
        );
        Ok(())
    }
}
