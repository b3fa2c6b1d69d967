//! Repositories: one per aggregate level, each composing the level below.
//!
//! Saving and deleting cascade downwards inside a single [`Transaction`];
//! loading works bottom-up, batch-fetching all children of a set of parents
//! in one call before hydrating the parents.

use crate::model::{AppliedExerciseModel, Entity, ExerciseGroupModel, SessionModel};
use crate::store::{DocumentStore, Transaction};
use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub mod applied_exercise;
pub mod exercise_group;
pub mod session;
pub mod training_plan;

pub use applied_exercise::AppliedExerciseRepository;
pub use exercise_group::ExerciseGroupRepository;
pub use session::WorkoutSessionRepository;
pub use training_plan::TrainingPlanRepository;

/// Persistence port for one level of the training plan aggregate
#[async_trait]
pub trait Repository: Send + Sync {
    type Model: Entity + Clone + Send + Sync + 'static;

    /// The store this repository writes through
    fn store(&self) -> &dyn DocumentStore;

    /// Save the model and everything it owns in one atomic write
    async fn save(&self, model: &Self::Model) -> Result<Self::Model> {
        let mut tx = self.store().begin();
        self.save_in(model, &mut tx).await?;
        self.store().commit(tx).await?;
        Ok(model.clone())
    }

    /// Stage the model and everything it owns into the caller's write
    async fn save_in(&self, model: &Self::Model, tx: &mut Transaction) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Model>>;

    /// Models for the given ids, in the given order; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Self::Model>>;

    /// Every model of a profile, oldest first
    async fn find_all(&self, profile_id: &str) -> Result<Vec<Self::Model>>;

    /// Delete the model and everything it owns in one atomic write.
    ///
    /// Unknown ids are a no-op.
    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self.store().begin();
        self.delete_in(id, &mut tx).await?;
        self.store().commit(tx).await
    }

    /// Stage deletes for the model and everything it owns, children first
    async fn delete_in(&self, id: &str, tx: &mut Transaction) -> Result<()>;
}

/// The full repository chain over one store
#[derive(Clone)]
pub struct Repositories {
    pub applied_exercises: Arc<AppliedExerciseRepository>,
    pub exercise_groups: Arc<ExerciseGroupRepository>,
    pub sessions: Arc<WorkoutSessionRepository>,
    pub training_plans: Arc<TrainingPlanRepository>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let applied_exercises = Arc::new(AppliedExerciseRepository::new(store.clone()));
        let exercise_groups = Arc::new(ExerciseGroupRepository::new(
            store.clone(),
            applied_exercises.clone(),
        ));
        let sessions = Arc::new(WorkoutSessionRepository::new(
            store.clone(),
            exercise_groups.clone(),
        ));
        let training_plans = Arc::new(TrainingPlanRepository::new(store, sessions.clone()));

        Self {
            applied_exercises,
            exercise_groups,
            sessions,
            training_plans,
        }
    }
}

pub(crate) type ExerciseRepo = Arc<dyn Repository<Model = AppliedExerciseModel>>;
pub(crate) type GroupRepo = Arc<dyn Repository<Model = ExerciseGroupModel>>;
pub(crate) type SessionRepo = Arc<dyn Repository<Model = SessionModel>>;

pub(crate) fn to_document<T: Serialize>(record: &T) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

pub(crate) fn from_document<T: DeserializeOwned>(document: Value) -> Result<T> {
    Ok(serde_json::from_value(document)?)
}

/// Fetch every child referenced by any parent in one batch, keyed by id
pub(crate) async fn fetch_children<'a, C>(
    repository: &dyn Repository<Model = C>,
    id_lists: impl IntoIterator<Item = &'a [String]>,
) -> Result<HashMap<String, C>>
where
    C: Entity + Clone + Send + Sync + 'static,
{
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for id in id_lists.into_iter().flatten() {
        if seen.insert(id) {
            ids.push(id.clone());
        }
    }

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let children = repository.find_by_ids(&ids).await?;
    Ok(children
        .into_iter()
        .map(|child| (child.id().to_string(), child))
        .collect())
}

/// Map a parent's ordered child ids through the lookup, skipping dangling ids
pub(crate) fn resolve<C: Clone>(ids: &[String], lookup: &HashMap<String, C>) -> Vec<C> {
    ids.iter()
        .filter_map(|id| {
            let child = lookup.get(id).cloned();
            if child.is_none() {
                tracing::debug!("Skipping dangling reference {}", id);
            }
            child
        })
        .collect()
}

pub(crate) fn sort_oldest_first<M: Entity>(models: &mut [M]) {
    models.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keeps_order_and_skips_dangling() {
        let lookup: HashMap<String, u32> =
            [("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();
        let ids = vec!["b".to_string(), "ghost".to_string(), "a".to_string()];
        assert_eq!(resolve(&ids, &lookup), vec![2, 1]);
    }
}
