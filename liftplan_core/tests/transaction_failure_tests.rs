//! Atomicity tests for aggregate writes.
//!
//! These tests verify that a failing commit leaves nothing behind and that
//! cascades staged into a caller's transaction commit together.

use async_trait::async_trait;
use liftplan_core::{
    AppliedExerciseModel, Collection, DocumentStore, Error, JsonDocumentStore, RepRange,
    Repositories, Repository, Result, SessionModel, SetConfiguration, TrainingPlanBuilder,
    TrainingPlanModel, Transaction,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Store whose commits fail while `failing` is set
struct FlakyStore {
    inner: JsonDocumentStore,
    failing: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: JsonDocumentStore::in_memory(),
            failing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn bulk_get(&self, collection: Collection, ids: &[String]) -> Result<Vec<Option<Value>>> {
        self.inner.bulk_get(collection, ids).await
    }

    async fn query(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>> {
        self.inner.query(collection, field, value).await
    }

    async fn commit(&self, transaction: Transaction) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Store("disk full".into()));
        }
        self.inner.commit(transaction).await
    }
}

fn plan(name: &str) -> TrainingPlanModel {
    let mut builder = TrainingPlanBuilder::new("athlete", name);
    builder
        .add_session("Full Body")
        .add_exercise_to_current_session(AppliedExerciseModel::new(
            "athlete",
            "deadlift",
            SetConfiguration::standard(3, RepRange::exact(5)),
        ))
        .add_exercise_to_current_session(AppliedExerciseModel::new(
            "athlete",
            "press",
            SetConfiguration::standard(3, RepRange::new(8, 10)),
        ));
    builder.build().unwrap()
}

#[tokio::test]
async fn test_failed_commit_writes_nothing() {
    let store = Arc::new(FlakyStore::new());
    let repos = Repositories::new(store.clone());
    store.failing.store(true, Ordering::SeqCst);

    let err = repos.training_plans.save(&plan("Block A")).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    for collection in Collection::ALL {
        assert_eq!(store.inner.count(collection).await, 0, "{collection} not empty");
    }
}

#[tokio::test]
async fn test_failed_delete_keeps_whole_tree() {
    let store = Arc::new(FlakyStore::new());
    let repos = Repositories::new(store.clone());
    let plan = plan("Block A");
    repos.training_plans.save(&plan).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);
    repos.training_plans.delete(plan.id()).await.unwrap_err();
    store.failing.store(false, Ordering::SeqCst);

    let loaded = repos.training_plans.find_by_id(plan.id()).await.unwrap().unwrap();
    assert_eq!(loaded, plan);
}

#[tokio::test]
async fn test_cascades_share_the_caller_transaction() {
    let store = Arc::new(FlakyStore::new());
    let repos = Repositories::new(store.clone());
    let first = plan("Block A");
    let second = plan("Block B");

    let mut tx = store.begin();
    repos.training_plans.save_in(&first, &mut tx).await.unwrap();
    repos.training_plans.save_in(&second, &mut tx).await.unwrap();
    // nothing is visible until the caller commits
    assert!(repos.training_plans.find_all("athlete").await.unwrap().is_empty());

    store.commit(tx).await.unwrap();
    assert_eq!(repos.training_plans.find_all("athlete").await.unwrap().len(), 2);
    assert_eq!(store.inner.count(Collection::Sessions).await, 2);
    assert_eq!(store.inner.count(Collection::ExerciseGroups).await, 4);
}

#[tokio::test]
async fn test_mixed_levels_in_one_transaction() {
    let store = Arc::new(FlakyStore::new());
    let repos = Repositories::new(store.clone());
    let plan = plan("Block A");
    repos.training_plans.save(&plan).await.unwrap();

    let extra = SessionModel::new("athlete", "Conditioning");
    let mut tx = store.begin();
    repos.training_plans.delete_in(plan.id(), &mut tx).await.unwrap();
    repos.sessions.save_in(&extra, &mut tx).await.unwrap();

    store.failing.store(true, Ordering::SeqCst);
    store.commit(tx).await.unwrap_err();
    assert!(repos.training_plans.find_by_id(plan.id()).await.unwrap().is_some());
    assert!(repos.sessions.find_by_id(extra.id()).await.unwrap().is_none());
}
