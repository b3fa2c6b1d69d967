//! Workout session persistence.

use super::{fetch_children, from_document, resolve, sort_oldest_first, to_document, GroupRepo, Repository};
use crate::model::{SessionData, SessionModel};
use crate::store::{Collection, DocumentStore, Transaction};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const COLLECTION: Collection = Collection::Sessions;

pub struct WorkoutSessionRepository {
    store: Arc<dyn DocumentStore>,
    groups: GroupRepo,
}

impl WorkoutSessionRepository {
    pub fn new(store: Arc<dyn DocumentStore>, groups: GroupRepo) -> Self {
        Self { store, groups }
    }

    async fn hydrate_all(&self, documents: Vec<Value>) -> Result<Vec<SessionModel>> {
        let records = documents
            .into_iter()
            .map(from_document::<SessionData>)
            .collect::<Result<Vec<_>>>()?;

        let groups = fetch_children(
            self.groups.as_ref(),
            records.iter().map(|r| r.group_ids.as_slice()),
        )
        .await?;

        Ok(records
            .into_iter()
            .map(|record| {
                let children = resolve(&record.group_ids, &groups);
                SessionModel::hydrate(record, children)
            })
            .collect())
    }
}

#[async_trait]
impl Repository for WorkoutSessionRepository {
    type Model = SessionModel;

    fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    async fn save_in(&self, model: &SessionModel, tx: &mut Transaction) -> Result<()> {
        tx.put(COLLECTION, model.id(), to_document(&model.to_plain_object())?);
        for group in model.groups() {
            self.groups.save_in(group, tx).await?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SessionModel>> {
        match self.store.get(COLLECTION, id).await? {
            Some(document) => Ok(self.hydrate_all(vec![document]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<SessionModel>> {
        let documents = self.store.bulk_get(COLLECTION, ids).await?;
        self.hydrate_all(documents.into_iter().flatten().collect())
            .await
    }

    async fn find_all(&self, profile_id: &str) -> Result<Vec<SessionModel>> {
        let documents = self
            .store
            .query(COLLECTION, "profile_id", &Value::from(profile_id))
            .await?;
        let mut sessions = self.hydrate_all(documents).await?;
        sort_oldest_first(&mut sessions);
        Ok(sessions)
    }

    async fn delete_in(&self, id: &str, tx: &mut Transaction) -> Result<()> {
        let Some(document) = self.store.get(COLLECTION, id).await? else {
            return Ok(());
        };
        let record: SessionData = from_document(document)?;

        for group_id in &record.group_ids {
            self.groups.delete_in(group_id, tx).await?;
        }
        tx.delete(COLLECTION, id);
        tracing::debug!("Staged delete of session {} ({} groups)", id, record.group_ids.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppliedExerciseModel, DayOfWeek, ExerciseGroupModel, RepRange, SetConfiguration};
    use crate::repository::Repositories;
    use crate::store::JsonDocumentStore;

    fn exercise(name: &str) -> AppliedExerciseModel {
        AppliedExerciseModel::new("p", name, SetConfiguration::standard(4, RepRange::exact(5)))
    }

    fn push_day() -> SessionModel {
        SessionModel::new("p", "Push")
            .clone_with_added_group(ExerciseGroupModel::single("p", exercise("bench")))
            .clone_with_added_group(
                ExerciseGroupModel::superset("p", vec![exercise("fly"), exercise("dip")]).unwrap(),
            )
            .clone_with_day_of_week(Some(DayOfWeek::Monday))
    }

    #[tokio::test]
    async fn test_round_trip_keeps_group_order() {
        let store = Arc::new(JsonDocumentStore::in_memory());
        let repos = Repositories::new(store.clone());
        let session = push_day();

        repos.sessions.save(&session).await.unwrap();
        assert_eq!(store.count(Collection::ExerciseGroups).await, 2);
        assert_eq!(store.count(Collection::AppliedExercises).await, 3);

        let found = repos.sessions.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(found, session);
        assert_eq!(found.day_of_week(), Some(DayOfWeek::Monday));
    }

    #[tokio::test]
    async fn test_find_by_ids_shares_one_group_fetch() {
        let store = Arc::new(JsonDocumentStore::in_memory());
        let repos = Repositories::new(store);
        let a = push_day();
        let b = SessionModel::new("p", "Pull")
            .clone_with_added_group(ExerciseGroupModel::single("p", exercise("row")));
        repos.sessions.save(&a).await.unwrap();
        repos.sessions.save(&b).await.unwrap();

        let found = repos
            .sessions
            .find_by_ids(&[b.id().to_string(), a.id().to_string()])
            .await
            .unwrap();
        assert_eq!(found, vec![b, a]);
    }

    #[tokio::test]
    async fn test_missing_group_is_dropped_from_session() {
        let store = Arc::new(JsonDocumentStore::in_memory());
        let repos = Repositories::new(store.clone());
        let session = push_day();
        repos.sessions.save(&session).await.unwrap();

        store
            .delete(Collection::ExerciseGroups, session.groups()[0].id())
            .await
            .unwrap();

        let found = repos.sessions.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(found.total_group_count(), 1);
        assert_eq!(found.groups()[0].id(), session.groups()[1].id());
    }

    #[tokio::test]
    async fn test_delete_removes_whole_subtree() {
        let store = Arc::new(JsonDocumentStore::in_memory());
        let repos = Repositories::new(store.clone());
        let session = push_day();
        repos.sessions.save(&session).await.unwrap();

        repos.sessions.delete(session.id()).await.unwrap();
        for collection in Collection::ALL {
            assert_eq!(store.count(collection).await, 0, "{collection} not empty");
        }
        assert!(repos.sessions.find_by_id(session.id()).await.unwrap().is_none());
    }
}
