//! Document store abstraction.
//!
//! Repositories talk to storage only through [`DocumentStore`]: keyed
//! `get`/`bulk_get`, field-equality `query`, and atomic writes staged in a
//! [`Transaction`]. A `Transaction` is applied all-or-nothing by
//! [`DocumentStore::commit`]; dropping it without committing discards it.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod json_store;

pub use json_store::JsonDocumentStore;

/// Named document collections, one per aggregate level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    AppliedExercises,
    ExerciseGroups,
    Sessions,
    TrainingPlans,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::AppliedExercises,
        Collection::ExerciseGroups,
        Collection::Sessions,
        Collection::TrainingPlans,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::AppliedExercises => "applied_exercises",
            Collection::ExerciseGroups => "exercise_groups",
            Collection::Sessions => "sessions",
            Collection::TrainingPlans => "training_plans",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single staged write
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Put {
        collection: Collection,
        id: String,
        document: Value,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

/// Writes staged for one atomic commit.
///
/// Holding a `&mut Transaction` is what marks code as running inside a
/// write; nested repository calls receive it instead of opening their own.
#[derive(Debug, Default)]
#[must_use = "a transaction does nothing until committed"]
pub struct Transaction {
    ops: Vec<WriteOp>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an upsert
    pub fn put(&mut self, collection: Collection, id: impl Into<String>, document: Value) {
        self.ops.push(WriteOp::Put {
            collection,
            id: id.into(),
            document,
        });
    }

    /// Stage a delete; deleting an absent id is a no-op at commit
    pub fn delete(&mut self, collection: Collection, id: impl Into<String>) {
        self.ops.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Generic document collection storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Fetch many documents; the result is aligned with `ids`
    async fn bulk_get(&self, collection: Collection, ids: &[String]) -> Result<Vec<Option<Value>>>;

    /// All documents whose top-level `field` equals `value`
    async fn query(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Value>>;

    /// Start staging a write
    fn begin(&self) -> Transaction {
        Transaction::new()
    }

    /// Apply every staged operation as one unit
    async fn commit(&self, transaction: Transaction) -> Result<()>;

    /// Upsert a single document in its own transaction
    async fn put(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        let mut tx = self.begin();
        tx.put(collection, id, document);
        self.commit(tx).await
    }

    /// Delete a single document in its own transaction
    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut tx = self.begin();
        tx.delete(collection, id);
        self.commit(tx).await
    }
}

// Compile-time assertion: DocumentStore must be usable as `dyn DocumentStore`.
const _: () = {
    fn _assert_object_safe(_: &dyn DocumentStore) {}
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_stages_in_order() {
        let mut tx = Transaction::new();
        assert!(tx.is_empty());

        tx.put(Collection::Sessions, "s1", json!({ "id": "s1" }));
        tx.delete(Collection::ExerciseGroups, "g1");

        assert_eq!(tx.len(), 2);
        assert!(matches!(&tx.ops()[0], WriteOp::Put { id, .. } if id == "s1"));
        assert!(matches!(
            &tx.ops()[1],
            WriteOp::Delete { collection: Collection::ExerciseGroups, .. }
        ));
    }

    #[test]
    fn test_collection_names_are_distinct() {
        let mut names: Vec<_> = Collection::ALL.iter().map(|c| c.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Collection::ALL.len());
    }
}
