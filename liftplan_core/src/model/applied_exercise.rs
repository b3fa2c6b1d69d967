//! One exercise instance inside an exercise group.

use super::{new_id, next_timestamp, SetConfiguration};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rest between sets when none is given explicitly
pub const DEFAULT_REST_TIME_SECONDS: u32 = 90;

/// Persisted record of an applied exercise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedExerciseData {
    pub id: String,
    pub profile_id: String,
    pub exercise_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub set_configuration: SetConfiguration,
    pub rest_time_seconds: u32,
    pub execution_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An exercise as prescribed within a group, with its set structure
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedExerciseModel {
    id: String,
    profile_id: String,
    exercise_id: String,
    template_id: Option<String>,
    set_configuration: SetConfiguration,
    rest_time_seconds: u32,
    execution_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppliedExerciseModel {
    /// Create a new applied exercise with a fresh id
    pub fn new(
        profile_id: impl Into<String>,
        exercise_id: impl Into<String>,
        set_configuration: SetConfiguration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            profile_id: profile_id.into(),
            exercise_id: exercise_id.into(),
            template_id: None,
            set_configuration,
            rest_time_seconds: DEFAULT_REST_TIME_SECONDS,
            execution_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the template this exercise was instantiated from (construction only)
    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    /// Set the rest time (construction only)
    pub fn with_rest_time(mut self, rest_time_seconds: u32) -> Self {
        self.rest_time_seconds = rest_time_seconds;
        self
    }

    /// Rebuild from a persisted record
    pub fn hydrate(data: AppliedExerciseData) -> Self {
        Self {
            id: data.id,
            profile_id: data.profile_id,
            exercise_id: data.exercise_id,
            template_id: data.template_id,
            set_configuration: data.set_configuration,
            rest_time_seconds: data.rest_time_seconds,
            execution_count: data.execution_count,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    pub fn to_plain_object(&self) -> AppliedExerciseData {
        AppliedExerciseData {
            id: self.id.clone(),
            profile_id: self.profile_id.clone(),
            exercise_id: self.exercise_id.clone(),
            template_id: self.template_id.clone(),
            set_configuration: self.set_configuration.clone(),
            rest_time_seconds: self.rest_time_seconds,
            execution_count: self.execution_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn set_configuration(&self) -> &SetConfiguration {
        &self.set_configuration
    }

    pub fn rest_time_seconds(&self) -> u32 {
        self.rest_time_seconds
    }

    pub fn execution_count(&self) -> u32 {
        self.execution_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Total sets, as defined by the set configuration
    pub fn total_sets(&self) -> u32 {
        self.set_configuration.total_sets()
    }

    pub fn clone_with_set_configuration(&self, set_configuration: SetConfiguration) -> Self {
        Self {
            set_configuration,
            ..self.bumped()
        }
    }

    pub fn clone_with_rest_time(&self, rest_time_seconds: u32) -> Self {
        Self {
            rest_time_seconds,
            ..self.bumped()
        }
    }

    pub fn clone_with_incremented_execution_count(&self) -> Self {
        Self {
            execution_count: self.execution_count + 1,
            ..self.bumped()
        }
    }

    /// Deep copy under a fresh id, for placing the exercise in a new context
    pub fn clone_as_copy(&self) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    fn bumped(&self) -> Self {
        Self {
            updated_at: next_timestamp(self.updated_at),
            ..self.clone()
        }
    }
}
