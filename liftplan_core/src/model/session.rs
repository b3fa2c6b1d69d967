//! A training session: one day of a plan, made of ordered exercise groups.

use super::{
    moved, new_id, next_timestamp, AppliedExerciseModel, DayOfWeek, ExerciseGroupModel,
    MoveDirection,
};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted record of a session; groups are referenced by id, in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    pub group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub execution_count: u32,
    pub is_deload: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<DayOfWeek>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One training day
#[derive(Clone, Debug, PartialEq)]
pub struct SessionModel {
    id: String,
    profile_id: String,
    name: String,
    groups: Vec<ExerciseGroupModel>,
    notes: Option<String>,
    execution_count: u32,
    is_deload: bool,
    day_of_week: Option<DayOfWeek>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionModel {
    /// Create an empty session
    pub fn new(profile_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            profile_id: profile_id.into(),
            name: name.into(),
            groups: Vec::new(),
            notes: None,
            execution_count: 0,
            is_deload: false,
            day_of_week: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from a persisted record plus its already-hydrated groups
    pub fn hydrate(data: SessionData, groups: Vec<ExerciseGroupModel>) -> Self {
        Self {
            id: data.id,
            profile_id: data.profile_id,
            name: data.name,
            groups,
            notes: data.notes,
            execution_count: data.execution_count,
            is_deload: data.is_deload,
            day_of_week: data.day_of_week,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    pub fn to_plain_object(&self) -> SessionData {
        SessionData {
            id: self.id.clone(),
            profile_id: self.profile_id.clone(),
            name: self.name.clone(),
            group_ids: self.groups.iter().map(|g| g.id().to_string()).collect(),
            notes: self.notes.clone(),
            execution_count: self.execution_count,
            is_deload: self.is_deload,
            day_of_week: self.day_of_week,
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

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[ExerciseGroupModel] {
        &self.groups
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn execution_count(&self) -> u32 {
        self.execution_count
    }

    pub fn is_deload(&self) -> bool {
        self.is_deload
    }

    pub fn day_of_week(&self) -> Option<DayOfWeek> {
        self.day_of_week
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn find_group_by_id(&self, group_id: &str) -> Option<&ExerciseGroupModel> {
        self.groups.iter().find(|g| g.id() == group_id)
    }

    /// Locate an exercise and the group holding it.
    ///
    /// Groups are scanned in order; if the id occurs in several groups the
    /// first one wins.
    pub fn find_exercise_by_id(
        &self,
        exercise_id: &str,
    ) -> Option<(&AppliedExerciseModel, &ExerciseGroupModel)> {
        self.groups
            .iter()
            .find_map(|group| group.find_exercise(exercise_id).map(|e| (e, group)))
    }

    pub fn total_exercise_count(&self) -> usize {
        self.groups.iter().map(ExerciseGroupModel::exercise_count).sum()
    }

    pub fn total_group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn estimated_duration_seconds(&self) -> u32 {
        self.groups
            .iter()
            .map(ExerciseGroupModel::estimated_duration_seconds)
            .fold(0, u32::saturating_add)
    }

    pub fn clone_with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.bumped()
        }
    }

    pub fn clone_with_notes(&self, notes: Option<String>) -> Self {
        Self {
            notes,
            ..self.bumped()
        }
    }

    pub fn clone_with_day_of_week(&self, day_of_week: Option<DayOfWeek>) -> Self {
        Self {
            day_of_week,
            ..self.bumped()
        }
    }

    pub fn clone_with_toggled_deload(&self) -> Self {
        Self {
            is_deload: !self.is_deload,
            ..self.bumped()
        }
    }

    pub fn clone_with_incremented_execution_count(&self) -> Self {
        Self {
            execution_count: self.execution_count + 1,
            ..self.bumped()
        }
    }

    pub fn clone_with_added_group(&self, group: ExerciseGroupModel) -> Self {
        let mut groups = self.groups.clone();
        groups.push(group);
        Self {
            groups,
            ..self.bumped()
        }
    }

    pub fn clone_with_removed_group(&self, group_id: &str) -> Self {
        let groups = self
            .groups
            .iter()
            .filter(|g| g.id() != group_id)
            .cloned()
            .collect();
        Self {
            groups,
            ..self.bumped()
        }
    }

    /// Replace the group with the same id, keeping its position
    pub fn clone_with_replaced_group(&self, group: ExerciseGroupModel) -> Self {
        let Some(index) = self.groups.iter().position(|g| g.id() == group.id()) else {
            return self.clone();
        };

        let mut groups = self.groups.clone();
        groups[index] = group;
        Self {
            groups,
            ..self.bumped()
        }
    }

    /// Move a group one slot; unknown ids and moves past either end are no-ops
    pub fn clone_with_reordered_group(&self, group_id: &str, direction: MoveDirection) -> Self {
        let reordered = self
            .groups
            .iter()
            .position(|g| g.id() == group_id)
            .and_then(|index| moved(&self.groups, index, direction));

        match reordered {
            Some(groups) => Self {
                groups,
                ..self.bumped()
            },
            None => self.clone(),
        }
    }

    /// Remove an exercise from the first group containing it.
    ///
    /// A group left without exercises is dropped from the session. Fails if
    /// the removal breaks the group's own invariant (e.g. a superset).
    pub fn clone_with_removed_exercise(&self, exercise_id: &str) -> Result<Self> {
        let Some(index) = self
            .groups
            .iter()
            .position(|g| g.find_exercise(exercise_id).is_some())
        else {
            return Ok(self.clone());
        };

        let mut groups = self.groups.clone();
        let remaining = groups[index].clone_with_removed_exercise(exercise_id)?;
        if remaining.exercise_count() == 0 {
            groups.remove(index);
        } else {
            groups[index] = remaining;
        }

        Ok(Self {
            groups,
            ..self.bumped()
        })
    }

    /// Deep copy under a new name, with fresh ids at every level
    pub fn clone_as_copy(&self, new_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: new_name.into(),
            groups: self
                .groups
                .iter()
                .map(ExerciseGroupModel::clone_as_copy)
                .collect(),
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
