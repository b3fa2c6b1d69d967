//! Exercise groups: how applied exercises are organised within a session.
//!
//! A group is a closed set of kinds. Each kind's invariant is checked by
//! every function that yields a group value, whether freshly constructed,
//! hydrated from storage, or produced by a clone-with operation:
//! - `superset` holds exactly two exercises
//! - `circuit` holds at least two exercises
//! - `emom` and `amrap` carry a positive `duration_minutes`

use super::{moved, new_id, next_timestamp, AppliedExerciseModel, MoveDirection, SECONDS_PER_SET};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of exercise group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseGroupType {
    Single,
    Superset,
    Circuit,
    Emom,
    Amrap,
    Warmup,
    Stretching,
}

impl ExerciseGroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Superset => "superset",
            Self::Circuit => "circuit",
            Self::Emom => "emom",
            Self::Amrap => "amrap",
            Self::Warmup => "warmup",
            Self::Stretching => "stretching",
        }
    }

    /// Check this kind's invariant against a prospective group shape
    fn validate(&self, exercise_count: usize, duration_minutes: Option<i32>) -> Result<()> {
        match self {
            Self::Superset if exercise_count != 2 => Err(Error::SupersetRequiresTwoExercises {
                count: exercise_count,
            }),
            Self::Circuit if exercise_count < 2 => Err(Error::CircuitRequiresMultipleExercises {
                count: exercise_count,
            }),
            Self::Emom | Self::Amrap if !matches!(duration_minutes, Some(d) if d > 0) => {
                Err(Error::DurationRequired {
                    group_type: self.as_str().to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ExerciseGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseGroupType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "superset" => Ok(Self::Superset),
            "circuit" => Ok(Self::Circuit),
            "emom" => Ok(Self::Emom),
            "amrap" => Ok(Self::Amrap),
            "warmup" => Ok(Self::Warmup),
            "stretching" => Ok(Self::Stretching),
            other => Err(Error::UnknownExerciseGroupType(other.to_owned())),
        }
    }
}

/// Optional shape parameters of a group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GroupOptions {
    pub rest_time_seconds: Option<u32>,
    pub duration_minutes: Option<i32>,
    pub rounds: Option<u32>,
}

/// Persisted record of an exercise group.
///
/// Exercises are referenced by id, in execution order. `type` is kept as a
/// raw string so that unknown kinds surface as
/// [`Error::UnknownExerciseGroupType`] during hydration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseGroupData {
    pub id: String,
    pub profile_id: String,
    #[serde(rename = "type")]
    pub group_type: String,
    pub applied_exercise_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_time_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ordered collection of applied exercises performed as one unit
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseGroupModel {
    id: String,
    profile_id: String,
    group_type: ExerciseGroupType,
    applied_exercises: Vec<AppliedExerciseModel>,
    rest_time_seconds: Option<u32>,
    duration_minutes: Option<i32>,
    rounds: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExerciseGroupModel {
    /// Create a group of the given kind, validating its invariant
    pub fn new(
        profile_id: impl Into<String>,
        group_type: ExerciseGroupType,
        applied_exercises: Vec<AppliedExerciseModel>,
        options: GroupOptions,
    ) -> Result<Self> {
        group_type.validate(applied_exercises.len(), options.duration_minutes)?;

        let now = Utc::now();
        Ok(Self {
            id: new_id(),
            profile_id: profile_id.into(),
            group_type,
            applied_exercises,
            rest_time_seconds: options.rest_time_seconds,
            duration_minutes: options.duration_minutes,
            rounds: options.rounds,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn single(profile_id: impl Into<String>, exercise: AppliedExerciseModel) -> Self {
        Self::unchecked(profile_id.into(), ExerciseGroupType::Single, vec![exercise])
    }

    pub fn superset(
        profile_id: impl Into<String>,
        exercises: Vec<AppliedExerciseModel>,
    ) -> Result<Self> {
        Self::new(profile_id, ExerciseGroupType::Superset, exercises, GroupOptions::default())
    }

    pub fn circuit(
        profile_id: impl Into<String>,
        exercises: Vec<AppliedExerciseModel>,
        rounds: Option<u32>,
    ) -> Result<Self> {
        let options = GroupOptions {
            rounds,
            ..GroupOptions::default()
        };
        Self::new(profile_id, ExerciseGroupType::Circuit, exercises, options)
    }

    pub fn emom(
        profile_id: impl Into<String>,
        exercises: Vec<AppliedExerciseModel>,
        duration_minutes: i32,
    ) -> Result<Self> {
        let options = GroupOptions {
            duration_minutes: Some(duration_minutes),
            ..GroupOptions::default()
        };
        Self::new(profile_id, ExerciseGroupType::Emom, exercises, options)
    }

    pub fn amrap(
        profile_id: impl Into<String>,
        exercises: Vec<AppliedExerciseModel>,
        duration_minutes: i32,
    ) -> Result<Self> {
        let options = GroupOptions {
            duration_minutes: Some(duration_minutes),
            ..GroupOptions::default()
        };
        Self::new(profile_id, ExerciseGroupType::Amrap, exercises, options)
    }

    pub fn warmup(profile_id: impl Into<String>, exercises: Vec<AppliedExerciseModel>) -> Self {
        Self::unchecked(profile_id.into(), ExerciseGroupType::Warmup, exercises)
    }

    pub fn stretching(profile_id: impl Into<String>, exercises: Vec<AppliedExerciseModel>) -> Self {
        Self::unchecked(profile_id.into(), ExerciseGroupType::Stretching, exercises)
    }

    // Only for kinds without an invariant.
    fn unchecked(
        profile_id: String,
        group_type: ExerciseGroupType,
        applied_exercises: Vec<AppliedExerciseModel>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            profile_id,
            group_type,
            applied_exercises,
            rest_time_seconds: None,
            duration_minutes: None,
            rounds: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from a persisted record plus its already-hydrated exercises.
    ///
    /// Dispatches on the record's `type` and enforces that kind's invariant,
    /// exactly like fresh construction.
    pub fn hydrate(
        data: ExerciseGroupData,
        applied_exercises: Vec<AppliedExerciseModel>,
    ) -> Result<Self> {
        let group_type: ExerciseGroupType = data.group_type.parse()?;
        group_type.validate(applied_exercises.len(), data.duration_minutes)?;

        Ok(Self {
            id: data.id,
            profile_id: data.profile_id,
            group_type,
            applied_exercises,
            rest_time_seconds: data.rest_time_seconds,
            duration_minutes: data.duration_minutes,
            rounds: data.rounds,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    pub fn to_plain_object(&self) -> ExerciseGroupData {
        ExerciseGroupData {
            id: self.id.clone(),
            profile_id: self.profile_id.clone(),
            group_type: self.group_type.as_str().to_string(),
            applied_exercise_ids: self
                .applied_exercises
                .iter()
                .map(|e| e.id().to_string())
                .collect(),
            rest_time_seconds: self.rest_time_seconds,
            duration_minutes: self.duration_minutes,
            rounds: self.rounds,
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

    pub fn group_type(&self) -> ExerciseGroupType {
        self.group_type
    }

    pub fn applied_exercises(&self) -> &[AppliedExerciseModel] {
        &self.applied_exercises
    }

    pub fn rest_time_seconds(&self) -> Option<u32> {
        self.rest_time_seconds
    }

    pub fn duration_minutes(&self) -> Option<i32> {
        self.duration_minutes
    }

    pub fn rounds(&self) -> Option<u32> {
        self.rounds
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn exercise_count(&self) -> usize {
        self.applied_exercises.len()
    }

    pub fn has_custom_rest_time(&self) -> bool {
        self.rest_time_seconds.is_some()
    }

    pub fn has_duration(&self) -> bool {
        matches!(self.duration_minutes, Some(d) if d > 0)
    }

    pub fn has_rounds(&self) -> bool {
        matches!(self.rounds, Some(r) if r > 0)
    }

    pub fn find_exercise(&self, exercise_id: &str) -> Option<&AppliedExerciseModel> {
        self.applied_exercises.iter().find(|e| e.id() == exercise_id)
    }

    /// Rough wall-clock estimate for performing the whole group.
    ///
    /// Timed groups last their duration plus the group rest. Other groups
    /// sum, per exercise, `total_sets * (SECONDS_PER_SET + rest)` where rest
    /// is the group's custom rest time if set, else the exercise's own.
    pub fn estimated_duration_seconds(&self) -> u32 {
        if let Some(minutes) = self.duration_minutes.filter(|d| *d > 0) {
            return minutes
                .unsigned_abs()
                .saturating_mul(60)
                .saturating_add(self.rest_time_seconds.unwrap_or(0));
        }

        self.applied_exercises
            .iter()
            .map(|exercise| {
                let rest = self
                    .rest_time_seconds
                    .unwrap_or_else(|| exercise.rest_time_seconds());
                exercise
                    .total_sets()
                    .saturating_mul(SECONDS_PER_SET.saturating_add(rest))
            })
            .fold(0, u32::saturating_add)
    }

    /// Append an exercise at the end of the execution order
    pub fn clone_with_added_exercise(&self, exercise: AppliedExerciseModel) -> Result<Self> {
        let mut applied_exercises = self.applied_exercises.clone();
        applied_exercises.push(exercise);
        self.revised(applied_exercises)
    }

    /// Drop an exercise by id; unknown ids leave the group as is
    pub fn clone_with_removed_exercise(&self, exercise_id: &str) -> Result<Self> {
        if self.find_exercise(exercise_id).is_none() {
            return Ok(self.clone());
        }

        let applied_exercises = self
            .applied_exercises
            .iter()
            .filter(|e| e.id() != exercise_id)
            .cloned()
            .collect();
        self.revised(applied_exercises)
    }

    /// Replace the exercise with the same id, keeping its position
    pub fn clone_with_replaced_exercise(&self, exercise: AppliedExerciseModel) -> Self {
        let Some(index) = self.position_of(exercise.id()) else {
            return self.clone();
        };

        let mut applied_exercises = self.applied_exercises.clone();
        applied_exercises[index] = exercise;
        Self {
            applied_exercises,
            ..self.bumped()
        }
    }

    /// Move an exercise one slot; unknown ids and moves past either end are no-ops
    pub fn clone_with_reordered_exercise(&self, exercise_id: &str, direction: MoveDirection) -> Self {
        let reordered = self
            .position_of(exercise_id)
            .and_then(|index| moved(&self.applied_exercises, index, direction));

        match reordered {
            Some(applied_exercises) => Self {
                applied_exercises,
                ..self.bumped()
            },
            None => self.clone(),
        }
    }

    pub fn clone_with_new_rest_time(&self, rest_time_seconds: Option<u32>) -> Self {
        Self {
            rest_time_seconds,
            ..self.bumped()
        }
    }

    pub fn clone_with_duration(&self, duration_minutes: Option<i32>) -> Result<Self> {
        self.group_type
            .validate(self.applied_exercises.len(), duration_minutes)?;
        Ok(Self {
            duration_minutes,
            ..self.bumped()
        })
    }

    pub fn clone_with_rounds(&self, rounds: Option<u32>) -> Self {
        Self { rounds, ..self.bumped() }
    }

    /// Deep copy with fresh ids for the group and every exercise in it
    pub fn clone_as_copy(&self) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            applied_exercises: self
                .applied_exercises
                .iter()
                .map(AppliedExerciseModel::clone_as_copy)
                .collect(),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    fn position_of(&self, exercise_id: &str) -> Option<usize> {
        self.applied_exercises.iter().position(|e| e.id() == exercise_id)
    }

    fn revised(&self, applied_exercises: Vec<AppliedExerciseModel>) -> Result<Self> {
        self.group_type
            .validate(applied_exercises.len(), self.duration_minutes)?;
        Ok(Self {
            applied_exercises,
            ..self.bumped()
        })
    }

    fn bumped(&self) -> Self {
        Self {
            updated_at: next_timestamp(self.updated_at),
            ..self.clone()
        }
    }
}
