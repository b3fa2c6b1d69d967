//! Set configurations: how the sets of one applied exercise are structured.
//!
//! The persisted form is a record tagged by `type`. Older records may hold
//! the whole configuration as a JSON-encoded string, so every entry point
//! first parses strings, then dispatches on the tag.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive repetition range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
    pub min: u32,
    pub max: u32,
}

impl RepRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Single fixed rep target
    pub fn exact(reps: u32) -> Self {
        Self::new(reps, reps)
    }
}

/// Straight sets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardSets {
    pub sets: u32,
    pub reps: RepRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<f32>,
}

/// Working sets each followed by weight drops
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropSets {
    pub sets: u32,
    pub reps: RepRange,
    pub drops: u32,
    pub drop_percentage: f64,
}

/// One activation set followed by short mini-sets
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MyoRepsSets {
    pub activation_reps: RepRange,
    pub mini_sets: u32,
    pub mini_set_reps: u32,
}

/// Sets moving from `start_reps` to `end_reps` while load changes each set
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PyramidalSets {
    pub sets: u32,
    pub start_reps: u32,
    pub end_reps: u32,
    pub weight_step_percentage: f64,
}

/// Sets extended by short intra-set pauses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestPauseSets {
    pub sets: u32,
    pub reps: RepRange,
    pub pauses: u32,
    pub pause_seconds: u32,
}

/// Maximum adaptive volume: sets until a total rep target is reached
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MavSets {
    pub sets: u32,
    pub reps: RepRange,
    pub target_total_reps: u32,
}

/// Set structure of an applied exercise
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", try_from = "Value")]
pub enum SetConfiguration {
    Standard(StandardSets),
    Drop(DropSets),
    MyoReps(MyoRepsSets),
    Pyramidal(PyramidalSets),
    RestPause(RestPauseSets),
    Mav(MavSets),
}

/// Accepted input forms of the set configuration factory
#[derive(Clone, Debug, PartialEq)]
pub enum SetConfigurationInput {
    /// Plain tagged record
    Record(Value),
    /// JSON-encoded tagged record
    Encoded(String),
}

impl From<Value> for SetConfigurationInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(encoded) => SetConfigurationInput::Encoded(encoded),
            record => SetConfigurationInput::Record(record),
        }
    }
}

impl From<&str> for SetConfigurationInput {
    fn from(encoded: &str) -> Self {
        SetConfigurationInput::Encoded(encoded.to_string())
    }
}

impl From<String> for SetConfigurationInput {
    fn from(encoded: String) -> Self {
        SetConfigurationInput::Encoded(encoded)
    }
}

impl SetConfiguration {
    /// Build a configuration from a tagged record or a JSON-encoded one
    pub fn create(input: impl Into<SetConfigurationInput>) -> Result<Self> {
        let record = match input.into() {
            SetConfigurationInput::Record(record) => record,
            SetConfigurationInput::Encoded(encoded) => Self::parse_encoded(&encoded)?,
        };
        Self::from_record(record)
    }

    /// First step of the factory: decode a JSON string into a record
    pub fn parse_encoded(encoded: &str) -> Result<Value> {
        serde_json::from_str(encoded).map_err(|e| Error::InvalidSetConfigurationJson {
            input: encoded.to_string(),
            reason: e.to_string(),
        })
    }

    /// Second step of the factory: dispatch a record on its `type` tag
    pub fn from_record(record: Value) -> Result<Self> {
        let set_type = match record.get("type") {
            Some(Value::String(tag)) => tag.clone(),
            Some(other) => return Err(Error::UnknownSetConfigurationType(other.to_string())),
            None => {
                return Err(Error::InvalidSetConfiguration {
                    set_type: "untyped".into(),
                    reason: "missing `type` discriminant".into(),
                })
            }
        };

        let configuration = match set_type.as_str() {
            "standard" => decode(&set_type, record).map(SetConfiguration::Standard),
            "drop" => decode(&set_type, record).map(SetConfiguration::Drop),
            "myo_reps" => decode(&set_type, record).map(SetConfiguration::MyoReps),
            "pyramidal" => decode(&set_type, record).map(SetConfiguration::Pyramidal),
            "rest_pause" => decode(&set_type, record).map(SetConfiguration::RestPause),
            "mav" => decode(&set_type, record).map(SetConfiguration::Mav),
            _ => Err(Error::UnknownSetConfigurationType(set_type.clone())),
        }?;

        tracing::trace!("Built {} set configuration", set_type);
        Ok(configuration)
    }

    /// The `type` discriminant of this configuration
    pub fn set_type(&self) -> &'static str {
        match self {
            SetConfiguration::Standard(_) => "standard",
            SetConfiguration::Drop(_) => "drop",
            SetConfiguration::MyoReps(_) => "myo_reps",
            SetConfiguration::Pyramidal(_) => "pyramidal",
            SetConfiguration::RestPause(_) => "rest_pause",
            SetConfiguration::Mav(_) => "mav",
        }
    }

    /// Number of sets performed, counting drops, mini-sets and pauses
    pub fn total_sets(&self) -> u32 {
        match self {
            SetConfiguration::Standard(c) => c.sets,
            SetConfiguration::Drop(c) => c.sets.saturating_mul(c.drops.saturating_add(1)),
            SetConfiguration::MyoReps(c) => c.mini_sets.saturating_add(1),
            SetConfiguration::Pyramidal(c) => c.sets,
            SetConfiguration::RestPause(c) => c.sets.saturating_mul(c.pauses.saturating_add(1)),
            SetConfiguration::Mav(c) => c.sets,
        }
    }

    /// Tagged record form, accepted back by [`SetConfiguration::create`]
    pub fn to_plain_object(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Convenience constructor for straight sets
    pub fn standard(sets: u32, reps: RepRange) -> Self {
        SetConfiguration::Standard(StandardSets {
            sets,
            reps,
            rpe: None,
        })
    }
}

impl TryFrom<Value> for SetConfiguration {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::create(value)
    }
}

fn decode<T: serde::de::DeserializeOwned>(set_type: &str, record: Value) -> Result<T> {
    serde_json::from_value(record).map_err(|e| Error::InvalidSetConfiguration {
        set_type: set_type.to_string(),
        reason: e.to_string(),
    })
}
