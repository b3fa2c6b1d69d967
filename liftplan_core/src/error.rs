//! Error types for the liftplan_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftplan_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ------------------------------------------------------------------
    // Invariant violations (raised while constructing domain values)
    // ------------------------------------------------------------------
    /// A superset group must hold exactly two applied exercises
    #[error("Superset group requires exactly 2 exercises, got {count}")]
    SupersetRequiresTwoExercises { count: usize },

    /// A circuit group must hold at least two applied exercises
    #[error("Circuit group requires at least 2 exercises, got {count}")]
    CircuitRequiresMultipleExercises { count: usize },

    /// Timed groups (AMRAP, EMOM) need a positive duration
    #[error("{group_type} group requires a positive duration in minutes")]
    DurationRequired { group_type: String },

    /// A finished training plan needs at least one session
    #[error("Training plan must have at least one session")]
    TrainingPlanMustHaveSessions,

    // ------------------------------------------------------------------
    // Conflicts
    // ------------------------------------------------------------------
    /// Another plan of the same profile already uses this name
    #[error("A training plan named '{name}' already exists for profile {profile_id}")]
    TrainingPlanNameConflict { name: String, profile_id: String },

    // ------------------------------------------------------------------
    // Parse errors
    // ------------------------------------------------------------------
    /// A string-encoded set configuration was not valid JSON
    #[error("Invalid set configuration JSON '{input}': {reason}")]
    InvalidSetConfigurationJson { input: String, reason: String },

    /// The `type` discriminant of a set configuration is not recognised
    #[error("Unknown set configuration type: {0}")]
    UnknownSetConfigurationType(String),

    /// The record carried a known type but its fields did not match
    #[error("Invalid {set_type} set configuration: {reason}")]
    InvalidSetConfiguration { set_type: String, reason: String },

    /// The `type` discriminant of an exercise group is not recognised
    #[error("Unknown exercise group type: {0}")]
    UnknownExerciseGroupType(String),

    // ------------------------------------------------------------------
    // Ambient
    // ------------------------------------------------------------------
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store failure
    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// True for errors raised because a domain invariant would be broken
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::SupersetRequiresTwoExercises { .. }
                | Error::CircuitRequiresMultipleExercises { .. }
                | Error::DurationRequired { .. }
                | Error::TrainingPlanMustHaveSessions
        )
    }

    /// True for uniqueness conflicts detected before a write
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::TrainingPlanNameConflict { .. })
    }

    /// True for malformed or unrecognised input to a polymorphic factory
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSetConfigurationJson { .. }
                | Error::UnknownSetConfigurationType(_)
                | Error::InvalidSetConfiguration { .. }
                | Error::UnknownExerciseGroupType(_)
        )
    }
}
