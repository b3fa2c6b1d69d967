#![forbid(unsafe_code)]

//! Core domain model and persistence for training plans.
//!
//! This crate provides:
//! - Domain types (set configurations, applied exercises, exercise groups,
//!   sessions, training plans)
//! - A fluent plan builder
//! - Document store abstraction with a JSON snapshot backend
//! - Repositories that save, load and delete whole plan trees atomically

pub mod builder;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod repository;
pub mod store;

// Re-export commonly used types
pub use builder::TrainingPlanBuilder;
pub use config::Config;
pub use error::{Error, Result};
pub use model::*;
pub use repository::{
    AppliedExerciseRepository, ExerciseGroupRepository, Repositories, Repository,
    TrainingPlanRepository, WorkoutSessionRepository,
};
pub use store::{Collection, DocumentStore, JsonDocumentStore, Transaction};
