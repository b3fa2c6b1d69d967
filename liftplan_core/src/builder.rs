//! Fluent assembly of training plans.
//!
//! The builder wraps a plan under construction and a pointer to the
//! "current" session that exercise operations target. Intermediate states
//! may have no sessions; only [`TrainingPlanBuilder::build`] insists on at
//! least one.

use crate::model::{AppliedExerciseModel, ExerciseGroupModel, SessionModel, TrainingPlanModel};
use crate::{Error, Result};

/// Stateful builder for [`TrainingPlanModel`]
#[derive(Clone, Debug)]
pub struct TrainingPlanBuilder {
    plan: TrainingPlanModel,
    current_session_id: Option<String>,
}

impl TrainingPlanBuilder {
    /// Start a new, empty plan
    pub fn new(profile_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_plan(TrainingPlanModel::new(profile_id, name))
    }

    /// Continue editing an existing plan; its first session becomes current
    pub fn from_plan(plan: TrainingPlanModel) -> Self {
        let current_session_id = plan.sessions().first().map(|s| s.id().to_string());
        Self {
            plan,
            current_session_id,
        }
    }

    /// The plan as assembled so far
    pub fn plan(&self) -> &TrainingPlanModel {
        &self.plan
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    /// Append an empty session and make it current
    pub fn add_session(&mut self, name: impl Into<String>) -> &mut Self {
        let session = SessionModel::new(self.plan.profile_id(), name);
        self.current_session_id = Some(session.id().to_string());
        self.plan = self.plan.clone_with_added_session(session);
        self
    }

    /// Remove a session; if it was current, fall back to the first remaining one
    pub fn remove_session(&mut self, session_id: &str) -> &mut Self {
        self.plan = self.plan.clone_with_removed_session(session_id);
        if self.current_session_id.as_deref() == Some(session_id) {
            self.current_session_id = self.plan.sessions().first().map(|s| s.id().to_string());
        }
        self
    }

    /// Make a session current; unknown ids leave the pointer unchanged
    pub fn select_session(&mut self, session_id: &str) -> &mut Self {
        if self.plan.find_session_by_id(session_id).is_some() {
            self.current_session_id = Some(session_id.to_string());
        }
        self
    }

    /// Rename the current session, if there is one
    pub fn update_current_session_details(&mut self, name: impl Into<String>) -> &mut Self {
        if let Some(session) = self.current_session() {
            let renamed = session.clone_with_name(name);
            self.plan = self.plan.clone_with_replaced_session(renamed);
        }
        self
    }

    /// Add a `single` group holding `exercise` to the current session
    pub fn add_exercise_to_current_session(&mut self, exercise: AppliedExerciseModel) -> &mut Self {
        if let Some(session) = self.current_session() {
            let group = ExerciseGroupModel::single(self.plan.profile_id(), exercise);
            let updated = session.clone_with_added_group(group);
            self.plan = self.plan.clone_with_replaced_session(updated);
        }
        self
    }

    /// Add a `superset` group to the current session.
    ///
    /// The exercise count is validated by the group itself; anything other
    /// than two exercises fails with [`Error::SupersetRequiresTwoExercises`].
    pub fn add_superset_to_current_session(
        &mut self,
        exercises: Vec<AppliedExerciseModel>,
    ) -> Result<&mut Self> {
        if let Some(session) = self.current_session() {
            let group = ExerciseGroupModel::superset(self.plan.profile_id(), exercises)?;
            let updated = session.clone_with_added_group(group);
            self.plan = self.plan.clone_with_replaced_session(updated);
        }
        Ok(self)
    }

    /// Finish the plan; fails if it has no sessions
    pub fn build(self) -> Result<TrainingPlanModel> {
        if self.plan.sessions().is_empty() {
            return Err(Error::TrainingPlanMustHaveSessions);
        }
        tracing::debug!(
            "Built training plan '{}' with {} sessions",
            self.plan.name(),
            self.plan.total_sessions()
        );
        Ok(self.plan)
    }

    // Resolves the pointer against the plan; a stale id yields None.
    fn current_session(&self) -> Option<&SessionModel> {
        self.current_session_id
            .as_deref()
            .and_then(|id| self.plan.find_session_by_id(id))
    }
}
