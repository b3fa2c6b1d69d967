//! Training plan aggregate root.
//!
//! A plan owns its sessions in order, points at the session to perform
//! next, and may belong to a training cycle. All updates go through
//! [`TrainingPlanModel::updated_with`], which applies a change to a private
//! copy, bumps `updated_at`, and re-establishes the session index invariant.

use super::{moved, new_id, next_timestamp, MoveDirection, SessionModel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted record of a training plan; sessions are referenced by id, in order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingPlanData {
    pub id: String,
    pub profile_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub session_ids: Vec<String>,
    pub is_archived: bool,
    pub current_session_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Estimated duration window in minutes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min: u32,
    pub max: u32,
}

/// A training plan: ordered sessions plus scheduling metadata
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingPlanModel {
    id: String,
    profile_id: String,
    name: String,
    description: Option<String>,
    sessions: Vec<SessionModel>,
    is_archived: bool,
    current_session_index: usize,
    notes: Option<String>,
    cycle_id: Option<String>,
    order: Option<u32>,
    last_used: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TrainingPlanModel {
    /// Create a plan without sessions.
    ///
    /// Such a plan is a valid intermediate value but not a finished plan;
    /// see [`crate::TrainingPlanBuilder::build`].
    pub fn new(profile_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            profile_id: profile_id.into(),
            name: name.into(),
            description: None,
            sessions: Vec::new(),
            is_archived: false,
            current_session_index: 0,
            notes: None,
            cycle_id: None,
            order: None,
            last_used: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild from a persisted record plus its already-hydrated sessions
    pub fn hydrate(data: TrainingPlanData, sessions: Vec<SessionModel>) -> Self {
        let mut plan = Self {
            id: data.id,
            profile_id: data.profile_id,
            name: data.name,
            description: data.description,
            sessions,
            is_archived: data.is_archived,
            current_session_index: data.current_session_index,
            notes: data.notes,
            cycle_id: data.cycle_id,
            order: data.order,
            last_used: data.last_used,
            created_at: data.created_at,
            updated_at: data.updated_at,
        };
        plan.normalize_session_index();
        plan
    }

    pub fn to_plain_object(&self) -> TrainingPlanData {
        TrainingPlanData {
            id: self.id.clone(),
            profile_id: self.profile_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            session_ids: self.sessions.iter().map(|s| s.id().to_string()).collect(),
            is_archived: self.is_archived,
            current_session_index: self.current_session_index,
            notes: self.notes.clone(),
            cycle_id: self.cycle_id.clone(),
            order: self.order,
            last_used: self.last_used,
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

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn sessions(&self) -> &[SessionModel] {
        &self.sessions
    }

    pub fn is_archived(&self) -> bool {
        self.is_archived
    }

    pub fn current_session_index(&self) -> usize {
        self.current_session_index
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn cycle_id(&self) -> Option<&str> {
        self.cycle_id.as_deref()
    }

    pub fn order(&self) -> Option<u32> {
        self.order
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.last_used
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn find_session_by_id(&self, session_id: &str) -> Option<&SessionModel> {
        self.sessions.iter().find(|s| s.id() == session_id)
    }

    /// The session to perform next, if the plan has any
    pub fn current_session(&self) -> Option<&SessionModel> {
        self.sessions.get(self.current_session_index)
    }

    pub fn total_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn deload_session_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_deload()).count()
    }

    /// Summed session estimate, widened by 20% either way
    pub fn estimate_total_duration_minutes(&self) -> DurationRange {
        let total_seconds = self
            .sessions
            .iter()
            .map(SessionModel::estimated_duration_seconds)
            .fold(0, u32::saturating_add);
        let minutes = f64::from(total_seconds) / 60.0;

        DurationRange {
            min: (minutes * 0.8).round() as u32,
            max: (minutes * 1.2).round() as u32,
        }
    }

    // ------------------------------------------------------------------
    // Clone-with operations
    // ------------------------------------------------------------------

    pub fn clone_with_name(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.updated_with(|plan| plan.name = name)
    }

    pub fn clone_with_description(&self, description: Option<String>) -> Self {
        self.updated_with(|plan| plan.description = description)
    }

    pub fn clone_with_notes(&self, notes: Option<String>) -> Self {
        self.updated_with(|plan| plan.notes = notes)
    }

    pub fn clone_with_added_session(&self, session: SessionModel) -> Self {
        self.updated_with(|plan| plan.sessions.push(session))
    }

    /// Remove a session; the current index keeps pointing at the same
    /// session where possible and wraps to the start otherwise
    pub fn clone_with_removed_session(&self, session_id: &str) -> Self {
        let Some(index) = self.position_of(session_id) else {
            return self.clone();
        };

        self.updated_with(|plan| {
            plan.sessions.remove(index);
            if index < plan.current_session_index {
                plan.current_session_index -= 1;
            }
        })
    }

    /// Move a session one slot; unknown ids and moves past either end are no-ops
    pub fn clone_with_reordered_session(&self, session_id: &str, direction: MoveDirection) -> Self {
        let reordered = self
            .position_of(session_id)
            .and_then(|index| moved(&self.sessions, index, direction));

        match reordered {
            Some(sessions) => self.updated_with(|plan| plan.sessions = sessions),
            None => self.clone(),
        }
    }

    /// Replace the session with the same id; unknown ids are a no-op
    pub fn clone_with_replaced_session(&self, session: SessionModel) -> Self {
        match self.position_of(session.id()) {
            Some(index) => self.updated_with(|plan| plan.sessions[index] = session),
            None => self.clone(),
        }
    }

    pub fn archive(&self) -> Self {
        self.updated_with(|plan| plan.is_archived = true)
    }

    pub fn unarchive(&self) -> Self {
        self.updated_with(|plan| plan.is_archived = false)
    }

    pub fn assign_to_cycle(&self, cycle_id: impl Into<String>, order: u32) -> Self {
        let cycle_id = cycle_id.into();
        self.updated_with(|plan| {
            plan.cycle_id = Some(cycle_id);
            plan.order = Some(order);
        })
    }

    pub fn remove_from_cycle(&self) -> Self {
        self.updated_with(|plan| {
            plan.cycle_id = None;
            plan.order = None;
        })
    }

    /// Change the position of this plan within its cycle
    pub fn clone_with_cycle_order(&self, order: u32) -> Self {
        self.updated_with(|plan| plan.order = Some(order))
    }

    /// Advance to the next session, wrapping after the last one
    pub fn progress_to_next_session(&self) -> Self {
        self.updated_with(|plan| {
            plan.current_session_index = match plan.sessions.len() {
                0 => 0,
                len => (plan.current_session_index + 1) % len,
            };
        })
    }

    pub fn mark_as_used(&self, at: DateTime<Utc>) -> Self {
        self.updated_with(|plan| plan.last_used = Some(at))
    }

    /// Apply `change` to a copy of this plan and stamp it as a new revision
    fn updated_with(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        change(&mut next);
        next.normalize_session_index();
        next.updated_at = next_timestamp(self.updated_at);
        next
    }

    fn normalize_session_index(&mut self) {
        if self.current_session_index >= self.sessions.len() {
            self.current_session_index = 0;
        }
    }

    fn position_of(&self, session_id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id() == session_id)
    }
}
