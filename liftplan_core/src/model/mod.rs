//! Domain model for training plans.
//!
//! The aggregate is a strict ownership tree:
//! - [`TrainingPlanModel`] owns ordered [`SessionModel`]s
//! - a session owns ordered [`ExerciseGroupModel`]s
//! - a group owns ordered [`AppliedExerciseModel`]s
//! - an applied exercise owns one [`SetConfiguration`]
//!
//! Every entity is an immutable value. "Clone-with" operations take `&self`
//! and return a new value whose `updated_at` is strictly later than the
//! original's.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod applied_exercise;
pub mod exercise_group;
pub mod session;
pub mod set_configuration;
pub mod training_plan;

pub use applied_exercise::{AppliedExerciseData, AppliedExerciseModel};
pub use exercise_group::{ExerciseGroupData, ExerciseGroupModel, ExerciseGroupType, GroupOptions};
pub use session::{SessionData, SessionModel};
pub use set_configuration::{RepRange, SetConfiguration, SetConfigurationInput};
pub use training_plan::{DurationRange, TrainingPlanData, TrainingPlanModel};

/// Working time assumed for a single set when estimating durations
pub const SECONDS_PER_SET: u32 = 45;

/// Generate a fresh opaque entity id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Timestamp for a new revision of an entity last updated at `previous`.
///
/// Never returns a value <= `previous`, even when called repeatedly within
/// one clock tick.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::milliseconds(1);
    now.max(floor)
}

/// Identity shared by every persisted entity
pub trait Entity {
    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_entity {
    ($($model:ty),+ $(,)?) => {
        $(impl Entity for $model {
            fn id(&self) -> &str {
                <$model>::id(self)
            }

            fn created_at(&self) -> DateTime<Utc> {
                <$model>::created_at(self)
            }
        })+
    };
}

impl_entity!(
    AppliedExerciseModel,
    ExerciseGroupModel,
    SessionModel,
    TrainingPlanModel,
);

/// Direction for reorder operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Day of the week a session is scheduled on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Move the item at `index` one slot in `direction`.
///
/// Returns `None` when the move would leave the list bounds.
pub(crate) fn moved<T: Clone>(items: &[T], index: usize, direction: MoveDirection) -> Option<Vec<T>> {
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1)?,
        MoveDirection::Down => index + 1,
    };
    if target >= items.len() {
        return None;
    }

    let mut reordered = items.to_vec();
    reordered.swap(index, target);
    Some(reordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_timestamp_is_strictly_later() {
        let future = Utc::now() + Duration::seconds(30);
        let next = next_timestamp(future);
        assert!(next > future);
        assert_eq!(next, future + Duration::milliseconds(1));
    }

    #[test]
    fn test_next_timestamp_uses_clock_when_ahead() {
        let past = Utc::now() - Duration::days(1);
        let next = next_timestamp(past);
        assert!(next > past + Duration::hours(23));
    }

    #[test]
    fn test_moved_bounds() {
        let items = vec![1, 2, 3];
        assert_eq!(moved(&items, 0, MoveDirection::Up), None);
        assert_eq!(moved(&items, 2, MoveDirection::Down), None);
        assert_eq!(moved(&items, 1, MoveDirection::Up), Some(vec![2, 1, 3]));
        assert_eq!(moved(&items, 1, MoveDirection::Down), Some(vec![1, 3, 2]));
    }

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
