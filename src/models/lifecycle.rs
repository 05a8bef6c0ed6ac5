//! Lifecycle classification layered on top of the SM-2 output.
//!
//! Transitions: `New → {Review, Relearning}`, then `Review ⇄ Relearning` on
//! every later review. There is no terminal state.

use super::error::Result;
use super::sm2::{self, ScheduleOutcome};
use super::{LifecycleState, Quality, SchedulingState};
use chrono::{DateTime, Utc};

/// Failed reviews send a card to relearning, successful ones to review.
pub fn derive_state(quality: Quality, _outcome: &ScheduleOutcome) -> LifecycleState {
    if quality.is_success() {
        LifecycleState::Review
    } else {
        LifecycleState::Relearning
    }
}

/// Decides the lifecycle state that follows a review.
///
/// A learning-steps sub-schedule (short intra-day steps before a card
/// graduates, producing `LifecycleState::Learning`) would be a second
/// implementation of this trait.
pub trait LifecyclePolicy {
    fn next_state(
        &self,
        quality: Quality,
        previous: &SchedulingState,
        outcome: &ScheduleOutcome,
    ) -> LifecycleState;
}

/// Cards graduate straight to `Review` on their first successful review.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateGraduation;

impl LifecyclePolicy for ImmediateGraduation {
    fn next_state(
        &self,
        quality: Quality,
        _previous: &SchedulingState,
        outcome: &ScheduleOutcome,
    ) -> LifecycleState {
        derive_state(quality, outcome)
    }
}

/// Runs the scheduler and the lifecycle policy, producing the complete
/// replacement state for a card.
pub fn apply_review<P: LifecyclePolicy + ?Sized>(
    quality: Quality,
    previous: &SchedulingState,
    now: DateTime<Utc>,
    policy: &P,
) -> Result<SchedulingState> {
    let outcome = sm2::schedule(quality, previous, now)?;
    let lifecycle = policy.next_state(quality, previous, &outcome);

    Ok(SchedulingState {
        interval_days: outcome.interval_days,
        ease_factor: outcome.ease_factor,
        repetitions: outcome.repetitions,
        due_at: outcome.due_at,
        lifecycle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn test_new_card_good() {
        let next = apply_review(q(4), &SchedulingState::new_card(now()), now(), &ImmediateGraduation)
            .unwrap();
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetitions, 1);
        assert!((next.ease_factor - 2.5).abs() < 1e-9);
        assert_eq!(next.due_at, now() + Duration::days(1));
        assert_eq!(next.lifecycle, LifecycleState::Review);
    }

    #[test]
    fn test_failure_relearns() {
        let previous = SchedulingState {
            interval_days: 16,
            ease_factor: 1.35,
            repetitions: 3,
            due_at: now(),
            lifecycle: LifecycleState::Review,
        };
        let next = apply_review(q(2), &previous, now(), &ImmediateGraduation).unwrap();
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.ease_factor, 1.35);
        assert_eq!(next.lifecycle, LifecycleState::Relearning);
    }

    #[test]
    fn test_relearning_back_to_review() {
        let mut state = SchedulingState::new_card(now());
        let mut seen = Vec::new();
        for quality in [0, 4, 1, 5] {
            state = apply_review(q(quality), &state, now(), &ImmediateGraduation).unwrap();
            seen.push(state.lifecycle);
        }
        assert_eq!(
            seen,
            vec![
                LifecycleState::Relearning,
                LifecycleState::Review,
                LifecycleState::Relearning,
                LifecycleState::Review,
            ]
        );
    }

    #[test]
    fn test_learning_never_derived() {
        let outcome = sm2::schedule(q(3), &SchedulingState::new_card(now()), now()).unwrap();
        for quality in 0..=5 {
            assert_ne!(derive_state(q(quality), &outcome), LifecycleState::Learning);
            assert_ne!(derive_state(q(quality), &outcome), LifecycleState::New);
        }
    }

    #[test]
    fn test_corrupt_state_produces_nothing() {
        let previous = SchedulingState {
            ease_factor: 0.9,
            ..SchedulingState::new_card(now())
        };
        let result = apply_review(q(5), &previous, now(), &ImmediateGraduation);
        assert!(matches!(result, Err(ScheduleError::CorruptState(_))));
    }
}
