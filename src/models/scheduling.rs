//! Per-card scheduling parameters, embedded in every card.

use super::error::{Result, ScheduleError};
use super::sm2::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse study state used to group cards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Never reviewed.
    #[default]
    New,
    /// Reserved for a learning-steps phase before graduation. No transition
    /// currently produces it; see `lifecycle::LifecyclePolicy`.
    Learning,
    Review,
    /// Last review of the card failed.
    Relearning,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::New => "new",
            LifecycleState::Learning => "learning",
            LifecycleState::Review => "review",
            LifecycleState::Relearning => "relearning",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(LifecycleState::New),
            "learning" => Ok(LifecycleState::Learning),
            "review" => Ok(LifecycleState::Review),
            "relearning" => Ok(LifecycleState::Relearning),
            other => Err(ScheduleError::CorruptState(format!(
                "unknown lifecycle state '{other}'"
            ))),
        }
    }
}

/// SM-2 parameters of a card plus its lifecycle state.
///
/// Replaced as a whole after every review, never patched field by field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub interval_days: u32,
    pub ease_factor: f64,
    /// Consecutive successful reviews since creation or the last failure.
    pub repetitions: u32,
    pub due_at: DateTime<Utc>,
    pub lifecycle: LifecycleState,
}

impl SchedulingState {
    /// State of a freshly created card: due immediately.
    pub fn new_card(now: DateTime<Utc>) -> Self {
        Self {
            interval_days: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
            due_at: now,
            lifecycle: LifecycleState::New,
        }
    }

    /// Builds a state from persisted values, rejecting anything that breaks
    /// the invariants instead of repairing it.
    pub fn from_raw(
        interval_days: i64,
        ease_factor: f64,
        repetitions: i64,
        due_at: DateTime<Utc>,
        lifecycle: LifecycleState,
    ) -> Result<Self> {
        let interval_days = u32::try_from(interval_days).map_err(|_| {
            ScheduleError::CorruptState(format!("interval of {interval_days} days"))
        })?;
        let repetitions = u32::try_from(repetitions)
            .map_err(|_| ScheduleError::CorruptState(format!("{repetitions} repetitions")))?;

        let state = Self {
            interval_days,
            ease_factor,
            repetitions,
            due_at,
            lifecycle,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ease_factor.is_finite() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(ScheduleError::CorruptState(format!(
                "ease factor {} below minimum {MIN_EASE_FACTOR}",
                self.ease_factor
            )));
        }
        Ok(())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}
