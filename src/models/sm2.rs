//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates optimal review intervals based on recall quality:
//! - Quality grades 3-5: interval grows 1 day → 6 days → previous interval × EF
//! - Quality grades 0-2: repetitions reset, card comes back tomorrow, EF untouched
//! - EF moves by -0.14 / 0 / +0.1 for grades 3 / 4 / 5 and never drops below 1.3
//!
//! The current time is passed in by the caller so the computation stays pure.

use super::error::{Result, ScheduleError};
use super::{Quality, SchedulingState};
use chrono::{DateTime, Datelike, Days, Utc};
use tracing::debug;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const FIRST_INTERVAL_DAYS: u32 = 1;
pub const SECOND_INTERVAL_DAYS: u32 = 6;
pub const RELEARN_INTERVAL_DAYS: u32 = 1;
/// Last year a due date may fall in; later dates no longer have a
/// four-digit year and cannot be stored or compared as fixed-width text.
pub const MAX_DUE_YEAR: i32 = 9999;

/// Numeric part of a new scheduling state.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleOutcome {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub due_at: DateTime<Utc>,
}

/// EF adjustment for a successful review, before the floor is applied.
pub fn ease_delta(quality: Quality) -> f64 {
    let miss = (5 - quality.value()) as f64;
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Calculates the next scheduling parameters according to the SM-2 algorithm.
///
/// The lifecycle state of `previous` is ignored. Fails without producing
/// anything if `previous` breaks its invariants or the next due date cannot
/// be represented.
pub fn schedule(
    quality: Quality,
    previous: &SchedulingState,
    now: DateTime<Utc>,
) -> Result<ScheduleOutcome> {
    previous.validate()?;

    let (interval_days, repetitions, ease_factor) = if quality.is_success() {
        let interval = match previous.repetitions {
            0 => FIRST_INTERVAL_DAYS,
            1 => SECOND_INTERVAL_DAYS,
            _ => next_interval(previous.interval_days, previous.ease_factor)?,
        };
        (
            interval,
            previous.repetitions.saturating_add(1),
            previous.ease_factor + ease_delta(quality),
        )
    } else {
        (RELEARN_INTERVAL_DAYS, 0, previous.ease_factor)
    };

    // Floor after every update so repeated small deltas cannot drift below it.
    let ease_factor = ease_factor.max(MIN_EASE_FACTOR);

    let due_at = now
        .checked_add_days(Days::new(u64::from(interval_days)))
        .filter(|due_at| due_at.year() <= MAX_DUE_YEAR)
        .ok_or(ScheduleError::DueDateOutOfRange(f64::from(interval_days)))?;

    debug!(
        quality = quality.value(),
        interval_days, repetitions, ease_factor, "Computed SM-2 schedule"
    );

    Ok(ScheduleOutcome {
        interval_days,
        ease_factor,
        repetitions,
        due_at,
    })
}

/// `round(interval × EF)`; `f64::round` rounds half away from zero.
fn next_interval(interval_days: u32, ease_factor: f64) -> Result<u32> {
    let product = (f64::from(interval_days) * ease_factor).round();
    if product > f64::from(u32::MAX) {
        return Err(ScheduleError::DueDateOutOfRange(product));
    }
    Ok(product as u32)
}
