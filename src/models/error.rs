//! Errors raised while validating review input or computing a schedule.

/// Scheduling error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    /// Quality rating outside 0..=5 (or not an integer at all)
    #[error("Invalid quality rating: {0} (expected an integer from 0 to 5)")]
    InvalidQuality(String),
    /// Stored scheduling parameters violate their invariants
    #[error("Corrupt scheduling state: {0}")]
    CorruptState(String),
    /// Next interval cannot be represented as a due date
    #[error("Due date out of range: interval of {0} days")]
    DueDateOutOfRange(f64),
}

/// Scheduling result type
pub type Result<T> = std::result::Result<T, ScheduleError>;
