//! Recall-quality rating supplied by the user after each review.

use super::error::{Result, ScheduleError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest rating that still counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;
/// Highest rating (perfect, effortless recall).
pub const MAX_QUALITY: u8 = 5;

/// Quality of recall, 0 (blackout) to 5 (perfect).
///
/// Out-of-range values are rejected rather than clamped so that a broken
/// rating widget surfaces as an error instead of a silently wrong schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_QUALITY {
            return Err(ScheduleError::InvalidQuality(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 >= PASSING_QUALITY
    }
}

impl TryFrom<u8> for Quality {
    type Error = ScheduleError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Quality {
    type Error = ScheduleError;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| ScheduleError::InvalidQuality(value.to_string()))
            .and_then(Self::new)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl FromStr for Quality {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| ScheduleError::InvalidQuality(s.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four answer buttons shown on the review screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    pub fn quality(self) -> Quality {
        match self {
            Grade::Again => Quality(1),
            Grade::Hard => Quality(3),
            Grade::Good => Quality(4),
            Grade::Easy => Quality(5),
        }
    }
}

impl From<Grade> for Quality {
    fn from(grade: Grade) -> Self {
        grade.quality()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for value in 0..=5u8 {
            assert_eq!(Quality::new(value).unwrap().value(), value);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(Quality::new(7), Err(ScheduleError::InvalidQuality(_))));
        assert!(Quality::try_from(-1i64).is_err());
        assert!(Quality::try_from(300i64).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("4".parse::<Quality>().unwrap().value(), 4);
        assert_eq!(" 0 ".parse::<Quality>().unwrap().value(), 0);
        assert!("3.5".parse::<Quality>().is_err());
        assert!("good".parse::<Quality>().is_err());
        assert!("6".parse::<Quality>().is_err());
    }

    #[test]
    fn test_success_threshold() {
        assert!(!Quality::new(2).unwrap().is_success());
        assert!(Quality::new(3).unwrap().is_success());
    }

    #[test]
    fn test_grade_mapping() {
        assert_eq!(Grade::Again.quality().value(), 1);
        assert_eq!(Grade::Hard.quality().value(), 3);
        assert_eq!(Grade::Good.quality().value(), 4);
        assert_eq!(Grade::Easy.quality().value(), 5);
        assert!(!Grade::Again.quality().is_success());
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        assert!(serde_json::from_str::<Quality>("9").is_err());
        assert_eq!(serde_json::from_str::<Quality>("2").unwrap().value(), 2);
    }
}
