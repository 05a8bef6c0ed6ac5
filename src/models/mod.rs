pub mod card;
pub mod deck;
pub mod error;
pub mod flashcard;
pub mod gamification;
pub mod lifecycle;
pub mod quality;
pub mod scheduling;
pub mod sm2;

pub use card::Card;
pub use deck::{Deck, NewDeck};
pub use error::ScheduleError;
pub use flashcard::Flashcard;
pub use gamification::{Achievement, LeaderboardEntry};
pub use lifecycle::{ImmediateGraduation, LifecyclePolicy, apply_review, derive_state};
pub use quality::{Grade, Quality};
pub use scheduling::{LifecycleState, SchedulingState};
pub use sm2::{ScheduleOutcome, schedule};
