pub mod clock;
pub mod config;
pub mod database;
pub mod export;
pub mod models;
pub mod review;

pub use clock::{Clock, FixedClock, SystemClock};
pub use database::{CardStore, Database, RewardLedger, StoreError};
pub use models::{
    Card, Deck, Flashcard, Grade, LifecycleState, Quality, ScheduleError, SchedulingState,
};
pub use review::{ReviewError, ReviewService, StudySession};
