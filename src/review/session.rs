//! Study session over the cards of one deck that are due.
//! Each due card is shown once; rating it reschedules it through the review service.

use super::{Result, ReviewReport, ReviewService};
use crate::clock::Clock;
use crate::database::{CardStore, RewardLedger};
use crate::models::{Card, LifecyclePolicy, Quality};

/// Walks the due cards of a deck in the order the store returned them.
pub struct StudySession<'a, S, C, P> {
    service: &'a ReviewService<S, C, P>,
    pub deck_id: i64,
    cards: Vec<Card>,
    current_index: usize,
    pub show_back: bool,
    passed: usize,
    failed: usize,
}

impl<'a, S, C, P> StudySession<'a, S, C, P>
where
    S: CardStore + RewardLedger,
    C: Clock,
    P: LifecyclePolicy,
{
    /// Loads the cards due now. An empty session is already complete.
    pub fn start(service: &'a ReviewService<S, C, P>, deck_id: i64) -> Result<Self> {
        let now = service.clock().now();
        let cards = service.store().due_cards(deck_id, now)?;

        Ok(Self {
            service,
            deck_id,
            cards,
            current_index: 0,
            show_back: false,
            passed: 0,
            failed: 0,
        })
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.current_index)
    }

    pub fn toggle_back(&mut self) {
        self.show_back = !self.show_back;
    }

    /// Rates the current card and moves to the next one.
    ///
    /// If the review was not saved the session stays on the same card so the
    /// user can rate again. Once the card is saved the session moves on even
    /// when recording rewards fails.
    pub fn grade_current_card(&mut self, quality: Quality) -> Result<Option<ReviewReport>> {
        let Some(card_id) = self.current_card().map(|card| card.id) else {
            return Ok(None);
        };

        let outcome = self.service.process_review(card_id, quality);
        let saved = match &outcome {
            Ok(_) => true,
            Err(e) => e.review_saved(),
        };
        if saved {
            if quality.is_success() {
                self.passed += 1;
            } else {
                self.failed += 1;
            }
            self.current_index += 1;
            self.show_back = false;
        }

        outcome.map(Some)
    }

    pub fn total_count(&self) -> usize {
        self.cards.len()
    }

    pub fn reviewed_count(&self) -> usize {
        self.current_index
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.reviewed_count()
    }

    pub fn passed_count(&self) -> usize {
        self.passed
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    pub fn is_completed(&self) -> bool {
        self.current_index >= self.cards.len()
    }

    pub fn progress_message(&self) -> String {
        if self.is_completed() {
            format!(
                "Finished: {} passed, {} to relearn",
                self.passed, self.failed
            )
        } else {
            format!("Card {} of {}", self.current_index + 1, self.total_count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::Database;
    use crate::models::{Flashcard, ImmediateGraduation, LifecycleState, NewDeck};
    use crate::review::test_support::RewardsUnavailable;
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 4, 18, 0, 0).unwrap()
    }

    fn deck_with_cards(count: usize) -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let deck_id = db.create_deck("alice", &NewDeck::new("Polish"), now()).unwrap();
        for i in 0..count {
            db.create_card(
                "alice",
                deck_id,
                &Flashcard::new(format!("front {i}"), format!("back {i}")),
                now(),
            )
            .unwrap();
        }
        (db, deck_id)
    }

    fn service_with_cards(count: usize) -> (ReviewService<Database, FixedClock>, i64) {
        let (db, deck_id) = deck_with_cards(count);
        (
            ReviewService::with_parts(db, FixedClock::new(now()), ImmediateGraduation),
            deck_id,
        )
    }

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn test_session_walks_each_due_card_once() {
        let (service, deck_id) = service_with_cards(3);
        let mut session = StudySession::start(&service, deck_id).unwrap();
        assert_eq!(session.total_count(), 3);
        assert_eq!(session.progress_message(), "Card 1 of 3");

        session.toggle_back();
        assert!(session.show_back);
        session.grade_current_card(q(4)).unwrap();
        assert!(!session.show_back);
        session.grade_current_card(q(1)).unwrap();
        session.grade_current_card(q(5)).unwrap();

        assert!(session.is_completed());
        assert_eq!(session.passed_count(), 2);
        assert_eq!(session.failed_count(), 1);
        assert_eq!(session.remaining_count(), 0);
        assert_eq!(session.grade_current_card(q(4)).unwrap(), None);
        assert_eq!(session.progress_message(), "Finished: 2 passed, 1 to relearn");
    }

    #[test]
    fn test_reviewed_cards_are_no_longer_due() {
        let (service, deck_id) = service_with_cards(2);
        let mut session = StudySession::start(&service, deck_id).unwrap();
        let report = session.grade_current_card(q(2)).unwrap().unwrap();
        assert_eq!(report.updated.lifecycle, LifecycleState::Relearning);
        session.grade_current_card(q(3)).unwrap();

        let again = StudySession::start(&service, deck_id).unwrap();
        assert!(again.is_completed());

        service.clock().advance_days(1);
        let tomorrow = StudySession::start(&service, deck_id).unwrap();
        assert_eq!(tomorrow.total_count(), 2);
    }

    #[test]
    fn test_reward_failure_still_advances() {
        let (db, deck_id) = deck_with_cards(2);
        let service = ReviewService::with_parts(
            RewardsUnavailable(db),
            FixedClock::new(now()),
            ImmediateGraduation,
        );
        let mut session = StudySession::start(&service, deck_id).unwrap();
        let first_id = session.current_card().unwrap().id;

        let err = session.grade_current_card(q(4)).unwrap_err();
        assert!(err.review_saved());
        assert_eq!(session.reviewed_count(), 1);
        assert_ne!(session.current_card().unwrap().id, first_id);

        let stored = service.store().load_card(first_id).unwrap().scheduling;
        assert_eq!(stored.repetitions, 1);
        assert_eq!(stored.interval_days, 1);
    }

    #[test]
    fn test_empty_deck_is_complete() {
        let (service, deck_id) = service_with_cards(0);
        let session = StudySession::start(&service, deck_id).unwrap();
        assert!(session.is_completed());
        assert!(session.current_card().is_none());
    }
}
