//! Next-card selection under daily quotas.
//!
//! Priority is strict: due learning cards, then review cards due today, then
//! new cards while the new-card quota allows. Ties break on ascending id.
//!
//! Learning cards are due by instant; review cards are due by calendar day,
//! so anything scheduled for later today is already eligible.

use serde::{Deserialize, Serialize};

use crate::counters::DailyCounters;
use crate::model::{Card, CardState, LocalDay, Timestamp};
use crate::policy::DeckPolicy;

/// Display counts for a deck's queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Learning cards due now.
    pub learning: usize,
    /// Review cards due today.
    pub review: usize,
    /// All new cards, regardless of the daily limit.
    pub new: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.learning + self.review + self.new
    }
}

/// Whether a learning card is due at `now`.
pub fn is_learning_due(card: &Card, now: &Timestamp) -> bool {
    matches!(card.state, CardState::Learning { .. }) && card.next_due_at <= *now
}

/// Whether a review card is due on `today`.
pub fn is_review_due(card: &Card, today: &LocalDay) -> bool {
    matches!(card.state, CardState::Review { .. }) && today.is_on_or_before(&card.next_due_at)
}

/// Pick the single next card to study, or `None` when the session is done.
///
/// The review-quota gate is not applied here; see
/// [`DeckPolicy::review_quota_reached`].
pub fn next_card<'a>(
    cards: &'a [Card],
    policy: &DeckPolicy,
    counters: &DailyCounters,
    now: Timestamp,
) -> Option<&'a Card> {
    let today = LocalDay::of(&now);

    let learning = cards
        .iter()
        .filter(|c| is_learning_due(c, &now))
        .min_by_key(|c| (c.next_due_at, c.id));
    if learning.is_some() {
        return learning;
    }

    let review = cards
        .iter()
        .filter(|c| is_review_due(c, &today))
        .min_by_key(|c| (c.next_due_at, c.id));
    if review.is_some() {
        return review;
    }

    if !policy.new_card_quota_available(counters.new_introduced_today) {
        return None;
    }
    cards
        .iter()
        .filter(|c| c.state == CardState::New)
        .min_by_key(|c| c.id)
}

/// All currently eligible cards in the order [`next_card`] would hand them out,
/// with new cards capped by the remaining new-card quota.
pub fn ordered_queue<'a>(
    cards: &'a [Card],
    policy: &DeckPolicy,
    counters: &DailyCounters,
    now: Timestamp,
) -> Vec<&'a Card> {
    let today = LocalDay::of(&now);

    let mut learning: Vec<&Card> = cards.iter().filter(|c| is_learning_due(c, &now)).collect();
    learning.sort_by_key(|c| (c.next_due_at, c.id));

    let mut review: Vec<&Card> = cards.iter().filter(|c| is_review_due(c, &today)).collect();
    review.sort_by_key(|c| (c.next_due_at, c.id));

    let remaining_new = policy
        .new_card_daily_limit
        .saturating_sub(counters.new_introduced_today) as usize;
    let mut new: Vec<&Card> = cards.iter().filter(|c| c.state == CardState::New).collect();
    new.sort_by_key(|c| c.id);
    new.truncate(remaining_new);

    learning.into_iter().chain(review).chain(new).collect()
}

/// Count learning cards due now, review cards due today, and all new cards.
pub fn queue_counts(cards: &[Card], now: Timestamp) -> QueueCounts {
    let today = LocalDay::of(&now);
    cards.iter().fold(QueueCounts::default(), |mut acc, c| {
        match c.state {
            CardState::New => acc.new += 1,
            CardState::Learning { .. } if is_learning_due(c, &now) => acc.learning += 1,
            CardState::Review { .. } if is_review_due(c, &today) => acc.review += 1,
            _ => {}
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardId, DeckId};
    use chrono::{Duration, FixedOffset, TimeZone};

    fn now() -> Timestamp {
        FixedOffset::east_opt(-5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 14, 15, 0, 0)
            .unwrap()
    }

    fn card(id: u64, state: CardState, due: Timestamp) -> Card {
        let mut c = Card::new(CardId(id), DeckId(1), serde_json::Value::Null, due);
        c.state = state;
        c.next_due_at = due;
        c
    }

    fn learning(id: u64, due: Timestamp) -> Card {
        card(id, CardState::Learning { step: 1 }, due)
    }

    fn review(id: u64, due: Timestamp) -> Card {
        card(id, CardState::Review { interval_days: 3 }, due)
    }

    fn new(id: u64) -> Card {
        card(id, CardState::New, now())
    }

    fn no_counters() -> DailyCounters {
        DailyCounters::default()
    }

    #[test]
    fn learning_beats_review_beats_new() {
        let cards = vec![
            new(1),
            review(2, now() - Duration::days(1)),
            learning(3, now() - Duration::minutes(5)),
        ];
        let policy = DeckPolicy::default();
        let picked = next_card(&cards, &policy, &no_counters(), now()).unwrap();
        assert_eq!(picked.id, CardId(3));
    }

    #[test]
    fn learning_not_yet_due_is_skipped() {
        let cards = vec![
            learning(1, now() + Duration::minutes(1)),
            review(2, now() - Duration::days(2)),
        ];
        let picked = next_card(&cards, &DeckPolicy::default(), &no_counters(), now()).unwrap();
        assert_eq!(picked.id, CardId(2));
    }

    #[test]
    fn earliest_due_wins_then_lowest_id() {
        let due = now() - Duration::minutes(30);
        let cards = vec![
            learning(9, due),
            learning(4, due),
            learning(2, now() - Duration::minutes(10)),
        ];
        let picked = next_card(&cards, &DeckPolicy::default(), &no_counters(), now()).unwrap();
        assert_eq!(picked.id, CardId(4));
    }

    #[test]
    fn new_cards_in_id_order() {
        let cards = vec![new(8), new(3), new(5)];
        let picked = next_card(&cards, &DeckPolicy::default(), &no_counters(), now()).unwrap();
        assert_eq!(picked.id, CardId(3));
    }

    #[test]
    fn new_quota_exhausted_returns_none() {
        let cards = vec![new(1), new(2), review(3, now() + Duration::days(2))];
        let policy = DeckPolicy {
            new_card_daily_limit: 5,
            ..Default::default()
        };
        let counters = DailyCounters {
            reviews_done_today: 0,
            new_introduced_today: 5,
        };
        assert!(next_card(&cards, &policy, &counters, now()).is_none());
    }

    #[test]
    fn zero_new_limit_blocks_new_cards() {
        let cards = vec![new(1)];
        let policy = DeckPolicy {
            new_card_daily_limit: 0,
            ..Default::default()
        };
        assert!(next_card(&cards, &policy, &no_counters(), now()).is_none());
    }

    #[test]
    fn review_due_is_calendar_day_based() {
        let today = now().date_naive();
        let offset = *now().offset();
        let last_second_yesterday = offset
            .from_local_datetime(&today.pred_opt().unwrap().and_hms_opt(23, 59, 59).unwrap())
            .unwrap();
        let later_today = offset
            .from_local_datetime(&today.and_hms_opt(23, 0, 0).unwrap())
            .unwrap();
        let first_second_tomorrow = offset
            .from_local_datetime(&today.succ_opt().unwrap().and_hms_opt(0, 0, 1).unwrap())
            .unwrap();

        let t = LocalDay::of(&now());
        assert!(is_review_due(&review(1, last_second_yesterday), &t));
        assert!(is_review_due(&review(2, later_today), &t));
        assert!(!is_review_due(&review(3, first_second_tomorrow), &t));

        let cards = vec![review(3, first_second_tomorrow)];
        let policy = DeckPolicy {
            new_card_daily_limit: 0,
            ..Default::default()
        };
        assert!(next_card(&cards, &policy, &no_counters(), now()).is_none());

        let cards = vec![review(2, later_today)];
        assert_eq!(
            next_card(&cards, &policy, &no_counters(), now()).map(|c| c.id),
            Some(CardId(2))
        );
    }

    #[test]
    fn empty_deck_has_nothing() {
        assert!(next_card(&[], &DeckPolicy::default(), &no_counters(), now()).is_none());
        assert_eq!(queue_counts(&[], now()), QueueCounts::default());
    }

    #[test]
    fn counts_report_availability_not_eligibility() {
        let cards = vec![
            new(1),
            new(2),
            new(3),
            learning(4, now() - Duration::minutes(1)),
            learning(5, now() + Duration::minutes(20)),
            review(6, now() - Duration::days(3)),
            review(7, now() + Duration::days(3)),
        ];
        let counts = queue_counts(&cards, now());
        assert_eq!(
            counts,
            QueueCounts {
                learning: 1,
                review: 1,
                new: 3,
            }
        );
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn ordered_queue_caps_new_cards() {
        let cards = vec![
            new(1),
            new(2),
            new(3),
            review(4, now() - Duration::days(1)),
            learning(5, now() - Duration::minutes(2)),
        ];
        let policy = DeckPolicy {
            new_card_daily_limit: 3,
            ..Default::default()
        };
        let counters = DailyCounters {
            reviews_done_today: 0,
            new_introduced_today: 1,
        };
        let ids: Vec<u64> = ordered_queue(&cards, &policy, &counters, now())
            .iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec![5, 4, 1, 2]);
    }

    #[test]
    fn scenario_learning_then_review_then_new() {
        let mut cards = vec![
            learning(1, now() - Duration::minutes(5)),
            review(2, now() - Duration::days(1)),
            new(3),
        ];
        let policy = DeckPolicy {
            new_card_daily_limit: 5,
            ..Default::default()
        };

        let first = next_card(&cards, &policy, &no_counters(), now()).unwrap().id;
        assert_eq!(first, CardId(1));
        cards[0].next_due_at = now() + Duration::minutes(10);

        let second = next_card(&cards, &policy, &no_counters(), now()).unwrap().id;
        assert_eq!(second, CardId(2));
        cards[1].next_due_at = now() + Duration::days(4);

        let third = next_card(&cards, &policy, &no_counters(), now()).unwrap().id;
        assert_eq!(third, CardId(3));
    }
}
