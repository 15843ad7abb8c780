//! Per-day quota counters derived from the review log and the card collection.
//!
//! Stores call these over whatever collection they hold, so every backend
//! counts the same way.

use serde::{Deserialize, Serialize};

use crate::model::{Card, DeckId, LocalDay, ReviewEvent};

/// How much of today's quotas a deck has used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounters {
    /// Review events logged today.
    pub reviews_done_today: u32,
    /// Cards whose first answer happened today.
    pub new_introduced_today: u32,
}

/// Count of review events for `deck` timestamped on `day`.
pub fn reviews_done_on<'a>(
    deck: DeckId,
    events: impl IntoIterator<Item = &'a ReviewEvent>,
    day: LocalDay,
) -> u32 {
    let count = events
        .into_iter()
        .filter(|e| e.deck_id == deck && day.contains(&e.reviewed_at))
        .count();
    saturate(count)
}

/// Count of cards in `deck` whose `introduced_at` falls on `day`.
pub fn introduced_on<'a>(
    deck: DeckId,
    cards: impl IntoIterator<Item = &'a Card>,
    day: LocalDay,
) -> u32 {
    let count = cards
        .into_iter()
        .filter(|c| c.deck_id == deck)
        .filter(|c| c.introduced_at.is_some_and(|at| day.contains(&at)))
        .count();
    saturate(count)
}

fn saturate(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
