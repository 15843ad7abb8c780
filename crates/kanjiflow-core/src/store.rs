//! Storage trait for cards, decks, and the review log.
//!
//! Implemented by the `kanjiflow-store` crate. Implementations must apply at
//! most one mutation per card at a time; the engine itself takes no locks on
//! stored data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Card, CardId, Deck, DeckId, LocalDay, ReviewEvent, StateKind, Timestamp};
use crate::policy::PolicyOverrides;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Restricts which cards `list_cards` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFilter {
    /// Only cards in this state.
    #[serde(default)]
    pub state: Option<StateKind>,
    /// Only cards whose `next_due_at` is at or before this instant.
    #[serde(default)]
    pub due_on_or_before: Option<Timestamp>,
}

impl CardFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_state(state: StateKind) -> Self {
        Self {
            state: Some(state),
            due_on_or_before: None,
        }
    }

    pub fn matches(&self, card: &Card) -> bool {
        if let Some(state) = self.state {
            if card.state.kind() != state {
                return false;
            }
        }
        if let Some(cutoff) = self.due_on_or_before {
            if card.next_due_at > cutoff {
                return false;
            }
        }
        true
    }
}

/// Content for a card that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub deck_id: DeckId,
    pub payload: serde_json::Value,
}

/// Content for a deck that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDeck {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub overrides: PolicyOverrides,
}

/// Durable collection of decks, cards, and review events.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    // Decks

    async fn create_deck(&self, deck: NewDeck) -> StoreResult<Deck>;

    async fn get_deck(&self, id: DeckId) -> StoreResult<Deck>;

    /// Look a deck up by its unique name.
    async fn find_deck(&self, name: &str) -> StoreResult<Option<Deck>>;

    /// All decks in id order.
    async fn list_decks(&self) -> StoreResult<Vec<Deck>>;

    /// Replace a deck's policy overrides.
    async fn update_deck_overrides(
        &self,
        id: DeckId,
        overrides: PolicyOverrides,
    ) -> StoreResult<Deck>;

    // Cards

    /// Create a card in state `New`, due at `created_at`.
    async fn create_card(&self, card: NewCard, created_at: Timestamp) -> StoreResult<Card>;

    async fn get_card(&self, id: CardId) -> StoreResult<Card>;

    /// Cards of one deck matching `filter`, in id order.
    async fn list_cards(&self, deck: DeckId, filter: CardFilter) -> StoreResult<Vec<Card>>;

    /// Atomically replace the stored card with `card`.
    async fn save_card(&self, card: &Card) -> StoreResult<()>;

    async fn delete_card(&self, id: CardId) -> StoreResult<()>;

    // Review log

    async fn append_review_event(&self, event: ReviewEvent) -> StoreResult<()>;

    /// Save an answered card and log its event as one mutation: either both
    /// land or neither does.
    async fn record_answer(&self, card: &Card, event: ReviewEvent) -> StoreResult<()>;

    /// Number of review events for `deck` on `day`.
    async fn count_events_on(&self, deck: DeckId, day: LocalDay) -> StoreResult<u32>;

    /// Number of cards in `deck` first introduced on `day`.
    async fn count_cards_introduced_on(&self, deck: DeckId, day: LocalDay) -> StoreResult<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    #[test]
    fn filter_by_state_and_due() {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap();
        let card = Card::new(CardId(1), DeckId(1), serde_json::Value::Null, now);

        assert!(CardFilter::all().matches(&card));
        assert!(CardFilter::in_state(StateKind::New).matches(&card));
        assert!(!CardFilter::in_state(StateKind::Review).matches(&card));

        let early = CardFilter {
            state: None,
            due_on_or_before: Some(now - Duration::seconds(1)),
        };
        assert!(!early.matches(&card));
        let exact = CardFilter {
            state: None,
            due_on_or_before: Some(now),
        };
        assert!(exact.matches(&card));
    }
}
