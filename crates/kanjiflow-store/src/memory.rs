//! In-memory store for tests and throwaway sessions.

use async_trait::async_trait;
use tokio::sync::RwLock;

use kanjiflow_core::model::{Card, CardId, Deck, DeckId, LocalDay, ReviewEvent, Timestamp};
use kanjiflow_core::policy::PolicyOverrides;
use kanjiflow_core::store::{CardFilter, NewCard, NewDeck, Store, StoreResult};

use crate::state::StoreState;

/// A `Store` that keeps everything in process memory.
///
/// All mutations take the write lock, so at most one change per card is in
/// flight at a time.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of review events logged so far, across all decks.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.event_count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_deck(&self, deck: NewDeck) -> StoreResult<Deck> {
        self.state.write().await.create_deck(deck)
    }

    async fn get_deck(&self, id: DeckId) -> StoreResult<Deck> {
        self.state.read().await.get_deck(id)
    }

    async fn find_deck(&self, name: &str) -> StoreResult<Option<Deck>> {
        Ok(self.state.read().await.find_deck(name))
    }

    async fn list_decks(&self) -> StoreResult<Vec<Deck>> {
        Ok(self.state.read().await.list_decks())
    }

    async fn update_deck_overrides(
        &self,
        id: DeckId,
        overrides: PolicyOverrides,
    ) -> StoreResult<Deck> {
        self.state.write().await.update_deck_overrides(id, overrides)
    }

    async fn create_card(&self, card: NewCard, created_at: Timestamp) -> StoreResult<Card> {
        self.state.write().await.create_card(card, created_at)
    }

    async fn get_card(&self, id: CardId) -> StoreResult<Card> {
        self.state.read().await.get_card(id)
    }

    async fn list_cards(&self, deck: DeckId, filter: CardFilter) -> StoreResult<Vec<Card>> {
        self.state.read().await.list_cards(deck, filter)
    }

    async fn save_card(&self, card: &Card) -> StoreResult<()> {
        self.state.write().await.save_card(card)
    }

    async fn delete_card(&self, id: CardId) -> StoreResult<()> {
        self.state.write().await.delete_card(id)
    }

    async fn append_review_event(&self, event: ReviewEvent) -> StoreResult<()> {
        self.state.write().await.append_review_event(event)
    }

    async fn record_answer(&self, card: &Card, event: ReviewEvent) -> StoreResult<()> {
        self.state.write().await.record_answer(card, event)
    }

    async fn count_events_on(&self, deck: DeckId, day: LocalDay) -> StoreResult<u32> {
        Ok(self.state.read().await.count_events_on(deck, day))
    }

    async fn count_cards_introduced_on(&self, deck: DeckId, day: LocalDay) -> StoreResult<u32> {
        Ok(self.state.read().await.count_cards_introduced_on(deck, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};
    use kanjiflow_core::error::StoreError;
    use kanjiflow_core::model::{CardState, Quality, StateKind};

    fn now() -> Timestamp {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
            .unwrap()
    }

    async fn store_with_deck() -> (MemoryStore, Deck) {
        let store = MemoryStore::new();
        let deck = store
            .create_deck(NewDeck {
                name: "N5".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        (store, deck)
    }

    #[tokio::test]
    async fn deck_names_are_unique() {
        let (store, _) = store_with_deck().await;
        let err = store
            .create_deck(NewDeck {
                name: "N5".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDeck(name) if name == "N5"));
        assert!(store.find_deck("N5").await.unwrap().is_some());
        assert!(store.find_deck("N4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cards_get_ascending_ids_and_new_state() {
        let (store, deck) = store_with_deck().await;
        let mut ids = Vec::new();
        for front in ["一", "二", "三"] {
            let card = store
                .create_card(
                    NewCard {
                        deck_id: deck.id,
                        payload: serde_json::json!({ "front": front }),
                    },
                    now(),
                )
                .await
                .unwrap();
            assert_eq!(card.state, CardState::New);
            assert_eq!(card.next_due_at, now());
            ids.push(card.id);
        }
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let listed = store.list_cards(deck.id, CardFilter::all()).await.unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), ids);
    }

    #[tokio::test]
    async fn save_replaces_and_filter_applies() {
        let (store, deck) = store_with_deck().await;
        let mut card = store
            .create_card(
                NewCard {
                    deck_id: deck.id,
                    payload: serde_json::Value::Null,
                },
                now(),
            )
            .await
            .unwrap();
        card.state = CardState::Review { interval_days: 4 };
        card.next_due_at = now() + Duration::days(4);
        store.save_card(&card).await.unwrap();

        assert_eq!(store.get_card(card.id).await.unwrap(), card);
        let reviews = store
            .list_cards(deck.id, CardFilter::in_state(StateKind::Review))
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
        let due_now = store
            .list_cards(
                deck.id,
                CardFilter {
                    state: None,
                    due_on_or_before: Some(now()),
                },
            )
            .await
            .unwrap();
        assert!(due_now.is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_card(CardId(5)).await,
            Err(StoreError::UnknownCard(CardId(5)))
        ));
        assert!(matches!(
            store.get_deck(DeckId(2)).await,
            Err(StoreError::UnknownDeck(DeckId(2)))
        ));
        assert!(matches!(
            store.list_cards(DeckId(2), CardFilter::all()).await,
            Err(StoreError::UnknownDeck(_))
        ));
    }

    #[tokio::test]
    async fn counts_events_and_introductions_per_day() {
        let (store, deck) = store_with_deck().await;
        let mut card = store
            .create_card(
                NewCard {
                    deck_id: deck.id,
                    payload: serde_json::Value::Null,
                },
                now(),
            )
            .await
            .unwrap();
        card.introduced_at = Some(now());
        store.save_card(&card).await.unwrap();

        for offset in [Duration::zero(), Duration::hours(1), Duration::days(-1)] {
            store
                .append_review_event(ReviewEvent {
                    deck_id: deck.id,
                    card_id: card.id,
                    reviewed_at: now() + offset,
                    quality: Quality::new(4).unwrap(),
                })
                .await
                .unwrap();
        }

        let today = LocalDay::of(&now());
        assert_eq!(store.count_events_on(deck.id, today).await.unwrap(), 2);
        assert_eq!(
            store.count_cards_introduced_on(deck.id, today).await.unwrap(),
            1
        );
        assert_eq!(store.event_count().await, 3);

        store.delete_card(card.id).await.unwrap();
        assert_eq!(
            store.count_cards_introduced_on(deck.id, today).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn record_answer_for_deleted_card_changes_nothing() {
        let (store, deck) = store_with_deck().await;
        let card = store
            .create_card(
                NewCard {
                    deck_id: deck.id,
                    payload: serde_json::json!({"front": "山"}),
                },
                now(),
            )
            .await
            .unwrap();
        store.delete_card(card.id).await.unwrap();

        let mut answered = card.clone();
        answered.reviews = 1;
        let err = store
            .record_answer(
                &answered,
                ReviewEvent {
                    deck_id: deck.id,
                    card_id: card.id,
                    reviewed_at: now(),
                    quality: Quality::new(5).unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.event_count().await, 0);
        assert!(store.get_card(card.id).await.is_err());
    }
}
