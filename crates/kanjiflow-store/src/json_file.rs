//! JSON snapshot file store.
//!
//! The whole collection lives in memory and is rewritten to disk after every
//! mutation. Writes go to a sibling temp file that is then renamed over the
//! snapshot, so a crash never leaves a half-written file behind.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use kanjiflow_core::model::{Card, CardId, Deck, DeckId, LocalDay, ReviewEvent, Timestamp};
use kanjiflow_core::policy::PolicyOverrides;
use kanjiflow_core::store::{CardFilter, NewCard, NewDeck, Store, StoreResult};

use crate::state::{Snapshot, StoreState};

/// A `Store` persisted as a single pretty-printed JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Open the snapshot at `path`, starting empty if the file does not exist.
    ///
    /// Nothing is written until the first mutation.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content)?;
                tracing::debug!(
                    path = %path.display(),
                    decks = snapshot.decks.len(),
                    cards = snapshot.cards.len(),
                    "loaded store snapshot"
                );
                StoreState::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Apply `f` to a copy of the state and commit it only once it is on disk.
    async fn mutate<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut StoreState) -> StoreResult<T> + Send,
        T: Send,
    {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn persist(&self, state: &StoreState) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&state.to_snapshot())?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn create_deck(&self, deck: NewDeck) -> StoreResult<Deck> {
        self.mutate(|s| s.create_deck(deck)).await
    }

    async fn get_deck(&self, id: DeckId) -> StoreResult<Deck> {
        self.state.lock().await.get_deck(id)
    }

    async fn find_deck(&self, name: &str) -> StoreResult<Option<Deck>> {
        Ok(self.state.lock().await.find_deck(name))
    }

    async fn list_decks(&self) -> StoreResult<Vec<Deck>> {
        Ok(self.state.lock().await.list_decks())
    }

    async fn update_deck_overrides(
        &self,
        id: DeckId,
        overrides: PolicyOverrides,
    ) -> StoreResult<Deck> {
        self.mutate(|s| s.update_deck_overrides(id, overrides)).await
    }

    async fn create_card(&self, card: NewCard, created_at: Timestamp) -> StoreResult<Card> {
        self.mutate(|s| s.create_card(card, created_at)).await
    }

    async fn get_card(&self, id: CardId) -> StoreResult<Card> {
        self.state.lock().await.get_card(id)
    }

    async fn list_cards(&self, deck: DeckId, filter: CardFilter) -> StoreResult<Vec<Card>> {
        self.state.lock().await.list_cards(deck, filter)
    }

    async fn save_card(&self, card: &Card) -> StoreResult<()> {
        self.mutate(|s| s.save_card(card)).await
    }

    async fn delete_card(&self, id: CardId) -> StoreResult<()> {
        self.mutate(|s| s.delete_card(id)).await
    }

    async fn append_review_event(&self, event: ReviewEvent) -> StoreResult<()> {
        self.mutate(|s| s.append_review_event(event)).await
    }

    async fn record_answer(&self, card: &Card, event: ReviewEvent) -> StoreResult<()> {
        self.mutate(|s| s.record_answer(card, event)).await
    }

    async fn count_events_on(&self, deck: DeckId, day: LocalDay) -> StoreResult<u32> {
        Ok(self.state.lock().await.count_events_on(deck, day))
    }

    async fn count_cards_introduced_on(&self, deck: DeckId, day: LocalDay) -> StoreResult<u32> {
        Ok(self.state.lock().await.count_cards_introduced_on(deck, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use kanjiflow_core::error::StoreError;
    use kanjiflow_core::model::{CardState, Quality};

    fn now() -> Timestamp {
        FixedOffset::east_opt(-5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 10, 19, 30, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kanjiflow.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.list_decks().await.unwrap().is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reopen_sees_all_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("kanjiflow.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let deck = store
            .create_deck(NewDeck {
                name: "N5".into(),
                description: "core".into(),
                overrides: PolicyOverrides {
                    new_card_daily_limit: Some(8),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        let mut card = store
            .create_card(
                NewCard {
                    deck_id: deck.id,
                    payload: serde_json::json!({"front": "木", "back": "tree"}),
                },
                now(),
            )
            .await
            .unwrap();
        card.state = CardState::Learning { step: 1 };
        card.reviews = 1;
        card.introduced_at = Some(now());
        store.save_card(&card).await.unwrap();
        store
            .append_review_event(ReviewEvent {
                deck_id: deck.id,
                card_id: card.id,
                reviewed_at: now(),
                quality: Quality::new(3).unwrap(),
            })
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let decks = reopened.list_decks().await.unwrap();
        assert_eq!(decks, vec![deck.clone()]);
        assert_eq!(reopened.get_card(card.id).await.unwrap(), card);
        let today = LocalDay::of(&now());
        assert_eq!(reopened.count_events_on(deck.id, today).await.unwrap(), 1);
        assert_eq!(
            reopened
                .count_cards_introduced_on(deck.id, today)
                .await
                .unwrap(),
            1
        );

        let second = reopened
            .create_card(
                NewCard {
                    deck_id: deck.id,
                    payload: serde_json::json!({"front": "林"}),
                },
                now(),
            )
            .await
            .unwrap();
        assert!(second.id > card.id);
    }

    #[tokio::test]
    async fn failed_mutation_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kanjiflow.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store
            .create_deck(NewDeck {
                name: "N5".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = store.delete_card(CardId(42)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(!dir.path().join("kanjiflow.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_keeps_card_and_log_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kanjiflow.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        let deck = store
            .create_deck(NewDeck {
                name: "N5".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let card = store
            .create_card(
                NewCard {
                    deck_id: deck.id,
                    payload: serde_json::json!({"front": "森"}),
                },
                now(),
            )
            .await
            .unwrap();

        // A directory in the temp file's place makes the next write fail.
        let tmp = dir.path().join("kanjiflow.json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let mut answered = card.clone();
        answered.state = CardState::Learning { step: 1 };
        answered.reviews = 1;
        let err = store
            .record_answer(
                &answered,
                ReviewEvent {
                    deck_id: deck.id,
                    card_id: card.id,
                    reviewed_at: now(),
                    quality: Quality::new(4).unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));

        let today = LocalDay::of(&now());
        assert_eq!(store.get_card(card.id).await.unwrap(), card);
        assert_eq!(store.count_events_on(deck.id, today).await.unwrap(), 0);

        std::fs::remove_dir(&tmp).unwrap();
        drop(store);
        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_card(card.id).await.unwrap(), card);
        assert_eq!(reopened.count_events_on(deck.id, today).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kanjiflow.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
