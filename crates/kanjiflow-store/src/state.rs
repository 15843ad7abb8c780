//! In-memory collection shared by every backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kanjiflow_core::counters;
use kanjiflow_core::error::StoreError;
use kanjiflow_core::model::{Card, CardId, Deck, DeckId, LocalDay, ReviewEvent, Timestamp};
use kanjiflow_core::policy::PolicyOverrides;
use kanjiflow_core::store::{CardFilter, NewCard, NewDeck, StoreResult};

/// Decks, cards, and the review log, with id allocation.
#[derive(Debug, Default, Clone)]
pub(crate) struct StoreState {
    next_deck_id: u64,
    next_card_id: u64,
    decks: BTreeMap<DeckId, Deck>,
    cards: BTreeMap<CardId, Card>,
    events: Vec<ReviewEvent>,
}

/// On-disk form of [`StoreState`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default = "snapshot_version")]
    pub version: u32,
    #[serde(default)]
    pub next_deck_id: u64,
    #[serde(default)]
    pub next_card_id: u64,
    #[serde(default)]
    pub decks: Vec<Deck>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub events: Vec<ReviewEvent>,
}

fn snapshot_version() -> u32 {
    1
}

impl StoreState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let decks: BTreeMap<DeckId, Deck> = snapshot.decks.into_iter().map(|d| (d.id, d)).collect();
        let cards: BTreeMap<CardId, Card> = snapshot.cards.into_iter().map(|c| (c.id, c)).collect();
        // Never hand out an id that is already taken, even if the counters were lost.
        let next_deck_id = decks
            .keys()
            .next_back()
            .map_or(0, |id| id.0)
            .max(snapshot.next_deck_id);
        let next_card_id = cards
            .keys()
            .next_back()
            .map_or(0, |id| id.0)
            .max(snapshot.next_card_id);
        Self {
            next_deck_id,
            next_card_id,
            decks,
            cards,
            events: snapshot.events,
        }
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: snapshot_version(),
            next_deck_id: self.next_deck_id,
            next_card_id: self.next_card_id,
            decks: self.decks.values().cloned().collect(),
            cards: self.cards.values().cloned().collect(),
            events: self.events.clone(),
        }
    }

    pub fn create_deck(&mut self, deck: NewDeck) -> StoreResult<Deck> {
        if self.decks.values().any(|d| d.name == deck.name) {
            return Err(StoreError::DuplicateDeck(deck.name));
        }
        self.next_deck_id += 1;
        let created = Deck {
            id: DeckId(self.next_deck_id),
            name: deck.name,
            description: deck.description,
            overrides: deck.overrides,
        };
        self.decks.insert(created.id, created.clone());
        Ok(created)
    }

    pub fn get_deck(&self, id: DeckId) -> StoreResult<Deck> {
        self.decks.get(&id).cloned().ok_or(StoreError::UnknownDeck(id))
    }

    pub fn find_deck(&self, name: &str) -> Option<Deck> {
        self.decks.values().find(|d| d.name == name).cloned()
    }

    pub fn list_decks(&self) -> Vec<Deck> {
        self.decks.values().cloned().collect()
    }

    pub fn update_deck_overrides(
        &mut self,
        id: DeckId,
        overrides: PolicyOverrides,
    ) -> StoreResult<Deck> {
        let deck = self.decks.get_mut(&id).ok_or(StoreError::UnknownDeck(id))?;
        deck.overrides = overrides;
        Ok(deck.clone())
    }

    pub fn create_card(&mut self, card: NewCard, created_at: Timestamp) -> StoreResult<Card> {
        if !self.decks.contains_key(&card.deck_id) {
            return Err(StoreError::UnknownDeck(card.deck_id));
        }
        self.next_card_id += 1;
        let created = Card::new(
            CardId(self.next_card_id),
            card.deck_id,
            card.payload,
            created_at,
        );
        self.cards.insert(created.id, created.clone());
        Ok(created)
    }

    pub fn get_card(&self, id: CardId) -> StoreResult<Card> {
        self.cards.get(&id).cloned().ok_or(StoreError::UnknownCard(id))
    }

    pub fn list_cards(&self, deck: DeckId, filter: CardFilter) -> StoreResult<Vec<Card>> {
        if !self.decks.contains_key(&deck) {
            return Err(StoreError::UnknownDeck(deck));
        }
        Ok(self
            .cards
            .values()
            .filter(|c| c.deck_id == deck && filter.matches(c))
            .cloned()
            .collect())
    }

    pub fn save_card(&mut self, card: &Card) -> StoreResult<()> {
        let slot = self
            .cards
            .get_mut(&card.id)
            .ok_or(StoreError::UnknownCard(card.id))?;
        *slot = card.clone();
        Ok(())
    }

    pub fn delete_card(&mut self, id: CardId) -> StoreResult<()> {
        self.cards
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::UnknownCard(id))
    }

    pub fn append_review_event(&mut self, event: ReviewEvent) -> StoreResult<()> {
        if !self.cards.contains_key(&event.card_id) {
            return Err(StoreError::UnknownCard(event.card_id));
        }
        self.events.push(event);
        Ok(())
    }

    /// Replace the card and log its event together, or change nothing.
    pub fn record_answer(&mut self, card: &Card, event: ReviewEvent) -> StoreResult<()> {
        if event.card_id != card.id {
            return Err(StoreError::UnknownCard(event.card_id));
        }
        let slot = self
            .cards
            .get_mut(&card.id)
            .ok_or(StoreError::UnknownCard(card.id))?;
        *slot = card.clone();
        self.events.push(event);
        Ok(())
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn count_events_on(&self, deck: DeckId, day: LocalDay) -> u32 {
        counters::reviews_done_on(deck, &self.events, day)
    }

    pub fn count_cards_introduced_on(&self, deck: DeckId, day: LocalDay) -> u32 {
        counters::introduced_on(deck, self.cards.values(), day)
    }
}
