//! Study session orchestrator.
//!
//! Wires a [`Store`] and a [`Clock`] around the pure scheduling functions:
//! resolve the deck policy, derive today's counters, pick the next card, and
//! persist answers together with their review events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::counters::DailyCounters;
use crate::error::SessionError;
use crate::model::{Card, CardId, DeckId, LocalDay, Quality, ReviewEvent};
use crate::policy::DeckPolicy;
use crate::queue::{self, QueueCounts};
use crate::scheduler;
use crate::stats::DeckStats;
use crate::store::{CardFilter, Store};

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// What the learner should do next in a deck.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStep {
    /// Study this card.
    Study { card: Card },
    /// Today's review quota is used up.
    ReviewLimitReached { limit: u32 },
    /// Nothing is due and no new card may be introduced.
    Complete,
}

/// Drives selection and answering for any number of decks.
///
/// Calls against the same deck are serialized, so a selection always sees a
/// consistent snapshot and answers never interleave with it.
pub struct StudySession {
    id: Uuid,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    defaults: DeckPolicy,
    deck_locks: Mutex<HashMap<DeckId, Arc<tokio::sync::Mutex<()>>>>,
}

impl StudySession {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, defaults: DeckPolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            clock,
            defaults,
            deck_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The deck's overrides merged over the global defaults.
    pub async fn policy_for(&self, deck: DeckId) -> SessionResult<DeckPolicy> {
        let deck = self.store.get_deck(deck).await?;
        let policy = DeckPolicy::resolve(&self.defaults, &deck.overrides);
        policy.validate()?;
        Ok(policy)
    }

    /// Today's quota usage for a deck.
    pub async fn daily_counters(&self, deck: DeckId) -> SessionResult<DailyCounters> {
        let today = LocalDay::of(&self.clock.now());
        self.counters_on(deck, today).await
    }

    async fn counters_on(&self, deck: DeckId, day: LocalDay) -> SessionResult<DailyCounters> {
        Ok(DailyCounters {
            reviews_done_today: self.store.count_events_on(deck, day).await?,
            new_introduced_today: self.store.count_cards_introduced_on(deck, day).await?,
        })
    }

    /// Decide what to study next in `deck`.
    pub async fn next_step(&self, deck: DeckId) -> SessionResult<SessionStep> {
        let lock = self.deck_lock(deck);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        let policy = self.policy_for(deck).await?;
        let counters = self.counters_on(deck, LocalDay::of(&now)).await?;

        if policy.review_quota_reached(counters.reviews_done_today) {
            tracing::info!(
                session = %self.id,
                deck = %deck,
                done = counters.reviews_done_today,
                "daily review limit reached"
            );
            return Ok(SessionStep::ReviewLimitReached {
                limit: policy.review_daily_limit,
            });
        }

        let cards = self.store.list_cards(deck, CardFilter::all()).await?;
        match queue::next_card(&cards, &policy, &counters, now) {
            Some(card) => {
                tracing::debug!(session = %self.id, deck = %deck, card = %card.id, state = %card.state.kind(), "selected card");
                Ok(SessionStep::Study { card: card.clone() })
            }
            None => Ok(SessionStep::Complete),
        }
    }

    /// Every card currently eligible, in the order `next_step` would hand
    /// them out. Empty once today's review quota is used up.
    pub async fn upcoming(&self, deck: DeckId) -> SessionResult<Vec<Card>> {
        let lock = self.deck_lock(deck);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        let policy = self.policy_for(deck).await?;
        let counters = self.counters_on(deck, LocalDay::of(&now)).await?;
        if policy.review_quota_reached(counters.reviews_done_today) {
            return Ok(Vec::new());
        }

        let cards = self.store.list_cards(deck, CardFilter::all()).await?;
        Ok(queue::ordered_queue(&cards, &policy, &counters, now)
            .into_iter()
            .cloned()
            .collect())
    }

    /// The next card to study, if any.
    pub async fn next_card(&self, deck: DeckId) -> SessionResult<Option<Card>> {
        Ok(match self.next_step(deck).await? {
            SessionStep::Study { card } => Some(card),
            _ => None,
        })
    }

    /// Record an answer: schedule the card, then save it and log the event
    /// in a single store mutation.
    ///
    /// Quality is validated before the store is touched.
    pub async fn answer(&self, card_id: CardId, quality: u8) -> SessionResult<Card> {
        let quality = Quality::new(quality)?;
        let deck = self.store.get_card(card_id).await?.deck_id;

        let lock = self.deck_lock(deck);
        let _guard = lock.lock().await;

        // Re-read under the deck lock so a concurrent answer is not lost.
        let card = self.store.get_card(card_id).await?;
        let now = self.clock.now();
        let policy = self.policy_for(deck).await?;
        let updated = scheduler::apply(&card, quality, &policy, now);

        self.store
            .record_answer(
                &updated,
                ReviewEvent {
                    deck_id: deck,
                    card_id,
                    reviewed_at: now,
                    quality,
                },
            )
            .await?;

        tracing::info!(
            session = %self.id,
            deck = %deck,
            card = %card_id,
            quality = %quality,
            state = %updated.state.kind(),
            due = %updated.next_due_at,
            "answered card"
        );
        Ok(updated)
    }

    /// Queue sizes for display.
    pub async fn queue_counts(&self, deck: DeckId) -> SessionResult<QueueCounts> {
        let cards = self.store.list_cards(deck, CardFilter::all()).await?;
        Ok(queue::queue_counts(&cards, self.clock.now()))
    }

    /// Progress statistics for a deck.
    pub async fn stats(&self, deck: DeckId) -> SessionResult<DeckStats> {
        self.store.get_deck(deck).await?;
        let cards = self.store.list_cards(deck, CardFilter::all()).await?;
        Ok(DeckStats::compute(&cards, self.clock.now()))
    }

    fn deck_lock(&self, deck: DeckId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.deck_locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(deck).or_default())
    }
}
