//! Core data model types for kanjiflow.
//!
//! Cards, decks, review events, and the calendar-day helper that every
//! "today" computation in the engine goes through.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;
use crate::policy::PolicyOverrides;

/// An instant together with the UTC offset of the clock that produced it.
///
/// Keeping the offset lets the engine derive the learner's calendar day
/// without consulting an ambient time zone.
pub type Timestamp = DateTime<FixedOffset>;

/// Ease factor assigned to every freshly created card.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Upper bound for any review interval, about a hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Opaque card identifier. Ascending order is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque deck identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(pub u64);

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A calendar date as seen from a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
    pub date: NaiveDate,
    pub offset: FixedOffset,
}

impl LocalDay {
    /// The day `now` falls on, in `now`'s own offset.
    pub fn of(now: &Timestamp) -> Self {
        Self {
            date: now.date_naive(),
            offset: *now.offset(),
        }
    }

    /// The calendar date of `ts` when viewed from this day's offset.
    pub fn date_of(&self, ts: &Timestamp) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Whether `ts` falls on this day.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        self.date_of(ts) == self.date
    }

    /// Whether `ts` falls on this day or any earlier day.
    pub fn is_on_or_before(&self, ts: &Timestamp) -> bool {
        self.date_of(ts) <= self.date
    }

    /// The following calendar day in the same offset.
    pub fn succ(&self) -> Option<Self> {
        self.date.succ_opt().map(|date| Self {
            date,
            offset: self.offset,
        })
    }
}

impl fmt::Display for LocalDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)
    }
}

/// Scheduling state of a card.
///
/// Fields that only make sense in one state live inside that variant, so a
/// card in `Review` cannot carry a learning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CardState {
    /// Never answered.
    New,
    /// Working through the learning ladder; `step` indexes the next rung.
    Learning { step: usize },
    /// Graduated; `interval_days` is the current review interval.
    Review { interval_days: u32 },
}

impl CardState {
    pub fn kind(&self) -> StateKind {
        match self {
            CardState::New => StateKind::New,
            CardState::Learning { .. } => StateKind::Learning,
            CardState::Review { .. } => StateKind::Review,
        }
    }

    /// Index into the learning ladder; 0 outside `Learning`.
    pub fn learning_step(&self) -> usize {
        match self {
            CardState::Learning { step } => *step,
            _ => 0,
        }
    }

    /// Review interval in days; 0 until the card has graduated.
    pub fn interval_days(&self) -> u32 {
        match self {
            CardState::Review { interval_days } => *interval_days,
            _ => 0,
        }
    }
}

/// Fieldless view of `CardState`, used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    New,
    Learning,
    Review,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::New => write!(f, "new"),
            StateKind::Learning => write!(f, "learning"),
            StateKind::Review => write!(f, "review"),
        }
    }
}

impl FromStr for StateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(StateKind::New),
            "learning" | "learn" => Ok(StateKind::Learning),
            "review" => Ok(StateKind::Review),
            other => Err(format!("unknown card state: {other}")),
        }
    }
}

/// A single reviewable item with its own scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub deck_id: DeckId,
    pub state: CardState,
    /// Interval multiplier; never below `MIN_EASE_FACTOR`.
    pub ease_factor: f64,
    /// Completed answers, lapses included.
    pub reviews: u32,
    pub next_due_at: Timestamp,
    #[serde(default)]
    pub last_reviewed_at: Option<Timestamp>,
    /// Set once, the first time the card leaves `New`.
    #[serde(default)]
    pub introduced_at: Option<Timestamp>,
    /// Card content. Not interpreted by the engine.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Card {
    /// A freshly created card, due immediately.
    pub fn new(id: CardId, deck_id: DeckId, payload: serde_json::Value, created_at: Timestamp) -> Self {
        Self {
            id,
            deck_id,
            state: CardState::New,
            ease_factor: DEFAULT_EASE_FACTOR,
            reviews: 0,
            next_due_at: created_at,
            last_reviewed_at: None,
            introduced_at: None,
            payload,
        }
    }

    pub fn learning_step(&self) -> usize {
        self.state.learning_step()
    }

    pub fn interval_days(&self) -> u32 {
        self.state.interval_days()
    }

    /// Short human-readable label taken from the payload, falling back to
    /// the card id.
    pub fn label(&self) -> String {
        payload_label(&self.payload).unwrap_or_else(|| format!("card #{}", self.id))
    }
}

/// Label text for a card payload: a `front`, `character` or `word` field,
/// then the first string value.
pub fn payload_label(payload: &serde_json::Value) -> Option<String> {
    if let Some(obj) = payload.as_object() {
        ["front", "character", "word"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
            .or_else(|| obj.values().find_map(|v| v.as_str()))
            .map(str::to_string)
    } else {
        payload.as_str().map(str::to_string)
    }
}

/// Answer quality on the 0–5 SM-2 scale.
///
/// 0–2 is a lapse, 3–5 a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, SchedulerError> {
        if value > Self::MAX {
            return Err(SchedulerError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_lapse(self) -> bool {
        self.0 < 3
    }
}

impl TryFrom<u8> for Quality {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only log entry for one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub deck_id: DeckId,
    pub card_id: CardId,
    pub reviewed_at: Timestamp,
    pub quality: Quality,
}

/// A named collection of cards sharing a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Per-deck settings layered over the global defaults.
    #[serde(default)]
    pub overrides: PolicyOverrides,
}
