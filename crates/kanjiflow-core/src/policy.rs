//! Deck scheduling policy and its resolution from global defaults.
//!
//! The engine only ever sees a fully merged [`DeckPolicy`]. Layering a deck's
//! [`PolicyOverrides`] over the global defaults happens once, in
//! [`DeckPolicy::resolve`], before any scheduling call.

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::model::MAX_INTERVAL_DAYS;

/// Resolved, immutable scheduling configuration for one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPolicy {
    /// New cards that may be introduced per day.
    #[serde(default = "default_new_card_limit")]
    pub new_card_daily_limit: u32,
    /// Reviews allowed per day; 0 means unlimited.
    #[serde(default = "default_review_limit")]
    pub review_daily_limit: u32,
    /// Learning ladder in minutes. May be empty.
    #[serde(default = "default_learning_steps")]
    pub learning_steps: Vec<u32>,
    /// Interval in days applied at graduation.
    #[serde(default = "default_graduating_interval")]
    pub graduating_interval: u32,
}

fn default_new_card_limit() -> u32 {
    5
}
fn default_review_limit() -> u32 {
    20
}
fn default_learning_steps() -> Vec<u32> {
    vec![10, 1440]
}
fn default_graduating_interval() -> u32 {
    4
}

impl Default for DeckPolicy {
    fn default() -> Self {
        Self {
            new_card_daily_limit: default_new_card_limit(),
            review_daily_limit: default_review_limit(),
            learning_steps: default_learning_steps(),
            graduating_interval: default_graduating_interval(),
        }
    }
}

/// Per-deck settings. Unset fields fall back to the global defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_card_daily_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_daily_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_steps: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduating_interval: Option<u32>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        self == &PolicyOverrides::default()
    }

    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(&self, other: &PolicyOverrides) -> PolicyOverrides {
        PolicyOverrides {
            new_card_daily_limit: other.new_card_daily_limit.or(self.new_card_daily_limit),
            review_daily_limit: other.review_daily_limit.or(self.review_daily_limit),
            learning_steps: other
                .learning_steps
                .clone()
                .or_else(|| self.learning_steps.clone()),
            graduating_interval: other.graduating_interval.or(self.graduating_interval),
        }
    }
}

impl DeckPolicy {
    /// Merge deck overrides over the global defaults.
    pub fn resolve(defaults: &DeckPolicy, overrides: &PolicyOverrides) -> DeckPolicy {
        DeckPolicy {
            new_card_daily_limit: overrides
                .new_card_daily_limit
                .unwrap_or(defaults.new_card_daily_limit),
            review_daily_limit: overrides
                .review_daily_limit
                .unwrap_or(defaults.review_daily_limit),
            learning_steps: overrides
                .learning_steps
                .clone()
                .unwrap_or_else(|| defaults.learning_steps.clone()),
            graduating_interval: overrides
                .graduating_interval
                .unwrap_or(defaults.graduating_interval),
        }
    }

    /// Check the policy for values the scheduler cannot work with.
    ///
    /// An empty learning ladder is valid: cards graduate on their first
    /// correct answer and lapses use the fallback step.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if let Some(index) = self.learning_steps.iter().position(|&m| m == 0) {
            return Err(PolicyError::ZeroLearningStep { index });
        }
        if self.graduating_interval == 0 {
            return Err(PolicyError::ZeroGraduatingInterval);
        }
        if self.graduating_interval > MAX_INTERVAL_DAYS {
            return Err(PolicyError::GraduatingIntervalTooLong {
                days: self.graduating_interval,
                max: MAX_INTERVAL_DAYS,
            });
        }
        Ok(())
    }

    /// Whether today's review quota is used up. A limit of 0 never trips.
    pub fn review_quota_reached(&self, reviews_done_today: u32) -> bool {
        self.review_daily_limit > 0 && reviews_done_today >= self.review_daily_limit
    }

    /// Whether another new card may be introduced today.
    pub fn new_card_quota_available(&self, new_introduced_today: u32) -> bool {
        new_introduced_today < self.new_card_daily_limit
    }
}
