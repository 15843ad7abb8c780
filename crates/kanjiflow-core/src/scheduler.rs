//! SM-2 style card scheduler.
//!
//! [`answer`] is a pure transition `(card, quality, policy, now) -> card'`.
//! It never touches storage and never mutates its input: the caller gets a
//! complete new card or an error, nothing in between.
//!
//! Units: learning steps are minutes, `interval_days` and the graduating
//! interval are always days.

use chrono::Duration;

use crate::error::SchedulerError;
use crate::model::{Card, CardState, Quality, Timestamp, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};
use crate::policy::DeckPolicy;

/// Delay used after a lapse when the deck has no learning ladder.
pub const FALLBACK_LEARNING_STEP_MINUTES: u32 = 10;

/// Ease factor penalty applied on every lapse.
pub const LAPSE_EASE_PENALTY: f64 = 0.2;

/// Apply an answer to a card.
///
/// Rejects `quality > 5` before doing anything else.
pub fn answer(
    card: &Card,
    quality: u8,
    policy: &DeckPolicy,
    now: Timestamp,
) -> Result<Card, SchedulerError> {
    let quality = Quality::new(quality)?;
    Ok(apply(card, quality, policy, now))
}

/// Apply an already validated answer to a card.
pub fn apply(card: &Card, quality: Quality, policy: &DeckPolicy, now: Timestamp) -> Card {
    let mut next = card.clone();
    next.last_reviewed_at = Some(now);
    if card.state == CardState::New && card.introduced_at.is_none() {
        next.introduced_at = Some(now);
    }
    next.reviews = card.reviews.saturating_add(1);

    if quality.is_lapse() {
        next.state = CardState::Learning { step: 0 };
        next.ease_factor = clamp_ease(card.ease_factor - LAPSE_EASE_PENALTY);
        next.next_due_at = now + minutes(first_learning_step(policy));
        tracing::debug!(
            card = %card.id,
            quality = %quality,
            from = %card.state.kind(),
            ease = next.ease_factor,
            "lapse, back to first learning step"
        );
        return next;
    }

    match card.state {
        CardState::New | CardState::Learning { .. } => {
            let step = card.learning_step();
            match policy.learning_steps.get(step) {
                Some(&delay) => {
                    next.state = CardState::Learning { step: step + 1 };
                    next.next_due_at = now + minutes(delay);
                    tracing::debug!(card = %card.id, step = step + 1, delay, "advanced learning step");
                }
                None => {
                    let interval_days = graduating_interval(policy);
                    next.state = CardState::Review { interval_days };
                    next.next_due_at = now + days(interval_days);
                    tracing::debug!(card = %card.id, interval_days, "graduated to review");
                }
            }
        }
        CardState::Review { interval_days } => {
            let interval_days = if interval_days == 0 {
                graduating_interval(policy)
            } else {
                grow_interval(interval_days, card.ease_factor)
            };
            next.ease_factor = adjusted_ease(card.ease_factor, quality);
            next.state = CardState::Review { interval_days };
            next.next_due_at = now + days(interval_days);
            tracing::debug!(
                card = %card.id,
                quality = %quality,
                interval_days,
                ease = next.ease_factor,
                "rescheduled review"
            );
        }
    }

    next
}

/// SM-2 ease update: `ef + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))`, floored.
pub fn adjusted_ease(ease_factor: f64, quality: Quality) -> f64 {
    let miss = f64::from(Quality::MAX - quality.value());
    clamp_ease(ease_factor + (0.1 - miss * (0.08 + miss * 0.02)))
}

/// Next review interval: `interval * ease`, rounded half to even, within
/// `1..=MAX_INTERVAL_DAYS`.
pub fn grow_interval(interval_days: u32, ease_factor: f64) -> u32 {
    let grown = (f64::from(interval_days) * ease_factor).round_ties_even();
    if grown >= f64::from(MAX_INTERVAL_DAYS) {
        MAX_INTERVAL_DAYS
    } else {
        (grown as u32).max(1)
    }
}

/// The policy's graduating interval, kept inside `1..=MAX_INTERVAL_DAYS` even
/// for a policy that never went through `validate`.
fn graduating_interval(policy: &DeckPolicy) -> u32 {
    policy.graduating_interval.clamp(1, MAX_INTERVAL_DAYS)
}

fn clamp_ease(ease_factor: f64) -> f64 {
    ease_factor.max(MIN_EASE_FACTOR)
}

fn first_learning_step(policy: &DeckPolicy) -> u32 {
    policy
        .learning_steps
        .first()
        .copied()
        .unwrap_or(FALLBACK_LEARNING_STEP_MINUTES)
}

fn minutes(m: u32) -> Duration {
    Duration::minutes(i64::from(m))
}

fn days(d: u32) -> Duration {
    Duration::days(i64::from(d))
}
