//! Deck progress statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Card, CardState, LocalDay, Timestamp};
use crate::queue::{queue_counts, QueueCounts};

/// Number of days covered by [`DeckStats::forecast`], today included.
pub const FORECAST_DAYS: usize = 7;

/// Snapshot of a deck's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    /// Cards answered at least once.
    pub reviewed: usize,
    /// `reviewed / total` as a percentage, one decimal place.
    pub mastery_percentage: f64,
    /// Average ease over graduated cards.
    pub average_ease: Option<f64>,
    /// What is due right now.
    pub due: QueueCounts,
    /// Learning and review cards coming due per day. Overdue cards count toward today.
    pub forecast: Vec<DayForecast>,
}

/// Cards coming due on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub due: usize,
}

impl DeckStats {
    pub fn compute(cards: &[Card], now: Timestamp) -> Self {
        let mut new = 0;
        let mut learning = 0;
        let mut review = 0;
        let mut ease_sum = 0.0;
        for card in cards {
            match card.state {
                CardState::New => new += 1,
                CardState::Learning { .. } => learning += 1,
                CardState::Review { .. } => {
                    review += 1;
                    ease_sum += card.ease_factor;
                }
            }
        }

        let total = cards.len();
        let reviewed = cards.iter().filter(|c| c.reviews > 0).count();
        let mastery_percentage = if total > 0 {
            (reviewed as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        let average_ease = (review > 0).then(|| ease_sum / review as f64);

        Self {
            total,
            new,
            learning,
            review,
            reviewed,
            mastery_percentage,
            average_ease,
            due: queue_counts(cards, now),
            forecast: forecast(cards, LocalDay::of(&now)),
        }
    }
}

fn forecast(cards: &[Card], today: LocalDay) -> Vec<DayForecast> {
    let mut days = Vec::with_capacity(FORECAST_DAYS);
    let mut day = Some(today);
    while let Some(d) = day {
        if days.len() == FORECAST_DAYS {
            break;
        }
        days.push(DayForecast {
            date: d.date,
            due: 0,
        });
        day = d.succ();
    }

    for card in cards.iter().filter(|c| c.state != CardState::New) {
        let due_date = today.date_of(&card.next_due_at).max(today.date);
        if let Some(slot) = days.iter_mut().find(|f| f.date == due_date) {
            slot.due += 1;
        }
    }
    days
}
