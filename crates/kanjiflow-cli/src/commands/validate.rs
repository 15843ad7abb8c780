//! The `kanjiflow validate` command.

use std::path::PathBuf;

use anyhow::Result;

use kanjiflow_core::deck_file::{self, DeckFile, ValidationWarning};
use kanjiflow_core::model::payload_label;
use kanjiflow_core::policy::PolicyOverrides;

pub fn execute(path: PathBuf) -> Result<()> {
    let decks = if path.is_dir() {
        deck_file::load_deck_directory(&path)?
    } else {
        vec![deck_file::parse_deck_file(&path)?]
    };

    let mut deck_level = 0;
    let mut card_level = 0;
    for deck in &decks {
        let warnings = deck_file::validate_deck_file(deck);
        let (cards, header): (Vec<_>, Vec<_>) =
            warnings.iter().partition(|w| w.card_index.is_some());

        println!("Deck '{}': {} card(s)", deck.name, deck.cards.len());
        println!("  policy: {}", describe_overrides(&deck.overrides));
        for w in &header {
            println!("  deck: {}", w.message);
        }
        for w in &cards {
            println!("  {}", describe_card_warning(deck, w));
        }

        deck_level += header.len();
        card_level += cards.len();
    }

    let card_total: usize = decks.iter().map(|d| d.cards.len()).sum();
    print!("\nChecked {} deck(s), {card_total} card(s): ", decks.len());
    match deck_level + card_level {
        0 => println!("all valid."),
        total => println!(
            "{total} warning(s) ({deck_level} deck-level, {card_level} card-level)."
        ),
    }

    Ok(())
}

fn describe_card_warning(deck: &DeckFile, warning: &ValidationWarning) -> String {
    let Some(index) = warning.card_index else {
        return warning.message.clone();
    };
    let label = deck
        .cards
        .get(index)
        .and_then(payload_label)
        .unwrap_or_else(|| "untitled".to_string());
    format!("card {} ({label}): {}", index + 1, warning.message)
}

/// `key=value` list of the fields a deck file sets, or "defaults".
fn describe_overrides(overrides: &PolicyOverrides) -> String {
    let mut parts = Vec::new();
    if let Some(n) = overrides.new_card_daily_limit {
        parts.push(format!("new_card_daily_limit={n}"));
    }
    if let Some(n) = overrides.review_daily_limit {
        parts.push(format!("review_daily_limit={n}"));
    }
    if let Some(steps) = &overrides.learning_steps {
        parts.push(format!("learning_steps={steps:?}"));
    }
    if let Some(days) = overrides.graduating_interval {
        parts.push(format!("graduating_interval={days}"));
    }

    if parts.is_empty() {
        "defaults".to_string()
    } else {
        parts.join(", ")
    }
}
