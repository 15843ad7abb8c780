//! Deck file parser and importer.
//!
//! Loads card content from TOML or JSON files, validates it, and imports it
//! into a [`Store`]. Two layouts are accepted:
//!
//! ```toml
//! [deck]
//! name = "JLPT N5"
//! description = "Core kanji"
//!
//! [deck.policy]
//! new_card_daily_limit = 10
//!
//! [[cards]]
//! front = "水"
//! back = "water"
//! ```
//!
//! or, for `.json` files, either the same shape or a bare array of card
//! objects, in which case the deck is named after the file stem.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Card, DeckId, Timestamp, MAX_INTERVAL_DAYS};
use crate::policy::PolicyOverrides;
use crate::store::{CardFilter, NewCard, NewDeck, Store};

/// A parsed deck file.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckFile {
    pub name: String,
    pub description: String,
    pub overrides: PolicyOverrides,
    /// Card payloads in file order.
    pub cards: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawDeckFile {
    deck: RawDeckHeader,
    #[serde(default)]
    cards: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawDeckHeader {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    policy: PolicyOverrides,
}

impl From<RawDeckFile> for DeckFile {
    fn from(raw: RawDeckFile) -> Self {
        DeckFile {
            name: raw.deck.name,
            description: raw.deck.description,
            overrides: raw.deck.policy,
            cards: raw.cards,
        }
    }
}

/// Parse a single deck file, choosing the format from its extension.
pub fn parse_deck_file(path: &Path) -> Result<DeckFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read deck file: {}", path.display()))?;

    parse_deck_str(&content, path)
}

/// Parse deck file contents; `source_path` picks the format and names bare JSON arrays.
pub fn parse_deck_str(content: &str, source_path: &Path) -> Result<DeckFile> {
    let is_json = source_path.extension().is_some_and(|ext| ext == "json");
    if !is_json {
        let raw: RawDeckFile = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
        return Ok(raw.into());
    }

    let value: serde_json::Value = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
    match value {
        serde_json::Value::Array(cards) => {
            let name = source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    anyhow::anyhow!("cannot name deck from path: {}", source_path.display())
                })?;
            Ok(DeckFile {
                name,
                description: String::new(),
                overrides: PolicyOverrides::default(),
                cards,
            })
        }
        other => {
            let raw: RawDeckFile = serde_json::from_value(other)
                .with_context(|| format!("invalid deck layout: {}", source_path.display()))?;
            Ok(raw.into())
        }
    }
}

/// Recursively load all `.toml` and `.json` deck files from a directory.
pub fn load_deck_directory(dir: &Path) -> Result<Vec<DeckFile>> {
    let mut decks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            decks.extend(load_deck_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_deck_file(&path) {
                Ok(deck) => decks.push(deck),
                Err(e) => {
                    tracing::warn!("skipping {}: {e:#}", path.display());
                }
            }
        }
    }

    Ok(decks)
}

/// A warning from deck file validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Zero-based card index (if applicable).
    pub card_index: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Validate a deck file for common issues.
pub fn validate_deck_file(deck: &DeckFile) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let deck_warning = |message: String| ValidationWarning {
        card_index: None,
        message,
    };

    if deck.name.trim().is_empty() {
        warnings.push(deck_warning("deck name is empty".into()));
    }
    if deck.cards.is_empty() {
        warnings.push(deck_warning("deck has no cards".into()));
    }

    if let Some(steps) = &deck.overrides.learning_steps {
        for (i, step) in steps.iter().enumerate() {
            if *step == 0 {
                warnings.push(deck_warning(format!("learning step {i} is zero minutes")));
            }
        }
    }
    match deck.overrides.graduating_interval {
        Some(0) => warnings.push(deck_warning(
            "graduating_interval is 0; must be at least 1 day".into(),
        )),
        Some(days) if days > MAX_INTERVAL_DAYS => warnings.push(deck_warning(format!(
            "graduating_interval is {days}; the maximum is {MAX_INTERVAL_DAYS} days"
        ))),
        _ => {}
    }
    if deck.overrides.new_card_daily_limit == Some(0) {
        warnings.push(deck_warning(
            "new_card_daily_limit is 0; no new cards will be introduced".into(),
        ));
    }

    let mut seen = HashSet::new();
    for (i, card) in deck.cards.iter().enumerate() {
        let empty = match card {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if empty {
            warnings.push(ValidationWarning {
                card_index: Some(i),
                message: "card payload is empty".into(),
            });
            continue;
        }
        if !seen.insert(card.to_string()) {
            warnings.push(ValidationWarning {
                card_index: Some(i),
                message: "duplicate card payload".into(),
            });
        }
    }

    warnings
}

/// Outcome of importing one deck file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub deck_id: DeckId,
    pub deck_name: String,
    /// Whether the deck was created by this import.
    pub deck_created: bool,
    pub created: usize,
    /// Cards skipped because an identical payload already exists in the deck.
    pub skipped: usize,
}

/// Import a deck file into `store`.
///
/// Reuses an existing deck of the same name; its overrides are left alone.
/// Cards whose payload already exists in the deck are skipped.
pub async fn import_deck(
    store: &dyn Store,
    deck: &DeckFile,
    now: Timestamp,
) -> Result<ImportSummary> {
    let (target, deck_created) = match store.find_deck(&deck.name).await? {
        Some(existing) => (existing, false),
        None => {
            let created = store
                .create_deck(NewDeck {
                    name: deck.name.clone(),
                    description: deck.description.clone(),
                    overrides: deck.overrides.clone(),
                })
                .await
                .with_context(|| format!("failed to create deck '{}'", deck.name))?;
            (created, true)
        }
    };

    let mut existing = existing_payloads(store, target.id).await?;

    let mut created = 0usize;
    let mut skipped = 0usize;
    for payload in &deck.cards {
        if !existing.insert(payload.to_string()) {
            skipped += 1;
            continue;
        }
        store
            .create_card(
                NewCard {
                    deck_id: target.id,
                    payload: payload.clone(),
                },
                now,
            )
            .await?;
        created += 1;
    }

    tracing::info!(
        deck = %target.name,
        created,
        skipped,
        "imported deck file"
    );

    Ok(ImportSummary {
        deck_id: target.id,
        deck_name: target.name,
        deck_created,
        created,
        skipped,
    })
}

/// Add a single card to a deck, refusing a payload the deck already holds.
pub async fn add_card(
    store: &dyn Store,
    deck_id: DeckId,
    payload: serde_json::Value,
    now: Timestamp,
) -> Result<Card> {
    if !matches!(payload.as_object(), Some(fields) if !fields.is_empty()) {
        anyhow::bail!("card payload must have at least one field");
    }
    if existing_payloads(store, deck_id)
        .await?
        .contains(&payload.to_string())
    {
        anyhow::bail!("deck {deck_id} already has a card with this content");
    }

    let card = store.create_card(NewCard { deck_id, payload }, now).await?;
    tracing::info!(deck = %deck_id, card = %card.id, "added card");
    Ok(card)
}

async fn existing_payloads(store: &dyn Store, deck_id: DeckId) -> Result<HashSet<String>> {
    Ok(store
        .list_cards(deck_id, CardFilter::all())
        .await?
        .iter()
        .map(|c| c.payload.to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[deck]
name = "JLPT N5"
description = "Core kanji"

[deck.policy]
new_card_daily_limit = 10
learning_steps = [1, 10]

[[cards]]
front = "水"
back = "water"
onyomi = "スイ"

[[cards]]
front = "火"
back = "fire"
"#;

    #[test]
    fn parse_valid_toml() {
        let deck = parse_deck_str(VALID_TOML, &PathBuf::from("n5.toml")).unwrap();
        assert_eq!(deck.name, "JLPT N5");
        assert_eq!(deck.description, "Core kanji");
        assert_eq!(deck.overrides.new_card_daily_limit, Some(10));
        assert_eq!(deck.overrides.learning_steps, Some(vec![1, 10]));
        assert!(deck.overrides.graduating_interval.is_none());
        assert_eq!(deck.cards.len(), 2);
        assert_eq!(deck.cards[0]["front"], "水");
        assert_eq!(deck.cards[0]["onyomi"], "スイ");
        assert!(validate_deck_file(&deck).is_empty());
    }

    #[test]
    fn parse_bare_json_array_names_deck_after_file() {
        let json = r#"[{"character": "日", "meaning": "sun"}, {"character": "月", "meaning": "moon"}]"#;
        let deck = parse_deck_str(json, &PathBuf::from("kanji_data/top100_kanji.json")).unwrap();
        assert_eq!(deck.name, "top100_kanji");
        assert_eq!(deck.cards.len(), 2);
        assert!(deck.overrides.is_empty());
    }

    #[test]
    fn parse_json_with_header() {
        let json = r#"{"deck": {"name": "Verbs", "policy": {"graduating_interval": 2}}, "cards": [{"front": "食べる"}]}"#;
        let deck = parse_deck_str(json, &PathBuf::from("verbs.json")).unwrap();
        assert_eq!(deck.name, "Verbs");
        assert_eq!(deck.overrides.graduating_interval, Some(2));
        assert_eq!(deck.cards.len(), 1);
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_deck_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_problems() {
        let toml = r#"
[deck]
name = "Broken"

[deck.policy]
learning_steps = [10, 0]
graduating_interval = 0

[[cards]]
front = "a"

[[cards]]
front = "a"

[[cards]]
"#;
        let deck = parse_deck_str(toml, &PathBuf::from("broken.toml")).unwrap();
        let warnings = validate_deck_file(&deck);
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("learning step 1")));
        assert!(messages.iter().any(|m| m.contains("graduating_interval is 0")));
        assert!(warnings
            .iter()
            .any(|w| w.card_index == Some(1) && w.message.contains("duplicate")));
        assert!(warnings
            .iter()
            .any(|w| w.card_index == Some(2) && w.message.contains("empty")));
    }

    #[test]
    fn validate_flags_graduating_interval_past_the_cap() {
        let toml = r#"
[deck]
name = "Slow"

[deck.policy]
graduating_interval = 100000

[[cards]]
front = "a"
"#;
        let deck = parse_deck_str(toml, &PathBuf::from("slow.toml")).unwrap();
        let warnings = validate_deck_file(&deck);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("maximum is 36500 days"));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("n5.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not [valid").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("extra");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("colors.json"), r#"[{"front": "赤"}]"#).unwrap();

        let decks = load_deck_directory(dir.path()).unwrap();
        let names: Vec<&str> = decks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["colors", "JLPT N5"]);
    }
}
