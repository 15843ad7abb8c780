//! The `kanjiflow cards`, `add` and `delete` commands.

use anyhow::{Context as _, Result};
use comfy_table::{Cell, Table};

use kanjiflow_core::deck_file;
use kanjiflow_core::model::{CardId, StateKind};
use kanjiflow_core::store::CardFilter;

use super::{describe_state, format_due, Context, Global};

pub async fn execute(
    global: &Global,
    reference: &str,
    state: Option<StateKind>,
    due_only: bool,
) -> Result<()> {
    let ctx = Context::open(global).await?;
    let deck = ctx.deck(reference).await?;
    let filter = CardFilter {
        state,
        due_on_or_before: due_only.then(|| ctx.now()),
    };
    let cards = ctx.store.list_cards(deck.id, filter).await?;

    if cards.is_empty() {
        println!("No matching cards in '{}'.", deck.name);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Card", "State", "Ease", "Reviews", "Due"]);
    for card in &cards {
        table.add_row(vec![
            Cell::new(card.id),
            Cell::new(card.label()),
            Cell::new(describe_state(&card.state)),
            Cell::new(format!("{:.2}", card.ease_factor)),
            Cell::new(card.reviews),
            Cell::new(format_due(&card.next_due_at)),
        ]);
    }
    println!("{table}");
    println!("{} card(s)", cards.len());
    Ok(())
}

pub async fn add(global: &Global, reference: &str, fields: Vec<(String, String)>) -> Result<()> {
    let ctx = Context::open(global).await?;
    let deck = ctx.deck(reference).await?;
    let payload: serde_json::Map<String, serde_json::Value> = fields
        .into_iter()
        .map(|(key, value)| (key, serde_json::Value::String(value)))
        .collect();

    let card = deck_file::add_card(ctx.store.as_ref(), deck.id, payload.into(), ctx.now())
        .await
        .with_context(|| format!("cannot add card to '{}'", deck.name))?;
    println!("Added card #{} {} to '{}'", card.id, card.label(), deck.name);
    Ok(())
}

pub async fn delete(global: &Global, card_id: CardId) -> Result<()> {
    let ctx = Context::open(global).await?;
    let card = ctx.store.get_card(card_id).await?;
    ctx.store.delete_card(card_id).await?;
    tracing::info!(card = %card_id, deck = %card.deck_id, "deleted card");
    println!("Deleted card #{} {}", card.id, card.label());
    Ok(())
}

/// Parse a `key=value` card field.
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("field name missing in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
