//! The `kanjiflow next`, `queue` and `answer` commands.

use anyhow::Result;
use comfy_table::{Cell, Table};

use kanjiflow_core::model::{Card, CardId};
use kanjiflow_core::session::SessionStep;

use super::{describe_state, format_due, Context, Global};

pub async fn next(global: &Global, reference: &str, json: bool) -> Result<()> {
    let ctx = Context::open(global).await?;
    let deck = ctx.deck(reference).await?;
    let session = ctx.session();
    let step = session.next_step(deck.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&step)?);
        return Ok(());
    }

    match &step {
        SessionStep::Study { card } => print_card(card),
        SessionStep::ReviewLimitReached { limit } => {
            println!("Daily review limit of {limit} reached for '{}'.", deck.name);
        }
        SessionStep::Complete => {
            println!("Nothing left to study in '{}' right now.", deck.name);
        }
    }

    let counts = session.queue_counts(deck.id).await?;
    println!(
        "Queue: {} learning, {} review, {} new",
        counts.learning, counts.review, counts.new
    );
    Ok(())
}

pub async fn queue(global: &Global, reference: &str, json: bool) -> Result<()> {
    let ctx = Context::open(global).await?;
    let deck = ctx.deck(reference).await?;
    let cards = ctx.session().upcoming(deck.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }
    if cards.is_empty() {
        println!("Nothing queued in '{}' right now.", deck.name);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Card", "State", "Due"]);
    for (position, card) in cards.iter().enumerate() {
        table.add_row(vec![
            Cell::new(position + 1),
            Cell::new(card.id),
            Cell::new(card.label()),
            Cell::new(describe_state(&card.state)),
            Cell::new(format_due(&card.next_due_at)),
        ]);
    }
    println!("{table}");
    println!("{} card(s) queued in '{}'", cards.len(), deck.name);
    Ok(())
}

pub async fn answer(global: &Global, card_id: CardId, quality: u8) -> Result<()> {
    let ctx = Context::open(global).await?;
    let card = ctx.session().answer(card_id, quality).await?;
    println!(
        "Card #{} {} -> {}, due {} (ease {:.2})",
        card.id,
        card.label(),
        describe_state(&card.state),
        format_due(&card.next_due_at),
        card.ease_factor
    );
    Ok(())
}

fn print_card(card: &Card) {
    println!("Card #{} [{}] {}", card.id, describe_state(&card.state), card.label());
    if let Some(fields) = card.payload.as_object() {
        for (key, value) in fields {
            let text = value
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            println!("  {key}: {text}");
        }
    }
}
