//! The `kanjiflow deck` subcommands.

use anyhow::Result;
use comfy_table::{Cell, Table};

use kanjiflow_core::policy::PolicyOverrides;
use kanjiflow_core::store::{CardFilter, NewDeck};

use super::{Context, Global, PolicyArgs};

pub async fn create(
    global: &Global,
    name: String,
    description: String,
    policy: PolicyArgs,
) -> Result<()> {
    anyhow::ensure!(!name.trim().is_empty(), "deck name must not be empty");
    let ctx = Context::open(global).await?;
    let overrides = PolicyOverrides::from(policy);
    ctx.check_overrides(&overrides)?;

    let deck = ctx
        .store
        .create_deck(NewDeck {
            name,
            description,
            overrides,
        })
        .await?;
    println!("Created deck '{}' (id {})", deck.name, deck.id);
    Ok(())
}

pub async fn list(global: &Global) -> Result<()> {
    let ctx = Context::open(global).await?;
    let session = ctx.session();
    let decks = ctx.store.list_decks().await?;
    if decks.is_empty() {
        println!("No decks yet. Run `kanjiflow import <file>` or `kanjiflow deck create <name>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Deck", "Cards", "Learning", "Review", "New"]);
    for deck in &decks {
        let total = ctx.store.list_cards(deck.id, CardFilter::all()).await?.len();
        let counts = session.queue_counts(deck.id).await?;
        table.add_row(vec![
            Cell::new(deck.id),
            Cell::new(&deck.name),
            Cell::new(total),
            Cell::new(counts.learning),
            Cell::new(counts.review),
            Cell::new(counts.new),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn set(global: &Global, reference: &str, policy: PolicyArgs) -> Result<()> {
    let ctx = Context::open(global).await?;
    let deck = ctx.deck(reference).await?;
    let overrides = deck.overrides.merge(&PolicyOverrides::from(policy));
    let resolved = ctx.check_overrides(&overrides)?;

    let deck = ctx.store.update_deck_overrides(deck.id, overrides).await?;
    println!("Updated deck '{}' (id {})", deck.name, deck.id);
    println!("  new cards/day:       {}", resolved.new_card_daily_limit);
    println!("  reviews/day:         {}", resolved.review_daily_limit);
    println!("  learning steps:      {:?}", resolved.learning_steps);
    println!("  graduating interval: {}d", resolved.graduating_interval);
    Ok(())
}
