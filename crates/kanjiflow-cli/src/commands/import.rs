//! The `kanjiflow import` command.

use std::path::PathBuf;

use anyhow::Result;

use kanjiflow_core::deck_file::{self, import_deck};

use super::{Context, Global};

pub async fn execute(global: &Global, path: PathBuf) -> Result<()> {
    let decks = if path.is_dir() {
        deck_file::load_deck_directory(&path)?
    } else {
        vec![deck_file::parse_deck_file(&path)?]
    };
    anyhow::ensure!(!decks.is_empty(), "no deck files found in {}", path.display());

    let ctx = Context::open(global).await?;
    for deck in &decks {
        ctx.check_overrides(&deck.overrides)?;
        let warnings = deck_file::validate_deck_file(deck);
        if !warnings.is_empty() {
            eprintln!(
                "Warning: {} has {} validation warning(s); run `kanjiflow validate` for details",
                deck.name,
                warnings.len()
            );
        }

        let summary = import_deck(ctx.store.as_ref(), deck, ctx.now()).await?;
        let verb = if summary.deck_created {
            "Created"
        } else {
            "Updated"
        };
        println!(
            "{verb} deck '{}' (id {}): {} card(s) imported, {} duplicate(s) skipped",
            summary.deck_name, summary.deck_id, summary.created, summary.skipped
        );
    }

    Ok(())
}
