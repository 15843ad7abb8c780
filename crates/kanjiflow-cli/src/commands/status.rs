//! The `kanjiflow status` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use kanjiflow_core::stats::DeckStats;

use super::{Context, Global};

pub async fn execute(global: &Global, reference: &str, json: bool) -> Result<()> {
    let ctx = Context::open(global).await?;
    let deck = ctx.deck(reference).await?;
    let session = ctx.session();
    let stats = session.stats(deck.id).await?;
    let counters = session.daily_counters(deck.id).await?;
    let policy = session.policy_for(deck.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Deck: {} (id {})", deck.name, deck.id);
    if !deck.description.is_empty() {
        println!("{}", deck.description);
    }
    print_summary(&stats);
    println!(
        "Today: {}/{} new introduced, {}/{} reviews done",
        counters.new_introduced_today,
        policy.new_card_daily_limit,
        counters.reviews_done_today,
        if policy.review_daily_limit == 0 {
            "unlimited".to_string()
        } else {
            policy.review_daily_limit.to_string()
        }
    );
    print_forecast(&stats);
    Ok(())
}

fn print_summary(stats: &DeckStats) {
    let mut table = Table::new();
    table.set_header(vec!["Total", "New", "Learning", "Review", "Mastery", "Avg ease"]);
    table.add_row(vec![
        Cell::new(stats.total),
        Cell::new(stats.new),
        Cell::new(stats.learning),
        Cell::new(stats.review),
        Cell::new(format!("{:.1}%", stats.mastery_percentage)),
        Cell::new(
            stats
                .average_ease
                .map(|e| format!("{e:.2}"))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]);
    println!("{table}");
    println!(
        "Due now: {} learning, {} review, {} new",
        stats.due.learning, stats.due.review, stats.due.new
    );
}

fn print_forecast(stats: &DeckStats) {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Due"]);
    for day in &stats.forecast {
        table.add_row(vec![Cell::new(day.date), Cell::new(day.due)]);
    }
    println!("{table}");
}
