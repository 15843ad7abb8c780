//! kanjiflow CLI — study spaced-repetition decks from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use kanjiflow_core::model::{CardId, StateKind, Timestamp};

mod commands;

use commands::{Global, PolicyArgs};

#[derive(Parser)]
#[command(name = "kanjiflow", version, about = "Spaced-repetition kanji study")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true, hide = true, value_parser = parse_timestamp)]
    now: Option<Timestamp>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example deck
    Init,

    /// Manage decks
    Deck {
        #[command(subcommand)]
        action: DeckAction,
    },

    /// Import deck files (.toml or .json) into the store
    Import {
        /// Deck file or directory
        path: PathBuf,
    },

    /// Validate deck files without importing them
    Validate {
        /// Deck file or directory
        path: PathBuf,
    },

    /// Add a single card to a deck
    Add {
        /// Deck name or id
        deck: String,

        /// Card field as key=value, repeatable (e.g. -f front=水 -f back=water)
        #[arg(short, long = "field", required = true, value_parser = commands::cards::parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Delete a card and stop scheduling it
    Delete {
        /// Card id
        card: u64,
    },

    /// Show the next card to study
    Next {
        /// Deck name or id
        deck: String,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// List every card currently eligible, in study order
    Queue {
        /// Deck name or id
        deck: String,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a card with a quality from 0 (blackout) to 5 (perfect)
    Answer {
        /// Card id
        card: u64,

        /// Answer quality
        quality: u8,
    },

    /// Show deck progress and the upcoming workload
    Status {
        /// Deck name or id
        deck: String,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// List cards in a deck
    Cards {
        /// Deck name or id
        deck: String,

        /// Only cards in this state: new, learning, review
        #[arg(long)]
        state: Option<StateKind>,

        /// Only cards due now
        #[arg(long)]
        due: bool,
    },
}

#[derive(Subcommand)]
enum DeckAction {
    /// Create an empty deck
    Create {
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// List decks with their queue sizes
    List,

    /// Change a deck's policy overrides
    Set {
        /// Deck name or id
        deck: String,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    chrono::DateTime::parse_from_rfc3339(s).map_err(|e| format!("invalid RFC 3339 time: {e}"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kanjiflow=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let global = Global {
        config: cli.config,
        now: cli.now,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Deck { action } => match action {
            DeckAction::Create {
                name,
                description,
                policy,
            } => commands::deck::create(&global, name, description, policy).await,
            DeckAction::List => commands::deck::list(&global).await,
            DeckAction::Set { deck, policy } => commands::deck::set(&global, &deck, policy).await,
        },
        Commands::Import { path } => commands::import::execute(&global, path).await,
        Commands::Validate { path } => commands::validate::execute(path),
        Commands::Add { deck, fields } => commands::cards::add(&global, &deck, fields).await,
        Commands::Delete { card } => commands::cards::delete(&global, CardId(card)).await,
        Commands::Next { deck, json } => commands::study::next(&global, &deck, json).await,
        Commands::Queue { deck, json } => commands::study::queue(&global, &deck, json).await,
        Commands::Answer { card, quality } => {
            commands::study::answer(&global, CardId(card), quality).await
        }
        Commands::Status { deck, json } => commands::status::execute(&global, &deck, json).await,
        Commands::Cards { deck, state, due } => {
            commands::cards::execute(&global, &deck, state, due).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
