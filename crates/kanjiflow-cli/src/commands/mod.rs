//! Subcommand implementations and the plumbing they share.

pub mod cards;
pub mod deck;
pub mod import;
pub mod init;
pub mod status;
pub mod study;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use kanjiflow_core::clock::{Clock, FixedClock, SystemClock};
use kanjiflow_core::model::{CardState, Deck, DeckId, Timestamp};
use kanjiflow_core::policy::{DeckPolicy, PolicyOverrides};
use kanjiflow_core::session::StudySession;
use kanjiflow_core::store::Store;
use kanjiflow_store::config::load_config_from;
use kanjiflow_store::{open_store, KanjiflowConfig};

/// Flags accepted by every subcommand.
pub struct Global {
    pub config: Option<PathBuf>,
    pub now: Option<Timestamp>,
}

/// Deck policy flags shared by `deck create` and `deck set`.
#[derive(Args, Debug, Default)]
pub struct PolicyArgs {
    /// New cards introduced per day
    #[arg(long)]
    pub new_per_day: Option<u32>,

    /// Reviews allowed per day (0 = unlimited)
    #[arg(long)]
    pub reviews_per_day: Option<u32>,

    /// Learning steps in minutes, comma-separated (e.g. "10,1440")
    #[arg(long, value_delimiter = ',', conflicts_with = "no_learning_steps")]
    pub steps: Option<Vec<u32>>,

    /// Graduate cards on their first correct answer
    #[arg(long)]
    pub no_learning_steps: bool,

    /// Interval in days given to a card when it graduates
    #[arg(long)]
    pub graduating_interval: Option<u32>,
}

impl From<PolicyArgs> for PolicyOverrides {
    fn from(args: PolicyArgs) -> Self {
        PolicyOverrides {
            new_card_daily_limit: args.new_per_day,
            review_daily_limit: args.reviews_per_day,
            learning_steps: if args.no_learning_steps {
                Some(Vec::new())
            } else {
                args.steps
            },
            graduating_interval: args.graduating_interval,
        }
    }
}

/// Loaded config plus the store and clock it selects.
pub struct Context {
    pub config: KanjiflowConfig,
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    pub async fn open(global: &Global) -> Result<Self> {
        let config = load_config_from(global.config.as_deref())?;
        let store = open_store(&config.store).await?;
        let clock: Arc<dyn Clock> = match global.now {
            Some(now) => Arc::new(FixedClock::new(now)),
            None => Arc::new(SystemClock),
        };
        tracing::debug!(store = store.name(), "opened store");
        Ok(Self {
            config,
            store,
            clock,
        })
    }

    pub fn session(&self) -> StudySession {
        StudySession::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.config.defaults.clone(),
        )
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Look a deck up by numeric id first, then by name.
    pub async fn deck(&self, reference: &str) -> Result<Deck> {
        if let Ok(id) = reference.parse::<u64>() {
            match self.store.get_deck(DeckId(id)).await {
                Ok(deck) => return Ok(deck),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.store
            .find_deck(reference)
            .await?
            .ok_or_else(|| anyhow::anyhow!("deck not found: {reference}"))
    }

    /// Reject overrides that would leave the deck with an unusable policy.
    pub fn check_overrides(&self, overrides: &PolicyOverrides) -> Result<DeckPolicy> {
        let policy = DeckPolicy::resolve(&self.config.defaults, overrides);
        policy.validate()?;
        Ok(policy)
    }
}

/// One-line description of a card's scheduling state.
pub fn describe_state(state: &CardState) -> String {
    match state {
        CardState::New => "new".to_string(),
        CardState::Learning { step } => format!("learning (step {step})"),
        CardState::Review { interval_days } => format!("review ({interval_days}d)"),
    }
}

/// Short timestamp for tables.
pub fn format_due(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}
