//! kanjiflow-core — Spaced-repetition scheduling engine, queue selection, and quotas.
//!
//! This crate defines the card data model, the SM-2 style scheduler, the
//! next-card selection rules, and the storage trait the rest of kanjiflow
//! builds on.

pub mod clock;
pub mod counters;
pub mod deck_file;
pub mod error;
pub mod model;
pub mod policy;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod stats;
pub mod store;
