//! kanjiflow-store — Storage backends and configuration.
//!
//! Implements the `Store` trait from `kanjiflow-core` in memory and as a
//! JSON snapshot file, and loads the `kanjiflow.toml` configuration that
//! picks between them.

pub mod config;
pub mod json_file;
pub mod memory;
mod state;

pub use config::{load_config_from, open_store, KanjiflowConfig, StoreConfig};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
