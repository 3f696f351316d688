//! family-dictionary - A shared family dictionary of words and expressions
//!
//! This crate provides:
//! - A REST API for words and expressions with optional image/audio attachments
//! - Swappable entry storage backends (Postgres, embedded redb)
//! - A shared-access-code check gating the client experience
//! - A typed client library with session, search, recording and view state

pub mod api;
pub mod client;
pub mod config;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use storage::EntryStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn EntryStore>,
}
