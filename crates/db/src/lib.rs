//! Modista DB - SQLite persistence
//!
//! Storage collaborators for the assistant: the product catalog, the rolling
//! per-user conversation history, and append-only intent orders. Each
//! aggregate gets a repository trait with a SQL implementation plus an
//! in-memory one for tests.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
