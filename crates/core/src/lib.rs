//! Modista Core - domain model and configuration
//!
//! Shared foundation for the modista workspace:
//! - **Domain types** (`domain`) - catalog products and intent orders
//! - **Conversation history** (`conversation`) - rolling per-user message log
//!   with the truncation window applied before every model invocation
//! - **Configuration** (`config`) - layered loading (defaults, `modista.toml`,
//!   `MODISTA_*` environment variables, programmatic overrides) with fail-fast
//!   validation and secrets kept behind `SecretString`
//!
//! This crate is deliberately free of I/O: persistence lives in `modista-db`,
//! the model loop in `modista-agent`, transports in `modista-telegram` and
//! `modista-server`.

pub mod config;
pub mod conversation;
pub mod domain;
