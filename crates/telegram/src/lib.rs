//! Modista Telegram - bot transport and message routing
//!
//! The Telegram-facing edge of the assistant:
//! - **Bot API client** (`api`) - `sendMessage`, `setWebhook`, `deleteWebhook`
//!   over HTTPS, plus the `ReplySink` seam the webhook handler sends through
//! - **Updates** (`update`) - inbound webhook payload types and the
//!   extraction of `(user_id, chat_id, text)` from them
//! - **Commands** (`commands`) - leading-token classification and the
//!   pipe-delimited `/add` payload parser
//! - **Router** (`router`) - maps a classified inbound message to one of the
//!   four behaviors and owns per-user turn serialization

pub mod api;
pub mod commands;
pub mod router;
pub mod update;
