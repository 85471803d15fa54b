//! Modista Agent - the tool-calling conversation loop
//!
//! This crate is the brain of the assistant:
//! - **Wire types** (`llm`) - Responses API context items as a closed tagged
//!   union, plus the `ModelClient` seam with a reqwest-backed OpenAI client
//! - **Tool Executor** (`tools`) - dispatches `search_catalog` and
//!   `create_order_intent` against the storage collaborators
//! - **Conversation Engine** (`engine`) - the bounded request/response/tool
//!   cycle that produces the final reply for a turn
//!
//! # Protocol invariants
//!
//! The model's raw output items are echoed back into the working context
//! verbatim: tool-call identifiers are opaque and model-assigned, and any
//! reconstruction risks a correlation mismatch the model would reject. Each
//! tool result carries the `call_id` of the call it answers. The loop runs at
//! most three round trips per turn.

pub mod engine;
pub mod llm;
pub mod tools;
