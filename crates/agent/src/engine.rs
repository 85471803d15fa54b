use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use modista_core::conversation::{ChatRole, StoredMessage};

use crate::llm::{ContextItem, LlmError, ModelClient};
use crate::tools::{tool_specs, ToolError, ToolExecutor};

/// Hard cap on model invocations per turn. Keeps a looping or misbehaving
/// model from stalling the turn or running up unbounded cost.
pub const MAX_ROUND_TRIPS: usize = 3;

/// Returned when the model finishes without tool calls but with empty text.
pub const CLARIFY_FALLBACK: &str =
    "Can you clarify what we're looking for: clothing type, occasion, approximate budget?";

/// Returned when the round-trip budget runs out without a final answer.
pub const ROUND_TRIP_FALLBACK: &str =
    "Let's clarify a couple of details — occasion, color, budget — and I'll suggest options.";

/// Policy prompt prepended to every model invocation; never persisted.
pub const SYSTEM_PROMPT: &str = "\
You are the sales manager of an online clothing shop.
Your style: friendly, to the point, no pressure, like a real person.

Goals:
1) Carefully work out the need: who it is for, style and occasion, budget, color, fit and fabric preferences, timing.
2) Pick options from the catalog (never invent products).
3) Guide the customer to a purchase: confirm sku, color and size, offer the one or two best options, handle objections.
4) Always ask for the preferred delivery or pickup method and timing (courier, pickup point, in-store).
5) When the customer is ready to buy, record the order intent.

Constraints:
- If nothing in the catalog fits, say so honestly and ask about alternatives.
- Size estimation is not implemented yet: you may only ask for measurements and say a precise fit calculation will come later.";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("could not encode tool output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Orchestrates the bounded request/response/tool-call cycle for one turn.
/// The caller supplies an already-truncated history that contains no
/// unresolved tool calls.
pub struct ConversationEngine {
    model: Arc<dyn ModelClient>,
    tools: ToolExecutor,
}

impl ConversationEngine {
    pub fn new(model: Arc<dyn ModelClient>, tools: ToolExecutor) -> Self {
        Self { model, tools }
    }

    pub async fn converse(
        &self,
        user_id: i64,
        history: &[StoredMessage],
    ) -> Result<String, EngineError> {
        let specs = tool_specs();

        let mut context: Vec<ContextItem> = Vec::with_capacity(history.len() + 1);
        context.push(ContextItem::message(ChatRole::System, SYSTEM_PROMPT));
        context.extend(history.iter().map(ContextItem::from_stored));

        for round_trip in 1..=MAX_ROUND_TRIPS {
            let response = self.model.respond(&context, &specs).await?;
            let text = response.output_text();

            // Echo the model's own output items back verbatim: call_ids are
            // model-assigned and must survive for result correlation.
            let mut calls: Vec<(String, String, String)> = Vec::new();
            for item in response.output {
                if let ContextItem::FunctionCall { call_id, name, arguments } = &item {
                    calls.push((call_id.clone(), name.clone(), arguments.clone()));
                }
                if !matches!(item, ContextItem::Unsupported) {
                    context.push(item);
                }
            }

            if calls.is_empty() {
                let text = text.trim();
                debug!(
                    event_name = "agent.converse.final",
                    user_id,
                    round_trip,
                    empty = text.is_empty(),
                    "model produced a final answer"
                );
                return Ok(if text.is_empty() {
                    CLARIFY_FALLBACK.to_owned()
                } else {
                    text.to_owned()
                });
            }

            for (call_id, name, arguments) in calls {
                // Malformed arguments degrade to an empty set instead of
                // failing the turn; the model can recover on the next pass.
                let args: Value = serde_json::from_str(&arguments).unwrap_or_else(|_| {
                    warn!(
                        event_name = "agent.converse.malformed_arguments",
                        user_id,
                        tool = %name,
                        "tool arguments were not valid JSON; substituting empty set"
                    );
                    Value::Object(serde_json::Map::new())
                });

                let output = self.tools.execute(&name, args).await?;
                context.push(ContextItem::FunctionCallOutput {
                    call_id,
                    output: serde_json::to_string(&output)?,
                });
            }

            debug!(
                event_name = "agent.converse.round_trip",
                user_id, round_trip, "tool round trip completed"
            );
        }

        debug!(
            event_name = "agent.converse.budget_exhausted",
            user_id, "round-trip budget exhausted without a final answer"
        );
        Ok(ROUND_TRIP_FALLBACK.to_owned())
    }
}
