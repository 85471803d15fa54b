use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use modista_core::domain::order::{OrderItem, OrderPayload, OrderStatus};
use modista_core::domain::product::{CatalogFilter, DEFAULT_SEARCH_LIMIT};
use modista_db::repositories::{CatalogRepository, OrderRepository, RepositoryError};

use crate::llm::ToolSpec;

pub const SEARCH_CATALOG: &str = "search_catalog";
pub const CREATE_ORDER_INTENT: &str = "create_order_intent";

/// The schemas the model is told to honor. Matches the executor's argument
/// structs field for field.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            kind: "function",
            name: SEARCH_CATALOG,
            description: "Searches the shop catalog by free-text query, color and size.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "color": {"type": "string"},
                    "size": {"type": "string"},
                    "limit": {"type": "integer", "default": DEFAULT_SEARCH_LIMIT}
                },
                "required": []
            }),
        },
        ToolSpec {
            kind: "function",
            name: CREATE_ORDER_INTENT,
            description:
                "Records a purchase intent with the selected items and the customer's wishes.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "user_id": {"type": "integer"},
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "sku": {"type": "string"},
                                "color": {"type": "string"},
                                "size": {"type": "string"},
                                "qty": {"type": "integer", "default": 1}
                            },
                            "required": ["sku"]
                        }
                    },
                    "delivery_preference": {"type": "string"},
                    "comment": {"type": "string"}
                },
                "required": ["user_id", "items"]
            }),
        },
    ]
}

#[derive(Debug, Default, Deserialize)]
struct SearchCatalogArgs {
    #[serde(default)]
    query: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

#[derive(Debug, Default, Deserialize)]
struct CreateOrderIntentArgs {
    #[serde(default)]
    user_id: i64,
    #[serde(default)]
    items: Vec<OrderItem>,
    #[serde(default)]
    delivery_preference: String,
    #[serde(default)]
    comment: String,
}

/// Closed dispatch over the known tools; the fallback arm preserves the
/// unknown-tool error contract without reflection.
enum ToolRequest {
    SearchCatalog(SearchCatalogArgs),
    CreateOrderIntent(CreateOrderIntentArgs),
    Unknown { name: String },
}

impl ToolRequest {
    fn parse(name: &str, arguments: Value) -> Self {
        match name {
            SEARCH_CATALOG => {
                Self::SearchCatalog(serde_json::from_value(arguments).unwrap_or_default())
            }
            CREATE_ORDER_INTENT => {
                Self::CreateOrderIntent(serde_json::from_value(arguments).unwrap_or_default())
            }
            other => Self::Unknown { name: other.to_owned() },
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("could not encode tool output: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Executes one named tool call against the storage collaborators. No retries:
/// persistence failures propagate and abort the loop iteration.
pub struct ToolExecutor {
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl ToolExecutor {
    pub fn new(catalog: Arc<dyn CatalogRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { catalog, orders }
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        match ToolRequest::parse(name, arguments) {
            ToolRequest::SearchCatalog(args) => {
                let filter = CatalogFilter {
                    query: args.query,
                    color: args.color,
                    size: args.size,
                    limit: args.limit,
                };
                let rows = self.catalog.search(&filter).await?;
                Ok(serde_json::to_value(rows)?)
            }
            ToolRequest::CreateOrderIntent(args) => {
                let payload = OrderPayload {
                    items: args.items,
                    delivery_preference: args.delivery_preference,
                    comment: args.comment,
                };
                let order_id =
                    self.orders.create(args.user_id, OrderStatus::Intent, &payload).await?;
                Ok(json!({"order_id": order_id, "status": "intent"}))
            }
            ToolRequest::Unknown { name } => Ok(json!({"error": format!("Unknown tool: {name}")})),
        }
    }
}
