use serde::{Deserialize, Serialize};

/// Lifecycle status of an order record. Only `Intent` (a recorded but
/// unconfirmed purchase request) is produced by this system; the enum leaves
/// room for downstream fulfilment states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Intent,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intent => "intent",
        }
    }
}

/// One requested line in an intent order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    #[serde(default = "default_qty")]
    pub qty: u32,
}

fn default_qty() -> u32 {
    1
}

/// The structured payload persisted with an order row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub delivery_preference: String,
    #[serde(default)]
    pub comment: String,
}

/// A persisted order. Append-only: no update or delete operation exists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    pub payload: OrderPayload,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{OrderItem, OrderStatus};

    #[test]
    fn status_serializes_as_lowercase_literal() {
        let json = serde_json::to_value(OrderStatus::Intent).expect("serialize status");
        assert_eq!(json, serde_json::json!("intent"));
        assert_eq!(OrderStatus::Intent.as_str(), "intent");
    }

    #[test]
    fn item_quantity_defaults_to_one() {
        let item: OrderItem =
            serde_json::from_value(serde_json::json!({"sku": "A1"})).expect("parse item");
        assert_eq!(item.qty, 1);
        assert!(item.color.is_empty());
    }
}
