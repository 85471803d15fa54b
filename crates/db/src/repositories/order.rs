use modista_core::domain::order::{OrderPayload, OrderStatus};

use super::{unix_now, OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn create(
        &self,
        user_id: i64,
        status: OrderStatus,
        payload: &OrderPayload,
    ) -> Result<i64, RepositoryError> {
        let encoded = serde_json::to_string(payload)
            .map_err(|err| RepositoryError::Decode(err.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO orders (user_id, status, payload_json, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(status.as_str())
        .bind(encoded)
        .bind(unix_now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use modista_core::domain::order::{OrderItem, OrderPayload, OrderStatus};

    use super::SqlOrderRepository;
    use crate::repositories::OrderRepository;
    use crate::{connect_with_settings, migrations};

    fn payload(sku: &str) -> OrderPayload {
        OrderPayload {
            items: vec![OrderItem { sku: sku.to_string(), qty: 1, ..OrderItem::default() }],
            delivery_preference: "courier".to_string(),
            comment: String::new(),
        }
    }

    #[tokio::test]
    async fn orders_get_sequential_ids_and_intent_status() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let repo = SqlOrderRepository::new(pool.clone());

        let first =
            repo.create(42, OrderStatus::Intent, &payload("A1")).await.expect("first order");
        let second =
            repo.create(42, OrderStatus::Intent, &payload("B2")).await.expect("second order");

        assert_eq!(first, 1);
        assert_eq!(second, 2);

        let row = sqlx::query("SELECT status, payload_json FROM orders WHERE id = ?")
            .bind(first)
            .fetch_one(&pool)
            .await
            .expect("fetch order");
        assert_eq!(row.get::<String, _>("status"), "intent");

        let stored: OrderPayload =
            serde_json::from_str(&row.get::<String, _>("payload_json")).expect("payload json");
        assert_eq!(stored, payload("A1"));

        pool.close().await;
    }
}
