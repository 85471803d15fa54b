use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::RwLock;

use modista_core::conversation::StoredMessage;
use modista_core::domain::order::{Order, OrderPayload, OrderStatus};
use modista_core::domain::product::{CatalogFilter, NewProduct, Product};

use super::{CatalogRepository, ConversationRepository, OrderRepository, RepositoryError};

/// Catalog backed by a vector. `created_at` is a monotonic counter instead of
/// wall-clock seconds so recency ordering is deterministic in tests.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    rows: RwLock<Vec<Product>>,
    clock: AtomicI64,
}

#[async_trait::async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn upsert(&self, product: NewProduct) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;

        if let Some(existing) = rows.iter_mut().find(|row| row.sku == product.sku) {
            let created_at = existing.created_at;
            *existing = materialize(product, created_at);
        } else {
            let created_at = self.clock.fetch_add(1, Ordering::Relaxed);
            rows.push(materialize(product, created_at));
        }

        Ok(())
    }

    async fn search(&self, filter: &CatalogFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Product> =
            rows.iter().filter(|row| matches(row, filter)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched.truncate(filter.limit as usize);
        Ok(matched)
    }
}

fn materialize(product: NewProduct, created_at: i64) -> Product {
    Product {
        sku: product.sku,
        title: product.title,
        description: product.description,
        color: product.color,
        size: product.size,
        price: product.price,
        currency: product.currency,
        url: product.url,
        photo_url: product.photo_url,
        created_at,
    }
}

fn matches(row: &Product, filter: &CatalogFilter) -> bool {
    if !filter.query.is_empty() {
        let needle = filter.query.to_lowercase();
        let hit = row.title.to_lowercase().contains(&needle)
            || row.description.to_lowercase().contains(&needle)
            || row.sku.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }

    if let Some(color) = filter.color.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if !row.color.to_lowercase().contains(&color.to_lowercase()) {
            return false;
        }
    }

    if let Some(size) = filter.size.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        if !row.size.to_lowercase().contains(&size.to_lowercase()) {
            return false;
        }
    }

    true
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    histories: RwLock<HashMap<i64, Vec<StoredMessage>>>,
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn load(&self, user_id: i64) -> Result<Option<Vec<StoredMessage>>, RepositoryError> {
        let histories = self.histories.read().await;
        Ok(histories.get(&user_id).cloned())
    }

    async fn save(&self, user_id: i64, messages: &[StoredMessage]) -> Result<(), RepositoryError> {
        let mut histories = self.histories.write().await;
        histories.insert(user_id, messages.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
    /// Snapshot of every recorded order, for assertions.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(
        &self,
        user_id: i64,
        status: OrderStatus,
        payload: &OrderPayload,
    ) -> Result<i64, RepositoryError> {
        let mut orders = self.orders.write().await;
        let id = orders.len() as i64 + 1;
        orders.push(Order { id, user_id, status, payload: payload.clone(), created_at: 0 });
        Ok(id)
    }
}
