use async_trait::async_trait;
use thiserror::Error;

use modista_core::conversation::StoredMessage;
use modista_core::domain::order::{OrderPayload, OrderStatus};
use modista_core::domain::product::{CatalogFilter, NewProduct, Product};

pub mod catalog;
pub mod conversation;
pub mod memory;
pub mod order;

pub use catalog::SqlCatalogRepository;
pub use conversation::SqlConversationRepository;
pub use memory::{InMemoryCatalogRepository, InMemoryConversationRepository, InMemoryOrderRepository};
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Product catalog: upsert keyed on sku, substring search ordered
/// most-recently-created first.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn upsert(&self, product: NewProduct) -> Result<(), RepositoryError>;
    async fn search(&self, filter: &CatalogFilter) -> Result<Vec<Product>, RepositoryError>;
}

/// Rolling per-user conversation history. Saving an empty slice is the reset
/// operation; there is no delete.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn load(&self, user_id: i64) -> Result<Option<Vec<StoredMessage>>, RepositoryError>;
    async fn save(&self, user_id: i64, messages: &[StoredMessage]) -> Result<(), RepositoryError>;
}

/// Append-only order records. Returns the newly assigned sequential id.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(
        &self,
        user_id: i64,
        status: OrderStatus,
        payload: &OrderPayload,
    ) -> Result<i64, RepositoryError>;
}

pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
