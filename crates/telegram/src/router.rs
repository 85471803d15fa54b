use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

use modista_agent::engine::{ConversationEngine, EngineError};
use modista_core::conversation::{truncate_history, StoredMessage};
use modista_core::domain::product::NewProduct;
use modista_db::repositories::{CatalogRepository, ConversationRepository, RepositoryError};

use crate::commands::{parse_add_payload, parse_command, Command};

pub const GREETING: &str = "Hi! I'm the sales assistant of our clothing shop.\n\
Tell me what you're looking for (say: a winter hoodie, black, under 60) and I'll pick out options.";

pub const ADMIN_ONLY: &str = "This command is available to shop administrators only.";

pub const ADD_USAGE: &str =
    "Format:\n/add SKU | Title | Color | Size | Price | Description (optional)";

pub const RESET_CONFIRMATION: &str = "Conversation cleared. Tell me what you're looking for.";

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Maps an inbound message to one of the four behaviors and persists the
/// conversation effects. History-mutating paths hold the caller's turn gate,
/// so two rapid messages from one user cannot interleave.
pub struct MessageRouter {
    engine: ConversationEngine,
    conversations: Arc<dyn ConversationRepository>,
    catalog: Arc<dyn CatalogRepository>,
    admins: BTreeSet<i64>,
    gates: TurnGates,
}

impl MessageRouter {
    pub fn new(
        engine: ConversationEngine,
        conversations: Arc<dyn ConversationRepository>,
        catalog: Arc<dyn CatalogRepository>,
        admin_ids: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            engine,
            conversations,
            catalog,
            admins: admin_ids.into_iter().collect(),
            gates: TurnGates::default(),
        }
    }

    pub async fn handle(&self, user_id: i64, text: &str) -> Result<String, RouterError> {
        match parse_command(text) {
            Command::Start => Ok(GREETING.to_owned()),
            Command::Add { payload } => self.handle_add(user_id, &payload).await,
            Command::Reset => self.handle_reset(user_id).await,
            Command::Chat { text } => self.handle_chat(user_id, &text).await,
        }
    }

    async fn handle_add(&self, user_id: i64, payload: &str) -> Result<String, RouterError> {
        if !self.admins.contains(&user_id) {
            return Ok(ADMIN_ONLY.to_owned());
        }

        let draft = match parse_add_payload(payload) {
            Ok(draft) => draft,
            Err(_) => return Ok(ADD_USAGE.to_owned()),
        };

        let sku = draft.sku.clone();
        self.catalog
            .upsert(NewProduct {
                sku: draft.sku,
                title: draft.title,
                description: draft.description,
                color: draft.color,
                size: draft.size,
                price: draft.price,
                currency: DEFAULT_CURRENCY.to_owned(),
                url: String::new(),
                photo_url: String::new(),
            })
            .await?;

        info!(event_name = "telegram.router.catalog_upsert", user_id, sku = %sku, "catalog row upserted");
        Ok(format!("Done, product {sku} has been added/updated."))
    }

    async fn handle_reset(&self, user_id: i64) -> Result<String, RouterError> {
        let _gate = self.gates.acquire(user_id).await;
        self.conversations.save(user_id, &[]).await?;
        Ok(RESET_CONFIRMATION.to_owned())
    }

    async fn handle_chat(&self, user_id: i64, text: &str) -> Result<String, RouterError> {
        let _gate = self.gates.acquire(user_id).await;

        let mut history = self.conversations.load(user_id).await?.unwrap_or_default();
        history.push(StoredMessage::user(text));
        truncate_history(&mut history);

        let reply = self.engine.converse(user_id, &history).await?;

        history.push(StoredMessage::assistant(reply.clone()));
        truncate_history(&mut history);
        self.conversations.save(user_id, &history).await?;

        Ok(reply)
    }
}

/// One async mutex per user id; at most one in-flight turn per user. Idle
/// gates are evicted on the next acquire, so the map stays proportional to
/// the number of users with a turn in flight.
#[derive(Default)]
struct TurnGates {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl TurnGates {
    async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let gate = {
            let mut locks = self.locks.lock().await;
            // A count of 1 means no holder and no waiter; the next turn for
            // that user recreates its gate.
            locks.retain(|_, gate| Arc::strong_count(gate) > 1);
            locks.entry(user_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        gate.lock_owned().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
