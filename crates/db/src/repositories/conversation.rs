use sqlx::Row;

use modista_core::conversation::StoredMessage;

use super::{unix_now, ConversationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn load(&self, user_id: i64) -> Result<Option<Vec<StoredMessage>>, RepositoryError> {
        let row = sqlx::query("SELECT messages_json FROM conversations WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.get("messages_json");
        // An unreadable row counts as absent, so one corrupt record cannot
        // permanently wedge a user's conversation.
        Ok(serde_json::from_str(&raw).ok())
    }

    async fn save(&self, user_id: i64, messages: &[StoredMessage]) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_string(messages)
            .map_err(|err| RepositoryError::Decode(err.to_string()))?;

        sqlx::query(
            "INSERT INTO conversations (user_id, messages_json, updated_at) \
             VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
               messages_json = excluded.messages_json, \
               updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(encoded)
        .bind(unix_now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
