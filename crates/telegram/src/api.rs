use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Header Telegram echoes on every webhook delivery; compared against the
/// configured shared secret before any processing.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bot API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Bot API rejected the call: {description}")]
    Rejected { description: String },
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Outbound side of the transport. The router only ever needs to send text,
/// so this stays the single seam tests stub out.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ApiError>;
}

/// Thin Bot API client over HTTPS.
pub struct BotApi {
    http: reqwest::Client,
    base_url: String,
}

impl BotApi {
    pub fn new(bot_token: &SecretString) -> Result<Self, ApiError> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: format!("https://api.telegram.org/bot{}", bot_token.expose_secret()),
        })
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), ApiError> {
        let reply: ApiReply = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if reply.ok {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                description: reply.description.unwrap_or_else(|| "no description".to_owned()),
            })
        }
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ApiError> {
        self.call("sendMessage", json!({"chat_id": chat_id, "text": text})).await
    }

    pub async fn set_webhook(
        &self,
        url: &str,
        secret: &SecretString,
        drop_pending_updates: bool,
    ) -> Result<(), ApiError> {
        self.call(
            "setWebhook",
            json!({
                "url": url,
                "secret_token": secret.expose_secret(),
                "drop_pending_updates": drop_pending_updates,
            }),
        )
        .await
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), ApiError> {
        self.call("deleteWebhook", json!({"drop_pending_updates": drop_pending_updates})).await
    }
}

#[async_trait]
impl ReplySink for BotApi {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), ApiError> {
        self.send_message(chat_id, text).await
    }
}
