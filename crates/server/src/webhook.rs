use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use modista_telegram::api::{ReplySink, SECRET_TOKEN_HEADER};
use modista_telegram::router::MessageRouter;
use modista_telegram::update::Update;

#[derive(Clone)]
pub struct WebhookState {
    pub message_router: Arc<MessageRouter>,
    pub sink: Arc<dyn ReplySink>,
    pub secret: SecretString,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub ok: bool,
}

pub fn router(path: &str, state: WebhookState) -> Router {
    Router::new().route(path, post(webhook)).with_state(state)
}

/// Webhook entry point. The shared-secret header gates everything; a valid
/// delivery is always acknowledged with 200 so Telegram does not redeliver,
/// even when handling the turn failed.
pub async fn webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> (StatusCode, Json<Ack>) {
    let presented = headers.get(SECRET_TOKEN_HEADER).and_then(|value| value.to_str().ok());
    if presented != Some(state.secret.expose_secret()) {
        warn!(event_name = "system.webhook.secret_rejected", "webhook secret mismatch");
        return (StatusCode::FORBIDDEN, Json(Ack { ok: false }));
    }

    let update_id = update.update_id;
    let Some(inbound) = update.into_inbound() else {
        return (StatusCode::OK, Json(Ack { ok: true }));
    };

    let correlation_id = Uuid::new_v4();
    info!(
        event_name = "system.webhook.update_received",
        correlation_id = %correlation_id,
        update_id,
        user_id = inbound.user_id,
        "processing webhook update"
    );

    match state.message_router.handle(inbound.user_id, &inbound.text).await {
        Ok(reply) => {
            if let Err(send_error) = state.sink.send_text(inbound.chat_id, &reply).await {
                error!(
                    event_name = "system.webhook.reply_failed",
                    correlation_id = %correlation_id,
                    chat_id = inbound.chat_id,
                    error = %send_error,
                    "could not deliver reply"
                );
            }
        }
        Err(handle_error) => {
            error!(
                event_name = "system.webhook.turn_failed",
                correlation_id = %correlation_id,
                user_id = inbound.user_id,
                error = %handle_error,
                "message handling failed"
            );
        }
    }

    (StatusCode::OK, Json(Ack { ok: true }))
}
