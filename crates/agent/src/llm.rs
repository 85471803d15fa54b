use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use modista_core::config::LlmConfig;
use modista_core::conversation::{ChatRole, StoredMessage};

/// One item of the model context: a plain message, a model-initiated tool
/// call, or the output answering one. `Unsupported` absorbs item kinds this
/// loop does not interpret (reasoning traces and the like); such items are
/// never echoed back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextItem {
    Message { role: String, content: MessageContent },
    FunctionCall { call_id: String, name: String, arguments: String },
    FunctionCallOutput { call_id: String, output: String },
    #[serde(other)]
    Unsupported,
}

impl ContextItem {
    pub fn message(role: ChatRole, content: impl Into<String>) -> Self {
        Self::Message {
            role: role.as_str().to_owned(),
            content: MessageContent::Text(content.into()),
        }
    }

    pub fn from_stored(stored: &StoredMessage) -> Self {
        Self::Message {
            role: stored.role.as_str().to_owned(),
            content: MessageContent::Text(stored.content.clone()),
        }
    }
}

/// Message content arrives either as a bare string (our own input) or as an
/// array of typed parts (model output).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl MessageContent {
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => {
                parts.iter().map(|part| part.text.as_str()).collect::<Vec<_>>().join("")
            }
        }
    }
}

/// Declared schema of one tool offered to the model.
#[derive(Clone, Debug, Serialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

/// A parsed model response: the ordered output items plus a flattened view of
/// the textual ones.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelResponse {
    pub output: Vec<ContextItem>,
}

impl ModelResponse {
    /// Convenience flattening of every message item, in emission order.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                ContextItem::Message { content, .. } => Some(content.flatten()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("could not decode model response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Seam between the conversation engine and the generative model, so tests
/// can script responses without a network.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn respond(
        &self,
        input: &[ContextItem],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse, LlmError>;
}

/// Responses API client. One POST per round trip; no retries here, failures
/// propagate and abort the turn.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a [ContextItem],
    tools: &'a [ToolSpec],
}

#[derive(Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<ContextItem>,
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn respond(
        &self,
        input: &[ContextItem],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse, LlmError> {
        let request = ResponsesRequest { model: &self.model, input, tools };

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        let parsed: ResponsesBody = serde_json::from_str(&body)?;
        Ok(ModelResponse { output: parsed.output })
    }
}
