//! Nebius AI Studio provider (OpenAI-compatible chat completions)

use crate::chat::client::{ChatClient, ChatRequest};
use crate::config::{AppConfig, DEFAULT_BASE_URL};
use crate::error::ChatError;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat client for an OpenAI-compatible endpoint. No retries.
pub struct NebiusClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl NebiusClient {
    /// Create a new client against the default endpoint
    pub fn new(api_key: Option<String>) -> Result<Self, ChatError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create with custom base URL
    pub fn with_base_url(api_key: Option<String>, base_url: String) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChatError::Unclassified(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    /// Client for the endpoint and key in `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, ChatError> {
        Self::with_base_url(config.api_key.clone(), config.base_url.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Wire body of a chat completion call
#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    messages: [Message<'a>; 2],
}

impl<'a> From<&'a ChatRequest> for CompletionBody<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        CompletionBody {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
        }
    }
}

/// Maps a non-success HTTP status to the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> ChatError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ChatError::Authentication(status.as_u16())
        }
        StatusCode::NOT_FOUND => ChatError::EndpointNotFound,
        _ => ChatError::Unclassified(format!("HTTP {status}: {body}")),
    }
}

/// Maps a transport failure to the error taxonomy.
pub fn classify_transport(err: &reqwest::Error) -> ChatError {
    if err.is_connect() || err.is_timeout() {
        return ChatError::Connection(err.to_string());
    }
    match err.status() {
        Some(status) => classify_status(status, ""),
        None => ChatError::Unclassified(err.to_string()),
    }
}

impl ChatClient for NebiusClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingCredential)?;

        let body = CompletionBody::from(request);

        debug!(model = %request.model, endpoint = %self.endpoint(), "sending chat request");
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| classify_transport(&e))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let resp_json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ChatError::Unclassified(format!("failed to parse response: {e}")))?;

        resp_json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(ChatError::EmptyResponse)
    }

    fn name(&self) -> &str {
        "nebius"
    }
}
