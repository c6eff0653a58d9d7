//! Chat about the model: remote LLM or local keyword answers.
//!
//! [`respond`] never fails. Remote errors come back as a reply carrying the
//! error's title and message plus a hint to switch to local mode.

pub mod client;
pub mod local;
pub mod nebius;

pub use client::{ChatClient, ChatRequest, EXPLAINER_PROMPT};
pub use local::LocalResponder;
pub use nebius::NebiusClient;

use tracing::warn;

pub const FALLBACK_HINT: &str =
    "Consider using local mode (--local) if you're having issues with the API connection.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Remote,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub title: String,
    pub body: String,
    /// Set when the remote call failed.
    pub hint: Option<&'static str>,
}

impl ChatReply {
    pub fn is_error(&self) -> bool {
        self.hint.is_some()
    }
}

pub fn respond(mode: ChatMode, query: &str, model: &str, client: &dyn ChatClient) -> ChatReply {
    match mode {
        ChatMode::Local => ChatReply {
            title: "Chatbot Response (Local Mode)".to_string(),
            body: LocalResponder.respond(query).to_string(),
            hint: None,
        },
        ChatMode::Remote => match client.complete(&ChatRequest::explain(query, model)) {
            Ok(body) => ChatReply {
                title: "Chatbot Response".to_string(),
                body,
                hint: None,
            },
            Err(e) => {
                warn!(client = client.name(), "chat request failed: {e}");
                ChatReply {
                    title: e.title().to_string(),
                    body: e.user_message(),
                    hint: Some(FALLBACK_HINT),
                }
            }
        },
    }
}
