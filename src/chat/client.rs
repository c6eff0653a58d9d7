//! Chat request type and client interface

use crate::error::ChatError;

/// System prompt used for every explanation request.
pub const EXPLAINER_PROMPT: &str = "You are an AI assistant that explains predictions made by a loan approval model. Answer questions about model behavior, important features, and help users understand why certain applications are approved or rejected.";

/// One chat completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,

    /// System message
    pub system: String,

    /// User message
    pub user: String,

    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl ChatRequest {
    /// Create a request with the default sampling parameters
    pub fn new(
        system: impl Into<String>,
        user: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            user: user.into(),
            max_tokens: 512,
            temperature: 0.6,
            top_p: 0.9,
            top_k: 50,
        }
    }

    /// Request an explanation of the loan model
    pub fn explain(user: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(EXPLAINER_PROMPT, user, model)
    }
}

/// Blocking chat completion client
pub trait ChatClient: Send + Sync {
    /// Returns the generated text
    fn complete(&self, request: &ChatRequest) -> Result<String, ChatError>;

    /// Get the name of this client
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explain_request_defaults() {
        let request = ChatRequest::explain("Why was I rejected?", "microsoft/phi-4");

        assert_eq!(request.system, EXPLAINER_PROMPT);
        assert_eq!(request.user, "Why was I rejected?");
        assert_eq!(request.model, "microsoft/phi-4");
        assert_eq!(request.max_tokens, 512);
        assert_eq!(request.temperature, 0.6);
        assert_eq!(request.top_p, 0.9);
        assert_eq!(request.top_k, 50);
    }
}
