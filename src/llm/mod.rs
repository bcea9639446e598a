pub mod openrouter;

use async_trait::async_trait;

use crate::error::Result;

pub use openrouter::OpenRouterClient;

/// One prompt sent to a language model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a prompt and return the model's text reply.
    ///
    /// Network failures, timeouts and non-2xx responses are errors; the
    /// content of the reply is returned as-is.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model used when a caller has no preference.
    fn default_model(&self) -> &str;
}
