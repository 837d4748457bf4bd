pub mod client;
pub mod errors;
pub mod types;

pub use client::OpenAiClient;
pub use errors::LlmError;

use async_trait::async_trait;

/// A single-turn language-model call: prompt in, raw reply text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
