pub mod model;

pub use model::{ExtractionError, ExtractionResult, build_prompt};

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::llm::CompletionClient;

/// Turns page text into the model's structured description of the page.
#[derive(Clone)]
pub struct ContentExtractor {
    client: Arc<dyn CompletionClient>,
}

impl ContentExtractor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    #[instrument(skip_all, fields(text_chars = page_text.len()))]
    pub async fn extract(&self, page_text: &str) -> ExtractionResult {
        if page_text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let prompt = build_prompt(page_text);
        match self.client.complete(&prompt).await {
            Ok(payload) => {
                debug!(payload_chars = payload.len(), "extraction complete");
                Ok(payload)
            }
            Err(e) => {
                warn!(error = %e, "extraction failed");
                Err(e.into())
            }
        }
    }
}
