use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no page text to extract from")]
    EmptyInput,

    #[error(transparent)]
    Completion(#[from] LlmError),
}

/// The model's reply, passed through untouched. Usually JSON, never checked.
pub type ExtractionResult = Result<String, ExtractionError>;

/// Fields the model is asked to pull out of a page.
pub const EXTRACTED_FIELDS: [&str; 6] = [
    "Title",
    "Headings",
    "Summary",
    "Important Links",
    "Tables (if any)",
    "Contact info (email, phone)",
];

pub fn build_prompt(page_text: &str) -> String {
    let mut prompt = String::with_capacity(page_text.len() + 320);
    prompt.push_str("You are a web data extractor.\nHere is the content of a webpage:\n\n");
    prompt.push_str(page_text);
    prompt.push_str("\n\nPlease extract structured data:\n");
    for field in EXTRACTED_FIELDS {
        prompt.push_str("- ");
        prompt.push_str(field);
        prompt.push('\n');
    }
    prompt.push_str("\nReturn as JSON.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_full_text_and_asks_for_json() {
        let text = "Acme Corp\nCall us at 555-0100 or mail hello@acme.test";
        let prompt = build_prompt(text);

        assert!(prompt.contains(text));
        for field in EXTRACTED_FIELDS {
            assert!(prompt.contains(field), "missing field {field}");
        }
        assert!(prompt.ends_with("Return as JSON."));
    }

    #[test]
    fn completion_errors_display_transparently() {
        let err: ExtractionError = LlmError::Timeout.into();
        assert_eq!(err.to_string(), "completion request timed out");
    }
}
