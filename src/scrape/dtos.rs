use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScrapeMultipleRequest {
    pub urls: Vec<String>,
}

impl ScrapeMultipleRequest {
    pub fn validate(&self, max_urls: usize) -> Result<(), String> {
        if self.urls.is_empty() {
            return Err("urls must contain at least one URL".to_string());
        }
        if self.urls.len() > max_urls {
            return Err(format!(
                "too many urls: {} submitted, at most {} allowed",
                self.urls.len(),
                max_urls
            ));
        }
        if let Some(index) = self.urls.iter().position(|u| u.len() > MAX_URL_LENGTH) {
            return Err(format!("url at index {} is too long", index));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScrapeRequest {
    pub url: String,
}

impl ScrapeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        if self.url.len() > MAX_URL_LENGTH {
            return Err("URL too long".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(urls: &[&str]) -> ScrapeMultipleRequest {
        ScrapeMultipleRequest {
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn test_batch_request_valid() {
        assert!(batch(&["https://example.com/a", "https://example.com/a"]).validate(5).is_ok());
    }

    #[test]
    fn test_batch_request_empty() {
        assert!(batch(&[]).validate(5).is_err());
    }

    #[test]
    fn test_batch_request_over_limit() {
        let err = batch(&["a", "b", "c"]).validate(2).unwrap_err();
        assert!(err.contains("at most 2"));
    }

    #[test]
    fn test_batch_request_url_too_long() {
        let long = "a".repeat(2049);
        let err = batch(&["https://ok.example", &long]).validate(5).unwrap_err();
        assert!(err.contains("index 1"));
    }

    #[test]
    fn test_single_request_validation() {
        assert!(ScrapeRequest { url: "https://example.com".to_string() }.validate().is_ok());
        assert!(ScrapeRequest { url: " ".to_string() }.validate().is_err());
        assert!(ScrapeRequest { url: "a".repeat(2049) }.validate().is_err());
    }
}
