use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Terminal result for one submitted URL. Exactly one of `data` / `error`
/// is set, matching `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UrlOutcome {
    url: String,
    success: bool,
    /// Raw model reply; expected to be JSON but passed through as text.
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl UrlOutcome {
    pub fn succeeded(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: true,
            data: Some(payload.into()),
            error: None,
        }
    }

    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
    pub fn is_success(&self) -> bool {
        self.success
    }
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Everything one batch produced, in submission order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchReport {
    /// The batch ran to completion. Per-URL success lives in each result.
    success: bool,
    count: usize,
    results: Vec<UrlOutcome>,
}

impl BatchReport {
    pub fn new(results: Vec<UrlOutcome>) -> Self {
        Self {
            success: true,
            count: results.len(),
            results,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
    pub fn count(&self) -> usize {
        self.count
    }
    pub fn results(&self) -> &[UrlOutcome] {
        &self.results
    }
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

/// Lifecycle of a single URL job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Fetching,
    FetchFailed,
    Fetched,
    Extracting,
    ExtractFailed,
    Done,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FetchFailed | Self::ExtractFailed | Self::Done)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::FetchFailed => "fetch_failed",
            Self::Fetched => "fetched",
            Self::Extracting => "extracting",
            Self::ExtractFailed => "extract_failed",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
