use crate::fetcher::{errors::FetchError, pipeline::decode_body, types::StaticPage};
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "ScrapelineBot/0.1 (+https://github.com/scrapeline/scrapeline)";

/// Builds the HTTP client shared by every static fetch in the process.
///
/// `timeout` bounds the whole request, body download included.
pub fn build_http_client(timeout: Duration) -> Result<Client, FetchError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );

    ClientBuilder::new()
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(headers)
        .build()
        .map_err(|e| FetchError::Unknown(format!("failed to build http client: {}", e)))
}

/// Checks that `raw` is an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

/// Plain HTTP GET strategy: no scripts run, just the server-rendered HTML.
#[derive(Clone)]
pub struct StaticFetcher {
    client: Client,
}

impl StaticFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<StaticPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !is_textual(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length can be missing or wrong for chunked/compressed bodies
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        debug!(
            status = %status,
            bytes = body_bytes.len(),
            final_url = %final_url,
            "static fetch complete"
        );

        Ok(decode_body(final_url, &body_bytes, &content_type))
    }
}

/// Text and markup media types; binaries such as images or PDFs are refused.
/// MIME types are case-insensitive.
fn is_textual(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("text/")
        || essence == "application/xml"
        || essence.ends_with("+xml")
}
