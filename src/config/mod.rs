//! Configuration handling for the scraping service.
//!
//! Everything is read from environment variables with development defaults,
//! so a bare `cargo run` works against a local completion endpoint. The
//! binaries load a `.env` file first (see `dotenvy`), this module only looks
//! at the process environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Environment variable names. Public so tests and binaries can refer to them.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_LLM_TIMEOUT_SECS: &str = "LLM_TIMEOUT_SECS";
pub const ENV_STATIC_FETCH_TIMEOUT_SECS: &str = "STATIC_FETCH_TIMEOUT_SECS";
pub const ENV_RENDER_TIMEOUT_SECS: &str = "RENDER_TIMEOUT_SECS";
pub const ENV_MIN_STATIC_TEXT_CHARS: &str = "MIN_STATIC_TEXT_CHARS";
pub const ENV_SCRAPE_CONCURRENCY: &str = "SCRAPE_CONCURRENCY";
pub const ENV_RENDER_CONCURRENCY: &str = "RENDER_CONCURRENCY";
pub const ENV_BATCH_TIMEOUT_SECS: &str = "BATCH_TIMEOUT_SECS";
pub const ENV_MAX_BATCH_URLS: &str = "MAX_BATCH_URLS";
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
pub const ENV_RATE_LIMIT_MAX_REQUESTS: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const ENV_RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_STATIC_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MIN_STATIC_TEXT_CHARS: usize = 100;
const DEFAULT_SCRAPE_CONCURRENCY: usize = 8;
const DEFAULT_RENDER_CONCURRENCY: usize = 2;
const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_BATCH_URLS: usize = 50;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:4200";
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 30;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    openai_api_key: String,
    openai_base_url: String,
    openai_model: String,
    llm_timeout: Duration,
    static_fetch_timeout: Duration,
    render_timeout: Duration,
    min_static_text_chars: usize,
    scrape_concurrency: usize,
    render_concurrency: usize,
    batch_timeout: Duration,
    max_batch_urls: usize,
    allowed_origins: Vec<String>,
    rate_limit_max_requests: u32,
    rate_limit_window_secs: i64,
    chrome_executable: Option<String>,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    ///
    /// Fails when a numeric variable does not parse, or is zero where the
    /// service needs a positive bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: env::var(ENV_BIND_ADDR).unwrap_or(defaults.bind_addr),
            openai_api_key: env::var(ENV_OPENAI_API_KEY).unwrap_or(defaults.openai_api_key),
            openai_base_url: env::var(ENV_OPENAI_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_model: env::var(ENV_OPENAI_MODEL).unwrap_or(defaults.openai_model),
            llm_timeout: Duration::from_secs(positive(
                ENV_LLM_TIMEOUT_SECS,
                DEFAULT_LLM_TIMEOUT_SECS,
            )?),
            static_fetch_timeout: Duration::from_secs(positive(
                ENV_STATIC_FETCH_TIMEOUT_SECS,
                DEFAULT_STATIC_FETCH_TIMEOUT_SECS,
            )?),
            render_timeout: Duration::from_secs(positive(
                ENV_RENDER_TIMEOUT_SECS,
                DEFAULT_RENDER_TIMEOUT_SECS,
            )?),
            min_static_text_chars: parsed(
                ENV_MIN_STATIC_TEXT_CHARS,
                DEFAULT_MIN_STATIC_TEXT_CHARS,
            )?,
            scrape_concurrency: positive(ENV_SCRAPE_CONCURRENCY, DEFAULT_SCRAPE_CONCURRENCY)?,
            render_concurrency: positive(ENV_RENDER_CONCURRENCY, DEFAULT_RENDER_CONCURRENCY)?,
            batch_timeout: Duration::from_secs(positive(
                ENV_BATCH_TIMEOUT_SECS,
                DEFAULT_BATCH_TIMEOUT_SECS,
            )?),
            max_batch_urls: positive(ENV_MAX_BATCH_URLS, DEFAULT_MAX_BATCH_URLS)?,
            allowed_origins: env::var(ENV_ALLOWED_ORIGINS)
                .map(|raw| split_origins(&raw))
                .unwrap_or(defaults.allowed_origins),
            rate_limit_max_requests: positive(
                ENV_RATE_LIMIT_MAX_REQUESTS,
                DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            )?,
            rate_limit_window_secs: positive(
                ENV_RATE_LIMIT_WINDOW_SECS,
                DEFAULT_RATE_LIMIT_WINDOW_SECS,
            )?,
            chrome_executable: env::var(ENV_CHROME_EXECUTABLE)
                .ok()
                .filter(|path| !path.trim().is_empty()),
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    pub fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub fn openai_base_url(&self) -> &str {
        &self.openai_base_url
    }
    pub fn openai_model(&self) -> &str {
        &self.openai_model
    }
    pub fn llm_timeout(&self) -> Duration {
        self.llm_timeout
    }
    pub fn static_fetch_timeout(&self) -> Duration {
        self.static_fetch_timeout
    }
    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }
    /// Trimmed paragraph text shorter than this escalates to a browser render.
    pub fn min_static_text_chars(&self) -> usize {
        self.min_static_text_chars
    }
    pub fn scrape_concurrency(&self) -> usize {
        self.scrape_concurrency
    }
    pub fn render_concurrency(&self) -> usize {
        self.render_concurrency
    }
    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }
    pub fn max_batch_urls(&self) -> usize {
        self.max_batch_urls
    }
    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }
    pub fn rate_limit_max_requests(&self) -> u32 {
        self.rate_limit_max_requests
    }
    pub fn rate_limit_window_secs(&self) -> i64 {
        self.rate_limit_window_secs
    }
    pub fn chrome_executable(&self) -> Option<&str> {
        self.chrome_executable.as_deref()
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window_secs: i64) -> Self {
        self.rate_limit_max_requests = max_requests;
        self.rate_limit_window_secs = window_secs;
        self
    }

    pub fn with_max_batch_urls(mut self, max_batch_urls: usize) -> Self {
        self.max_batch_urls = max_batch_urls;
        self
    }
}

impl Default for Config {
    /// Development defaults (mirrors `from_env` with no env overrides).
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            static_fetch_timeout: Duration::from_secs(DEFAULT_STATIC_FETCH_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
            min_static_text_chars: DEFAULT_MIN_STATIC_TEXT_CHARS,
            scrape_concurrency: DEFAULT_SCRAPE_CONCURRENCY,
            render_concurrency: DEFAULT_RENDER_CONCURRENCY,
            batch_timeout: Duration::from_secs(DEFAULT_BATCH_TIMEOUT_SECS),
            max_batch_urls: DEFAULT_MAX_BATCH_URLS,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            rate_limit_max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            chrome_executable: None,
        }
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn parsed<T>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(field) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

fn positive<T>(field: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = parsed(field, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
