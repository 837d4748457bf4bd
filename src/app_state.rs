use std::sync::Arc;

use crate::{
    config::Config,
    extractor::ContentExtractor,
    fetcher::{ChromiumRenderer, PageFetcher, StaticFetcher, build_http_client},
    llm::OpenAiClient,
    scrape::{BatchScraper, UrlJob},
};

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<BatchScraper>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the production pipeline: reqwest static fetch, headless Chromium
    /// fallback and an OpenAI-compatible completion client.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            scraper: Arc::new(build_scraper(&config)?),
            config: Arc::new(config),
        })
    }
}

pub fn build_scraper(config: &Config) -> anyhow::Result<BatchScraper> {
    let http = build_http_client(config.static_fetch_timeout())?;

    let mut renderer = ChromiumRenderer::new(config.render_timeout());
    if let Some(executable) = config.chrome_executable() {
        renderer = renderer.with_executable(executable);
    }

    let fetcher = PageFetcher::new(
        StaticFetcher::new(http),
        Arc::new(renderer),
        config.render_concurrency(),
        config.min_static_text_chars(),
    );

    let completion = OpenAiClient::new(
        config.openai_api_key(),
        config.openai_model(),
        config.llm_timeout(),
    )?
    .with_base_url(config.openai_base_url());

    let job = UrlJob::new(fetcher, ContentExtractor::new(Arc::new(completion)));
    Ok(BatchScraper::new(
        job,
        config.scrape_concurrency(),
        config.batch_timeout(),
    ))
}
