use async_trait::async_trait;
use axum::Router;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use url::Url;

use scrapeline::{
    app_state::AppState,
    config::Config,
    extractor::ContentExtractor,
    fetcher::{FetchError, PageFetcher, PageRenderer, StaticFetcher, build_http_client},
    llm::CompletionClient,
    router::build_router,
    scrape::{BatchScraper, UrlJob},
};

/// Renderer that returns fixed text and counts calls.
#[derive(Default)]
pub struct CountingRenderer {
    pub calls: AtomicUsize,
    pub text: String,
}

impl CountingRenderer {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            text: text.to_string(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for CountingRenderer {
    async fn render(&self, _url: &Url) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Completion client that echoes a canned reply and counts calls.
pub struct CannedCompletion {
    pub calls: AtomicUsize,
    pub reply: String,
}

impl CannedCompletion {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for CannedCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, scrapeline::llm::LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub fn scraper_with(
    renderer: Arc<dyn PageRenderer>,
    completion: Arc<dyn CompletionClient>,
) -> BatchScraper {
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let fetcher = PageFetcher::new(StaticFetcher::new(http), renderer, 2, 100);
    let job = UrlJob::new(fetcher, ContentExtractor::new(completion));
    BatchScraper::new(job, 8, Duration::from_secs(30))
}

pub fn test_app(
    renderer: Arc<dyn PageRenderer>,
    completion: Arc<dyn CompletionClient>,
    config: Config,
) -> Router {
    let state = AppState {
        scraper: Arc::new(scraper_with(renderer, completion)),
        config: Arc::new(config),
    };
    build_router(state)
}
