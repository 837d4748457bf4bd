use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::{
    extractor::ContentExtractor,
    fetcher::PageFetcher,
    scrape::outcome::{JobState, UrlOutcome},
};

/// Fetch then extract for a single URL. A failed stage ends the job; nothing
/// is retried.
#[derive(Clone)]
pub struct UrlJob {
    fetcher: PageFetcher,
    extractor: ContentExtractor,
}

impl UrlJob {
    pub fn new(fetcher: PageFetcher, extractor: ContentExtractor) -> Self {
        Self { fetcher, extractor }
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn run(&self, url: &str) -> UrlOutcome {
        let started = Instant::now();
        transition(JobState::Pending, JobState::Fetching);

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                transition(JobState::Fetching, JobState::FetchFailed);
                info!(error = %e, "url failed at fetch");
                return UrlOutcome::failed(url, e.to_string());
            }
        };
        transition(JobState::Fetching, JobState::Fetched);
        debug!(method = ?page.method, chars = page.text.len(), "page fetched");

        transition(JobState::Fetched, JobState::Extracting);
        match self.extractor.extract(&page.text).await {
            Ok(payload) => {
                transition(JobState::Extracting, JobState::Done);
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    method = ?page.method,
                    "url scraped"
                );
                UrlOutcome::succeeded(url, payload)
            }
            Err(e) => {
                transition(JobState::Extracting, JobState::ExtractFailed);
                info!(error = %e, "url failed at extraction");
                UrlOutcome::failed(url, e.to_string())
            }
        }
    }
}

fn transition(from: JobState, to: JobState) {
    debug!(from = %from, to = %to, terminal = to.is_terminal(), "job state");
}
