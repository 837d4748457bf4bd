use std::{sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::AbortHandle};
use tracing::{Instrument, error, info, info_span, instrument, warn};

use crate::scrape::{
    job::UrlJob,
    outcome::{BatchReport, UrlOutcome},
};

/// Runs one `UrlJob` per submitted URL concurrently and reports them in
/// submission order.
#[derive(Clone)]
pub struct BatchScraper {
    job: UrlJob,
    max_in_flight: usize,
    batch_timeout: Duration,
}

impl BatchScraper {
    pub fn new(job: UrlJob, max_in_flight: usize, batch_timeout: Duration) -> Self {
        Self {
            job,
            max_in_flight: max_in_flight.max(1),
            batch_timeout,
        }
    }

    #[instrument(skip_all, fields(urls = urls.len()))]
    pub async fn run(&self, urls: &[String]) -> BatchReport {
        let started = std::time::Instant::now();
        let deadline = tokio::time::Instant::now() + self.batch_timeout;
        let permits = Arc::new(Semaphore::new(self.max_in_flight));

        let handles: Vec<_> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let job = self.job.clone();
                let permits = permits.clone();
                let url = url.clone();
                let timeout_secs = self.batch_timeout.as_secs();
                let span = info_span!("url_job", index, url = %url);

                tokio::spawn(
                    async move {
                        let work = async {
                            // Never closed, so acquire cannot fail.
                            let _permit = permits.acquire().await.ok();
                            job.run(&url).await
                        };
                        match tokio::time::timeout_at(deadline, work).await {
                            Ok(outcome) => outcome,
                            Err(_) => {
                                warn!("batch deadline reached before url finished");
                                UrlOutcome::failed(
                                    url.as_str(),
                                    format!("batch deadline of {}s exceeded", timeout_secs),
                                )
                            }
                        }
                    }
                    .instrument(span),
                )
            })
            .collect();

        // If the caller stops waiting, stop the jobs too.
        let _abort_guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        let mut results = Vec::with_capacity(handles.len());
        for (handle, url) in handles.into_iter().zip(urls) {
            match handle.await {
                Ok(outcome) => results.push(outcome),
                Err(e) => {
                    error!(url = %url, error = %e, "url job aborted");
                    results.push(UrlOutcome::failed(url.as_str(), format!("job aborted: {}", e)));
                }
            }
        }

        let report = BatchReport::new(results);
        info!(
            count = report.count(),
            succeeded = report.succeeded(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch finished"
        );
        report
    }

    /// Single URL through the same pipeline and deadline.
    pub async fn run_one(&self, url: &str) -> UrlOutcome {
        match tokio::time::timeout(self.batch_timeout, self.job.run(url)).await {
            Ok(outcome) => outcome,
            Err(_) => UrlOutcome::failed(
                url,
                format!("batch deadline of {}s exceeded", self.batch_timeout.as_secs()),
            ),
        }
    }
}

struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}
