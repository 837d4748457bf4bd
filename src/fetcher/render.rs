use async_trait::async_trait;
use chromiumoxide::{
    Page,
    browser::{Browser, BrowserConfig},
};
use futures::StreamExt;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::fetcher::errors::FetchError;

const IDLE_WINDOW: Duration = Duration::from_millis(500);
const IDLE_POLL: Duration = Duration::from_millis(100);

// -1 until the load event fired, then the number of fetched resources so far.
const RESOURCE_COUNT_JS: &str =
    "document.readyState === 'complete' ? performance.getEntriesByType('resource').length : -1";
const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

/// Produces the visible text of a page after client-side scripts ran.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<String, FetchError>;
}

/// Headless Chromium, one fresh browser process per render.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    navigation_timeout: Duration,
    executable: Option<PathBuf>,
}

impl ChromiumRenderer {
    pub fn new(navigation_timeout: Duration) -> Self {
        Self {
            navigation_timeout,
            executable: None,
        }
    }

    /// Use a specific Chrome/Chromium binary instead of auto-detection.
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig, FetchError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile_dir)
            .request_timeout(self.navigation_timeout)
            .args(["--disable-gpu", "--disable-dev-shm-usage", "--no-first-run"]);

        if let Some(executable) = &self.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(FetchError::BrowserLaunch)
    }

    async fn body_text(&self, browser: &Browser, url: &Url) -> Result<String, FetchError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(FetchError::from_cdp_error)?;

        match tokio::time::timeout(self.navigation_timeout, page.goto(url.as_str())).await {
            Err(_) => {
                return Err(FetchError::NavigationTimeout(
                    self.navigation_timeout.as_secs(),
                ));
            }
            Ok(Err(e)) => return Err(FetchError::Render(format!("navigation failed: {}", e))),
            Ok(Ok(_)) => {}
        }

        self.wait_for_network_idle(&page).await;

        let text: String = page
            .evaluate(BODY_TEXT_JS)
            .await
            .map_err(FetchError::from_cdp_error)?
            .into_value()
            .map_err(|e| FetchError::Render(format!("unexpected body text value: {}", e)))?;

        if text.trim().is_empty() {
            return Err(FetchError::Render("empty body text".to_string()));
        }

        Ok(text)
    }

    /// Waits until the page has loaded and its resource count has not changed
    /// for `IDLE_WINDOW`, giving up after the navigation timeout.
    async fn wait_for_network_idle(&self, page: &Page) {
        let deadline = Instant::now() + self.navigation_timeout;
        let mut last_count: Option<i64> = None;
        let mut stable_since = Instant::now();

        loop {
            let count = match page.evaluate(RESOURCE_COUNT_JS).await {
                Ok(result) => result.into_value::<i64>().ok(),
                Err(_) => None,
            };
            let now = Instant::now();

            if count != last_count || count == Some(-1) {
                last_count = count;
                stable_since = now;
            } else if now.duration_since(stable_since) >= IDLE_WINDOW {
                debug!(resources = ?count, "network idle");
                return;
            }

            if now >= deadline {
                debug!("network idle wait reached deadline, reading body anyway");
                return;
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    #[instrument(skip_all, fields(url = %url))]
    async fn render(&self, url: &Url) -> Result<String, FetchError> {
        let profile_dir = std::env::temp_dir().join(format!("scrapeline-{}", Uuid::new_v4()));
        let config = self.browser_config(&profile_dir)?;

        let started = Instant::now();
        let mut session = match Browser::launch(config).await {
            Ok((browser, mut handler)) => BrowserSession::new(
                Some(browser),
                tokio::spawn(async move { while handler.next().await.is_some() {} }),
                profile_dir,
            ),
            Err(e) => {
                let _ = tokio::fs::remove_dir_all(&profile_dir).await;
                return Err(FetchError::BrowserLaunch(e.to_string()));
            }
        };

        let result = match session.browser.as_ref() {
            Some(browser) => self.body_text(browser, url).await,
            None => Err(FetchError::BrowserLaunch("browser missing".to_string())),
        };
        session.shutdown().await;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "render finished"
        );
        result
    }
}

/// Owns one launched browser. `shutdown` closes it gracefully; if the render
/// future is dropped first, `Drop` still kills the process and removes the
/// profile directory.
struct BrowserSession {
    browser: Option<Browser>,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    profile_removed: bool,
}

impl BrowserSession {
    fn new(browser: Option<Browser>, handler: JoinHandle<()>, profile_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            profile_dir,
            profile_removed: false,
        }
    }

    async fn shutdown(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "browser close failed");
            }
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "waiting for browser exit failed");
            }
        }
        self.handler.abort();

        match tokio::fs::remove_dir_all(&self.profile_dir).await {
            Ok(()) => self.profile_removed = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => self.profile_removed = true,
            Err(e) => {
                debug!(error = %e, dir = %self.profile_dir.display(), "profile dir removal failed")
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Dropping `Browser` kills a still-running child process.
        self.browser.take();
        self.handler.abort();
        if self.profile_removed {
            return;
        }
        // Only reached when the render future was cancelled mid-flight.
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            debug!(error = %e, dir = %self.profile_dir.display(), "profile dir cleanup skipped");
        }
    }
}
