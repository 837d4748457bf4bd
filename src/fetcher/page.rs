use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::fetcher::{
    client::{StaticFetcher, parse_http_url},
    errors::FetchError,
    html::paragraph_text,
    render::PageRenderer,
    types::{FetchMethod, FetchResult, FetchedPage},
};

/// Static GET first, headless render when that fails or yields too little
/// paragraph text.
#[derive(Clone)]
pub struct PageFetcher {
    static_fetcher: StaticFetcher,
    renderer: Arc<dyn PageRenderer>,
    render_permits: Arc<Semaphore>,
    min_static_chars: usize,
}

impl PageFetcher {
    pub fn new(
        static_fetcher: StaticFetcher,
        renderer: Arc<dyn PageRenderer>,
        max_concurrent_renders: usize,
        min_static_chars: usize,
    ) -> Self {
        Self {
            static_fetcher,
            renderer,
            render_permits: Arc::new(Semaphore::new(max_concurrent_renders.max(1))),
            min_static_chars,
        }
    }

    #[instrument(skip_all, fields(url = %raw_url))]
    pub async fn fetch(&self, raw_url: &str) -> FetchResult {
        let url = parse_http_url(raw_url)?;

        let static_cause = match self.static_fetcher.fetch(&url).await {
            Ok(page) => {
                let text = paragraph_text(&page.html);
                let chars = text.trim().chars().count();
                if chars >= self.min_static_chars {
                    debug!(chars, charset = ?page.charset, "static text sufficient");
                    return Ok(FetchedPage {
                        text,
                        method: FetchMethod::Static,
                    });
                }
                info!(
                    chars,
                    threshold = self.min_static_chars,
                    "static text too short, escalating to render"
                );
                format!("only {} characters of paragraph text", chars)
            }
            Err(e) => {
                info!(error = %e, "static fetch failed, escalating to render");
                e.to_string()
            }
        };

        let _permit = self
            .render_permits
            .acquire()
            .await
            .map_err(|_| FetchError::Render("render pool closed".to_string()))?;

        match self.renderer.render(&url).await {
            Ok(text) => Ok(FetchedPage {
                text,
                method: FetchMethod::Rendered,
            }),
            Err(rendered) => {
                warn!(error = %rendered, "rendered fetch failed");
                Err(FetchError::Exhausted {
                    rendered: Box::new(rendered),
                    static_cause,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{client::build_http_client, render::MockPageRenderer};
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn serve_raw(
        server: &MockServer,
        route: &str,
        status: u16,
        body: impl Into<Vec<u8>>,
        content_type: &str,
    ) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body, content_type))
            .mount(server)
            .await;
    }

    async fn serve_html(server: &MockServer, route: &str, status: u16, body: String) {
        serve_raw(server, route, status, body, "text/html; charset=utf-8").await;
    }

    fn fetcher_with(renderer: MockPageRenderer) -> PageFetcher {
        let client = build_http_client(Duration::from_secs(5)).unwrap();
        PageFetcher::new(StaticFetcher::new(client), Arc::new(renderer), 2, 100)
    }

    #[tokio::test]
    async fn long_static_text_skips_render() {
        let server = MockServer::start().await;
        let paragraph = "Server rendered sentence. ".repeat(10);
        serve_html(&server, "/long", 200, format!("<p>{}</p>", paragraph)).await;

        let mut renderer = MockPageRenderer::new();
        renderer.expect_render().times(0);

        let page = fetcher_with(renderer)
            .fetch(&format!("{}/long", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.method, FetchMethod::Static);
        assert_eq!(page.text, paragraph);
    }

    #[tokio::test]
    async fn exactly_threshold_chars_is_enough() {
        let server = MockServer::start().await;
        serve_html(&server, "/edge", 200, format!("<p>  {}  </p>", "x".repeat(100))).await;

        let mut renderer = MockPageRenderer::new();
        renderer.expect_render().times(0);

        let page = fetcher_with(renderer)
            .fetch(&format!("{}/edge", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.method, FetchMethod::Static);
    }

    #[tokio::test]
    async fn stray_invalid_byte_does_not_escalate() {
        let server = MockServer::start().await;
        let paragraph = "Mostly well formed UTF-8 text. ".repeat(12);
        let mut body = format!("<p>{}</p>", paragraph).into_bytes();
        body.insert(3, 0xff);
        serve_raw(&server, "/stray", 200, body, "text/html; charset=utf-8").await;

        let mut renderer = MockPageRenderer::new();
        renderer.expect_render().times(0);

        let page = fetcher_with(renderer)
            .fetch(&format!("{}/stray", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.method, FetchMethod::Static);
        assert_eq!(page.text, format!("\u{FFFD}{}", paragraph));
    }

    #[tokio::test]
    async fn mixed_case_content_type_does_not_escalate() {
        let server = MockServer::start().await;
        let paragraph = "Served with an unusually cased header. ".repeat(5);
        serve_raw(
            &server,
            "/cased",
            200,
            format!("<p>{}</p>", paragraph),
            "Text/HTML; charset=UTF-8",
        )
        .await;

        let mut renderer = MockPageRenderer::new();
        renderer.expect_render().times(0);

        let page = fetcher_with(renderer)
            .fetch(&format!("{}/cased", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.method, FetchMethod::Static);
        assert_eq!(page.text, paragraph);
    }

    #[tokio::test]
    async fn short_static_text_escalates_once() {
        let server = MockServer::start().await;
        serve_html(&server, "/short", 200, "<p>short</p>".to_string()).await;

        let mut renderer = MockPageRenderer::new();
        renderer
            .expect_render()
            .withf(|url| url.path() == "/short")
            .times(1)
            .returning(|_| Ok("Rendered body text".to_string()));

        let page = fetcher_with(renderer)
            .fetch(&format!("{}/short", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.method, FetchMethod::Rendered);
        assert_eq!(page.text, "Rendered body text");
    }

    #[tokio::test]
    async fn http_error_escalates_to_render() {
        let server = MockServer::start().await;
        serve_html(&server, "/blocked", 403, String::new()).await;

        let mut renderer = MockPageRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Ok("Rendered anyway".to_string()));

        let page = fetcher_with(renderer)
            .fetch(&format!("{}/blocked", server.uri()))
            .await
            .unwrap();
        assert_eq!(page.method, FetchMethod::Rendered);
    }

    #[tokio::test]
    async fn both_strategies_failing_reports_both_causes() {
        let server = MockServer::start().await;
        serve_html(&server, "/down", 500, String::new()).await;

        let mut renderer = MockPageRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(FetchError::NavigationTimeout(20)));

        let err = fetcher_with(renderer)
            .fetch(&format!("{}/down", server.uri()))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("navigation timed out after 20s"));
        assert!(message.contains("http error 500"));
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_either_strategy() {
        let mut renderer = MockPageRenderer::new();
        renderer.expect_render().times(0);

        let err = fetcher_with(renderer).fetch("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
