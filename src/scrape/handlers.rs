use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::{
    app_state::AppState,
    scrape::{
        dtos::{ErrorResponse, ScrapeMultipleRequest, ScrapeRequest},
        outcome::{BatchReport, UrlOutcome},
    },
};

/// Scrape every URL concurrently and return one outcome per URL, in order.
#[utoipa::path(
    post,
    path = "/scrape-multiple",
    tag = "scrape",
    request_body = ScrapeMultipleRequest,
    responses(
        (status = 200, description = "Batch ran; per-URL results inside", body = BatchReport),
        (status = 400, description = "Empty, oversized or malformed URL list", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn scrape_multiple(
    State(state): State<AppState>,
    Json(payload): Json<ScrapeMultipleRequest>,
) -> Response {
    if let Err(error) = payload.validate(state.config.max_batch_urls()) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    info!(urls = payload.urls.len(), "scrape batch requested");
    let report = state.scraper.run(&payload.urls).await;

    (StatusCode::OK, Json(report)).into_response()
}

/// Scrape a single URL.
#[utoipa::path(
    post,
    path = "/scrape",
    tag = "scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Outcome for the URL", body = UrlOutcome),
        (status = 400, description = "Empty or oversized URL", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn scrape_single(
    State(state): State<AppState>,
    Json(payload): Json<ScrapeRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let outcome = state.scraper.run_one(&payload.url).await;
    (StatusCode::OK, Json(outcome)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        extractor::ContentExtractor,
        fetcher::{PageFetcher, StaticFetcher, build_http_client, render::MockPageRenderer},
        llm::MockCompletionClient,
        scrape::{BatchScraper, UrlJob},
    };
    use axum::{body::Body, http::Request, routing::post};
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    fn app_with(renderer: MockPageRenderer, client: MockCompletionClient) -> axum::Router {
        let http = build_http_client(Duration::from_secs(2)).unwrap();
        let fetcher = PageFetcher::new(StaticFetcher::new(http), Arc::new(renderer), 1, 100);
        let job = UrlJob::new(fetcher, ContentExtractor::new(Arc::new(client)));
        let state = AppState {
            scraper: Arc::new(BatchScraper::new(job, 4, Duration::from_secs(5))),
            config: Arc::new(Config::default()),
        };

        axum::Router::new()
            .route("/scrape-multiple", post(scrape_multiple))
            .route("/scrape", post(scrape_single))
            .with_state(state)
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_url_list_is_rejected() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().times(0);
        let app = app_with(MockPageRenderer::new(), client);

        let response = app
            .oneshot(json_request("/scrape-multiple", serde_json::json!({"urls": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_urls_field_is_rejected() {
        let app = app_with(MockPageRenderer::new(), MockCompletionClient::new());

        let response = app
            .oneshot(json_request("/scrape-multiple", serde_json::json!({"links": ["x"]})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_unparseable_urls_are_per_url_failures() {
        let mut renderer = MockPageRenderer::new();
        renderer.expect_render().times(0);
        let mut client = MockCompletionClient::new();
        client.expect_complete().times(0);
        let app = app_with(renderer, client);

        let response = app
            .oneshot(json_request(
                "/scrape-multiple",
                serde_json::json!({"urls": ["not a url", "mailto:someone@example.com"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(report["success"], true);
        assert_eq!(report["count"], 2);
        assert_eq!(report["results"][0]["url"], "not a url");
        assert_eq!(report["results"][0]["success"], false);
        assert!(report["results"][1]["error"].as_str().unwrap().contains("mailto"));
    }

    #[tokio::test]
    async fn test_single_scrape_rejects_blank_url() {
        let app = app_with(MockPageRenderer::new(), MockCompletionClient::new());

        let response = app
            .oneshot(json_request("/scrape", serde_json::json!({"url": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
