use axum::{
    Router,
    extract::Request,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app_state::AppState,
    config::Config,
    health::{self, HealthResponse},
    middleware::{RateLimit, rate_limit_middleware},
    scrape::{
        dtos::{ErrorResponse, ScrapeMultipleRequest, ScrapeRequest},
        handlers,
        outcome::{BatchReport, UrlOutcome},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        handlers::scrape_multiple,
        handlers::scrape_single,
    ),
    components(schemas(
        HealthResponse,
        ScrapeMultipleRequest,
        ScrapeRequest,
        BatchReport,
        UrlOutcome,
        ErrorResponse,
    )),
    tags(
        (name = "scrape", description = "Fetch pages and extract structured content"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let rate_limit = RateLimit::new(
        state.config.rate_limit_max_requests(),
        state.config.rate_limit_window_secs(),
    );

    let scrape_routes = Router::new()
        .route("/scrape-multiple", post(handlers::scrape_multiple))
        .route("/scrape", post(handlers::scrape_single))
        .route_layer(middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/healthz", get(health::health_check))
        .merge(scrape_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-");
                        tracing::info_span!(
                            "http",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    if config.allowed_origins().iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
