use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
};
use tracing::{debug, warn};

use crate::scrape::dtos::ErrorResponse;

/// Fixed-window request budget per client address.
#[derive(Clone)]
pub struct RateLimit {
    store: Arc<DashMap<String, Window>>,
    last_sweep: Arc<AtomicI64>,
    max_requests: u32,
    window_seconds: i64,
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: DateTime<Utc>,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_seconds: i64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            last_sweep: Arc::new(AtomicI64::new(Utc::now().timestamp())),
            max_requests,
            window_seconds,
        }
    }

    /// Counts one request for `client`. Returns the seconds until the window
    /// resets when the budget is already spent.
    fn check(&self, client: &str, now: DateTime<Utc>) -> Result<(), i64> {
        let window_length = Duration::seconds(self.window_seconds);
        self.sweep_expired(now, window_length);

        let mut entry = self.store.entry(client.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        let window = entry.value_mut();

        if now.signed_duration_since(window.started) >= window_length {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > self.max_requests {
            let remaining = window_length - now.signed_duration_since(window.started);
            return Err(remaining.num_seconds().max(1));
        }
        Ok(())
    }

    /// Drops clients whose window has ended, at most once per window length.
    /// Must run before taking an entry guard on the map.
    fn sweep_expired(&self, now: DateTime<Utc>, window_length: Duration) {
        let last = self.last_sweep.load(Ordering::Relaxed);
        if now.timestamp() - last < self.window_seconds {
            return;
        }
        if self
            .last_sweep
            .compare_exchange(last, now.timestamp(), Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let before = self.store.len();
        self.store
            .retain(|_, window| now.signed_duration_since(window.started) < window_length);
        debug!(removed = before.saturating_sub(self.store.len()), "swept expired rate-limit windows");
    }
}

/// Peer address when served with connect info, else the first
/// `X-Forwarded-For` hop.
fn client_key(req: &Request) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimit>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);

    if let Err(retry_after) = rate_limit.check(&client, Utc::now()) {
        warn!(client = %client, retry_after, "rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Rate limit exceeded".to_string(),
            }),
        )
            .into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(req).await
}
