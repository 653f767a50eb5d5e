//! Per-client throttling of login attempts.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ServerError;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    fn try_take(&mut self, now: Instant, per_sec: f64, capacity: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * per_sec).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Token bucket per client IP. A client may burst up to the per-minute
/// allowance, after which attempts refill evenly over the minute.
#[derive(Clone)]
pub struct LoginThrottle {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    per_sec: f64,
    capacity: f64,
}

impl LoginThrottle {
    pub fn per_minute(attempts: u32) -> Self {
        let capacity = f64::from(attempts.max(1));
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_sec: capacity / 60.0,
            capacity,
        }
    }

    pub async fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now()).await
    }

    async fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(ip)
            .or_insert_with(|| Bucket::full(self.capacity, now))
            .try_take(now, self.per_sec, self.capacity)
    }

    /// Forget clients that have not tried to log in for `max_idle`.
    pub async fn purge_idle(&self, max_idle: Duration) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < max_idle);
        let purged = before - buckets.len();
        if purged > 0 {
            debug!(purged, "Purged idle login throttle entries");
        }
    }
}

pub async fn login_throttle_middleware(
    State(throttle): State<LoginThrottle>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ServerError> {
    // Requests without a resolvable client address are not throttled.
    if let Some(ip) = client_ip(&req) {
        if !throttle.allow(ip).await {
            warn!(ip = %ip, "Login attempts exhausted");
            return Err(ServerError::TooManyRequests);
        }
    }

    Ok(next.run(req).await)
}

/// ConnectInfo first, then `X-Forwarded-For`, then `X-Real-IP`.
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(addr.ip());
    }

    let header = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header("x-real-ip").and_then(|value| value.trim().parse().ok()))
}
