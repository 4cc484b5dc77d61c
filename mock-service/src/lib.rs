//! A stand-in lift ride ingestion service with knobs for latency and failures.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use std::io;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
#[allow(unused)]
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Mount point of the lift ride route, e.g. `/skiers-api`. Empty mounts at the root.
    pub base_path: String,
    pub delay: Duration,
    /// Standard deviation of a normally distributed delay around `delay`.
    pub jitter: Option<Duration>,
    /// Answer every n-th request with a 500.
    pub fail_every: Option<u64>,
    /// Answer rides for skiers above this id with a 404.
    pub max_skier: Option<u32>,
    /// Answer requests above this rate with a 500.
    pub max_tps: Option<NonZeroU32>,
}

#[derive(Debug, Deserialize)]
pub struct RideBody {
    pub time: u32,
    #[serde(rename = "liftID")]
    pub lift_id: u32,
}

struct ServiceState {
    config: MockConfig,
    received: AtomicU64,
    limiter: Option<DefaultDirectRateLimiter>,
}

/// A service bound to a local port, serving in the background.
#[derive(Clone)]
pub struct MockService {
    addr: SocketAddr,
    state: Arc<ServiceState>,
}

impl MockService {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Requests that reached the handler, whatever they were answered with.
    pub fn received(&self) -> u64 {
        self.state.received.load(Ordering::Relaxed)
    }
}

pub fn router(config: MockConfig) -> Router {
    router_with_state(state(config))
}

fn state(config: MockConfig) -> Arc<ServiceState> {
    let limiter = config
        .max_tps
        .map(|tps| RateLimiter::direct(Quota::per_second(tps)));
    Arc::new(ServiceState {
        config,
        received: AtomicU64::new(0),
        limiter,
    })
}

fn router_with_state(state: Arc<ServiceState>) -> Router {
    let rides = Router::new().route(
        "/skiers/:resort/seasons/:season/days/:day/skiers/:skier",
        post(lift_ride),
    );

    let base_path = normalize_base_path(&state.config.base_path);
    let app = if base_path.is_empty() {
        rides
    } else {
        Router::new().nest(&base_path, rides)
    };

    app.with_state(state).layer(TraceLayer::new_for_http())
}

/// Serve on `listener` until the process exits.
pub async fn serve(listener: TcpListener, config: MockConfig) -> io::Result<()> {
    axum::serve(listener, router(config)).await
}

/// Bind an ephemeral local port and serve on it in the background.
pub async fn spawn(config: MockConfig) -> io::Result<MockService> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = state(config);
    let app = router_with_state(state.clone());

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Mock service stopped: {err}");
        }
    });

    Ok(MockService { addr, state })
}

#[debug_handler]
async fn lift_ride(
    State(state): State<Arc<ServiceState>>,
    Path((resort, season, day, skier)): Path<(u32, u32, u32, u32)>,
    Json(body): Json<RideBody>,
) -> StatusCode {
    let n = state.received.fetch_add(1, Ordering::Relaxed) + 1;
    counter!("mock_service.lift_rides").increment(1);
    debug!(resort, season, day, skier, time = body.time, lift = body.lift_id, "Lift ride");

    let delay = sample_delay(&state.config);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    }
    if state.config.fail_every.is_some_and(|every| every > 0 && n % every == 0) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    if state.config.max_skier.is_some_and(|max| skier > max) {
        return StatusCode::NOT_FOUND;
    }

    StatusCode::CREATED
}

/// Leading `/` added, trailing ones removed; a bare `/` mounts at the root.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn sample_delay(config: &MockConfig) -> Duration {
    let Some(jitter) = config.jitter else {
        return config.delay;
    };

    let mean = config.delay.as_secs_f64();
    match Normal::new(mean, jitter.as_secs_f64()) {
        Ok(normal) => Duration::from_secs_f64(normal.sample(&mut rand::thread_rng()).max(0.)),
        Err(_) => config.delay,
    }
}
