// src/api/mod.rs
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::ScoreCache;

pub mod handlers;

pub use handlers::{ApiError, PairScores};

/// Read-only routes over the score cache. Nothing here triggers a fetch.
pub fn router(cache: ScoreCache) -> Router {
    let r = Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/scores", get(handlers::all_scores))
        .route("/v1/scores/", get(handlers::missing_pair))
        .route("/v1/scores/{pair}", get(handlers::pair_scores));

    #[cfg(feature = "metrics")]
    let r = r.route("/metrics", get(handlers::metrics));

    r.with_state(cache)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(cache: ScoreCache, port: u16, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "api listening");

    axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
