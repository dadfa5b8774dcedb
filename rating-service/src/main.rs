mod api;
mod config;
mod executor;
mod models;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServiceConfig;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rating_service=debug,bridge_solver=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Bridge Rating Service");

    let config = ServiceConfig::from_env();
    tracing::info!(
        "Workers: {}, plan: {:?}, bounded tier: {} spans / {} elements, retention: {}s",
        config.workers,
        config.plan,
        config.tier_limits.max_spans,
        config.tier_limits.max_elements,
        config.retention.as_secs()
    );

    let app = api::create_router(&config);
    let addr = config.addr();

    tracing::info!("Listening on {}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/v1/version");
    tracing::info!("  GET  /api/v1/catalog/vehicles");
    tracing::info!("  POST /api/v1/analyses");
    tracing::info!("  GET  /api/v1/analyses/:id");
    tracing::info!("  GET  /api/v1/analyses/:id/progress?since=n");
    tracing::info!("  GET  /api/v1/analyses/:id/detail");
    tracing::info!("  POST /api/v1/analyses/:id/cancel");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app).await.expect("server error");
}
