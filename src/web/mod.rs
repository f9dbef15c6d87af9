//! Web server module

mod middleware;
mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, StatusCode},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::config::Config;
use crate::dashboard::Dashboard;

pub struct AppState {
    pub dashboard: Dashboard,
}

/// Handler for unknown paths
async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Build the application router around a loaded dashboard
pub fn router(dashboard: Dashboard) -> Router {
    let state = Arc::new(AppState { dashboard });

    // Views are recomputed per request and must not be cached downstream
    let api = Router::new()
        .route("/countries", get(routes::api_countries))
        .route("/regions", get(routes::api_regions))
        .route("/view", get(routes::api_view))
        .route("/figures", get(routes::api_figures))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .nest("/api", api)
        .nest_service("/static", ServeDir::new("static"))
        .fallback(not_found)
        .layer(middleware::RequestLoggingLayer::new())
        .with_state(state)
}

pub async fn start_server(config: &Config, dashboard: Dashboard) -> Result<()> {
    let app = router(dashboard);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    info!("Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
