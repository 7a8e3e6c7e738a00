//! Axum-based HTTP server for the tariff endpoint

use crate::cache::TariffCache;
use crate::error::HdoError;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod tariffs;

pub use tariffs::{TariffQuery, coerce_int, tariffs};

/// Application version embedded by the build script
pub const APP_VERSION: &str = env!("APP_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TariffCache>,
}

impl AppState {
    pub const fn new(cache: Arc<TariffCache>) -> Self {
        Self { cache }
    }
}

/// Map an error to the plain-text response clients expect
pub fn error_response(err: &HdoError) -> Response {
    match err {
        HdoError::Validation { message, .. } => {
            (StatusCode::BAD_REQUEST, message.clone()).into_response()
        }
        HdoError::Fetch { code } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Python died ({code})"),
        )
            .into_response(),
        other => {
            crate::logging::get_logger("web").error(&format!("Request failed: {other}"));
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/health", responses(
    (status = 200, description = "Service is healthy")
)))]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "version": APP_VERSION}))
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(health, tariffs::tariffs),
    components(schemas(crate::tariff::TariffRecord, crate::tariff::UnixTariffRecord)),
    tags((name = "hdo-tariffs", description = "HDO tariff window API"))
)]
pub struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(tariffs))
        .route("/api/tariffs", get(tariffs))
        .route("/api/health", get(health));

    #[cfg(feature = "openapi")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()),
        )
    };

    router
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(cache: Arc<TariffCache>, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(AppState::new(cache));

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={host}, port={port}"
    ));

    let addr = if let Ok(ip) = host.parse::<IpAddr>() {
        SocketAddr::new(ip, port)
    } else {
        logger.warn(&format!("Invalid host '{host}'; falling back to 127.0.0.1"));
        ([127, 0, 0, 1], port).into()
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (tariffs /, health /api/health)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
