//! HTTP surface: `POST /team/add` behind bearer auth, plus a health probe.

pub mod auth;
pub mod team;

use crate::core::Orchestrator;
use crate::utils::error::Result;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub bearer_token: Arc<str>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, bearer_token: &str) -> Self {
        Self {
            orchestrator,
            bearer_token: Arc::from(bearer_token),
        }
    }
}

pub fn create_router(state: AppState, origin_host: Option<&str>) -> Router {
    let team_routes = Router::new()
        .route("/team/add", post(team::add_team))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let router = Router::new()
        .merge(team_routes)
        .route("/health", get(health))
        .with_state(state);

    match origin_host {
        Some(host) => router.layer(cors_layer(host)),
        None => router,
    }
}

/// 允許指定主機（http 與 https）跨域呼叫
fn cors_layer(host: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = ["http", "https"]
        .iter()
        .filter_map(|scheme| {
            let origin = format!("{}://{}", scheme, host);
            match HeaderValue::from_str(&origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {}", origin);
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn health() -> &'static str {
    "OK"
}

pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("🌐 HTTP API listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("HTTP API stopped");
    Ok(())
}
