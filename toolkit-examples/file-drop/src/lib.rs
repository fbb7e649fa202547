mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::FromRef;
use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::routing::{get, post};
use axum::Router;
use toolkit_axum::ToolkitState;
use toolkit_core::ToolkitConfig;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AppState {
    pub toolkit: ToolkitState,
    pub upload_dir: Arc<PathBuf>,
}

impl FromRef<AppState> for ToolkitState {
    fn from_ref(state: &AppState) -> Self {
        state.toolkit.clone()
    }
}

pub fn build(config: ToolkitConfig, upload_dir: impl Into<PathBuf>) -> Router {
    let state = AppState {
        toolkit: ToolkitState::new(config),
        upload_dir: Arc::new(upload_dir.into()),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/files", post(routes::upload_many))
        .route("/files/original", post(routes::upload_original))
        .route("/files/{name}", get(routes::download))
        .route("/slugs", post(routes::create_slug))
        .route("/ids", get(routes::random_id))
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            let request_id = req
                .headers()
                .get(&REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!("request", method = %req.method(), uri = %req.uri(), request_id)
        }))
        .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
}
