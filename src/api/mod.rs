use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::manager::ConsoleAuthManager;

pub mod handlers;

/// Shared state passed to handlers.
pub struct AppState {
    pub manager: ConsoleAuthManager,
}

/// Build the consoleauth router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/console-tokens", post(handlers::authorize_console))
        .route("/v1/console-tokens/:token", get(handlers::check_token))
        .route(
            "/v1/instances/:instance_uuid/console-tokens",
            get(handlers::list_instance_tokens).delete(handlers::delete_instance_tokens),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Middleware: echo the caller's X-Request-Id, or mint one, on every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = req
        .headers()
        .get("x-request-id")
        .cloned()
        .or_else(|| axum::http::HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()).ok());
    let mut resp = next.run(req).await;
    if let Some(val) = req_id {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
