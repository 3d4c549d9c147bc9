//! Router configuration.

use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers::{
    delete, edit_form, feed, health_check, index, new_form, not_found, preview, submit, update,
    verify, view,
};
use super::middleware::{render_error_page, security_headers};
use super::state::AppState;

/// Create the site router.
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.ctx.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(index))
        .route("/new", get(new_form).post(submit))
        .route("/feed", get(feed))
        .route("/health", get(health_check))
        .route("/:id", get(view))
        .route("/:id/:token/preview", get(preview))
        .route("/:id/:token/admin", get(edit_form).post(update))
        .route("/:id/:token/verify", get(verify))
        .route("/:id/:token/delete", post(delete))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            render_error_page,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(state)
}
