//! Replaces the fallback body of tagged error responses with a full page.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};

use crate::web::pages::ErrorPage;
use crate::web::state::AppState;

/// Render error pages for responses tagged with an [`ErrorPage`].
pub async fn render_error_page(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    let Some(page) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };

    match state.pages.error(page) {
        Ok(html) => (response.status(), Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render error page: {}", e);
            response
        }
    }
}
