//! Public pages: listing, posting view, feed.

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::posting::FEED_LIMIT;
use crate::web::error::WebError;
use crate::web::flash;
use crate::web::state::AppState;

/// Content type of the feed.
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";

/// GET / - Public listing, newest first.
pub async fn index(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Html<String>), WebError> {
    let (jar, flashes) = flash::take(jar);
    let postings = state.ctx.postings().list_public().await?;
    let html = state.pages.index(&postings, &flashes)?;
    Ok((jar, Html(html)))
}

/// GET /:id - Public view of a verified posting.
pub async fn view(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(id): Path<String>,
) -> Result<(SignedCookieJar, Html<String>), WebError> {
    let posting = state.ctx.moderation().view(&id, None).await?;
    let (jar, flashes) = flash::take(jar);
    let html = state.pages.posting(&posting, None, &flashes)?;
    Ok((jar, Html(html)))
}

/// GET /feed - RSS feed of the newest public postings.
pub async fn feed(State(state): State<AppState>) -> Result<impl IntoResponse, WebError> {
    let postings = state.ctx.postings().list_recent_public(FEED_LIMIT).await?;
    let xml = state.pages.feed(&postings)?;
    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], xml))
}

/// GET /health - Liveness check.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Fallback for unknown routes.
pub async fn not_found() -> WebError {
    WebError::NotFound
}
