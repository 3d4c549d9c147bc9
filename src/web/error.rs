//! Error responses for the web layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::BoerseError;

use super::pages::ErrorPage;

/// Web error type.
///
/// `into_response` produces a plain fallback body and tags the response
/// with the [`ErrorPage`] to show; the error page middleware replaces the
/// body with the full page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebError {
    /// Unknown posting or route (404).
    NotFound,
    /// Token mismatch or unverified posting (403).
    Forbidden,
    /// Rejected request without further detail (400).
    BadRequest,
    /// Anything else (500).
    Internal,
}

impl WebError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Forbidden => StatusCode::FORBIDDEN,
            WebError::BadRequest => StatusCode::BAD_REQUEST,
            WebError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Page rendered for this error; a bare 400 gets none.
    pub fn page(&self) -> Option<ErrorPage> {
        match self {
            WebError::NotFound => Some(ErrorPage::NotFound),
            WebError::Forbidden => Some(ErrorPage::Forbidden),
            WebError::BadRequest => None,
            WebError::Internal => Some(ErrorPage::Internal),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = status.canonical_reason().unwrap_or("Error");
        let mut response = (status, body).into_response();
        if let Some(page) = self.page() {
            response.extensions_mut().insert(page);
        }
        response
    }
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

impl std::error::Error for WebError {}

impl From<BoerseError> for WebError {
    fn from(err: BoerseError) -> Self {
        match &err {
            BoerseError::NotFound(_) => WebError::NotFound,
            BoerseError::Forbidden(_) => WebError::Forbidden,
            BoerseError::DenyListed => WebError::BadRequest,
            _ => {
                tracing::error!("Internal error: {}", err);
                WebError::Internal
            }
        }
    }
}
