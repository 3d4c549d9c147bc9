//! Submission form.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::posting::FieldError;
use crate::web::error::WebError;
use crate::web::flash::{self, Flash};
use crate::web::form::PostingForm;
use crate::web::pages::FormPage;
use crate::web::state::AppState;
use crate::BoerseError;

async fn render_form(
    state: &AppState,
    form: &PostingForm,
    errors: &[FieldError],
) -> Result<String, WebError> {
    let institutes = state.ctx.postings().list_institutes().await?;
    Ok(state.pages.form(FormPage {
        form,
        edit: None,
        institutes: &institutes,
        errors,
    })?)
}

/// GET /new - Empty submission form.
pub async fn new_form(State(state): State<AppState>) -> Result<Html<String>, WebError> {
    let html = render_form(&state, &PostingForm::default(), &[]).await?;
    Ok(Html(html))
}

/// POST /new - Submit a posting.
///
/// Redirects to the listing on success; invalid input re-renders the
/// form with 422.
pub async fn submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<PostingForm>,
) -> Result<Response, WebError> {
    match state.ctx.moderation().submit(form.to_submission()).await {
        Ok(posting) => {
            let message = if posting.requires_admin_review {
                Flash::SubmittedPendingReview
            } else {
                Flash::SubmittedPendingVerification
            };
            Ok((flash::push(jar, message), Redirect::to("/")).into_response())
        }
        Err(BoerseError::Validation(errors)) => {
            let html = render_form(&state, &form, &errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
