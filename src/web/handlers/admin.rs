//! Token-protected moderation pages.
//!
//! The admin token from the URL unlocks preview, edit and delete; only the
//! verify token unlocks verification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::posting::{FieldError, Posting};
use crate::web::error::WebError;
use crate::web::flash::{self, Flash};
use crate::web::form::PostingForm;
use crate::web::pages::FormPage;
use crate::web::state::AppState;
use crate::BoerseError;

async fn render_edit_form(
    state: &AppState,
    posting: &Posting,
    token: &str,
    form: &PostingForm,
    errors: &[FieldError],
) -> Result<String, WebError> {
    let institutes = state.ctx.postings().list_institutes().await?;
    Ok(state.pages.form(FormPage {
        form,
        edit: Some((&posting.uuid, token)),
        institutes: &institutes,
        errors,
    })?)
}

/// GET /:id/:token/preview - View any posting with the admin token.
pub async fn preview(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path((id, token)): Path<(String, String)>,
) -> Result<(SignedCookieJar, Html<String>), WebError> {
    let posting = state.ctx.moderation().view(&id, Some(&token)).await?;
    let (jar, flashes) = flash::take(jar);
    let html = state.pages.posting(&posting, Some(&token), &flashes)?;
    Ok((jar, Html(html)))
}

/// GET /:id/:token/admin - Edit form.
pub async fn edit_form(
    State(state): State<AppState>,
    Path((id, token)): Path<(String, String)>,
) -> Result<Html<String>, WebError> {
    let posting = state.ctx.moderation().get_for_edit(&id, &token).await?;
    let form = PostingForm::from_posting(&posting);
    let html = render_edit_form(&state, &posting, &token, &form, &[]).await?;
    Ok(Html(html))
}

/// POST /:id/:token/admin - Save changes.
pub async fn update(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path((id, token)): Path<(String, String)>,
    Form(form): Form<PostingForm>,
) -> Result<Response, WebError> {
    let moderation = state.ctx.moderation();
    let (fields, form_errors) = form.to_fields();

    match moderation.edit(&id, &token, fields, form_errors).await {
        Ok(posting) => {
            let target = if posting.verified {
                format!("/{}", posting.uuid)
            } else {
                format!("/{}/{}/preview", posting.uuid, token)
            };
            Ok((flash::push(jar, Flash::Updated), Redirect::to(&target)).into_response())
        }
        Err(BoerseError::Validation(errors)) => {
            let posting = moderation.get_for_edit(&id, &token).await?;
            let mut form = form;
            form.email = posting.email.clone();
            let html = render_edit_form(&state, &posting, &token, &form, &errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /:id/:token/verify - Verify and redirect to the posting.
pub async fn verify(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path((id, token)): Path<(String, String)>,
) -> Result<(SignedCookieJar, Redirect), WebError> {
    let posting = state.ctx.moderation().verify(&id, &token).await?;
    let target = format!("/{}", posting.uuid);
    Ok((flash::push(jar, Flash::Verified), Redirect::to(&target)))
}

/// POST /:id/:token/delete - Soft delete and redirect to the listing.
pub async fn delete(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path((id, token)): Path<(String, String)>,
) -> Result<(SignedCookieJar, Redirect), WebError> {
    state.ctx.moderation().delete(&id, &token).await?;
    Ok((flash::push(jar, Flash::Deleted), Redirect::to("/")))
}
