use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::page_context;
use super::views;
use super::{AppState, WebError};
use crate::forms::ContactForm;

/// GET /about
pub async fn about(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let ctx = page_context(&state, &session).await;
    Ok(Html(views::about_page(&ctx)))
}

/// GET /contact
pub async fn contact_form(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let ctx = page_context(&state, &session).await;
    Ok(Html(views::contact_page(&ctx, false, None)))
}

/// POST /contact
/// The request blocks until the relay accepts or rejects the message; a
/// relay failure is surfaced to the submitter, never swallowed.
pub async fn send_contact(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<ContactForm>,
) -> Result<Response, WebError> {
    if let Err(message) = form.validate() {
        let ctx = page_context(&state, &session).await;
        return Ok(Html(views::contact_page(&ctx, false, Some(&message))).into_response());
    }

    state
        .mailer()
        .send_contact(&form)
        .await
        .map_err(|e| WebError::mail(e.to_string()))?;

    let ctx = page_context(&state, &session).await;
    Ok(Html(views::contact_page(&ctx, true, None)).into_response())
}
