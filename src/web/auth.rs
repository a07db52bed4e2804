use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::views::{self, PageContext};
use super::{AppState, WebError};
use crate::db::User;
use crate::forms::{LoginForm, RegisterForm};

/// Session key holding the authenticated user's id.
pub const USER_ID_KEY: &str = "user_id";

/// Session key for the one-shot flash message.
const FLASH_KEY: &str = "_flash";

// ============================================================================
// Session helpers
// ============================================================================

/// Resolve the session to a user record. Any failure along the way (missing
/// cookie, tampered token, stale user id) resolves to anonymous.
pub async fn current_user(state: &AppState, session: &Session) -> Option<User> {
    let user_id = session.get::<i32>(USER_ID_KEY).await.ok().flatten()?;
    state.store().get_user_by_id(user_id).await.ok().flatten()
}

async fn establish_session(session: &Session, user_id: i32) -> Result<(), WebError> {
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .map_err(|e| WebError::internal(format!("Failed to create session: {e}")))
}

/// Queue a one-shot message for the next rendered page.
pub async fn flash(session: &Session, message: &str) {
    let _ = session.insert(FLASH_KEY, message.to_string()).await;
}

async fn take_flash(session: &Session) -> Option<String> {
    session.remove::<String>(FLASH_KEY).await.ok().flatten()
}

/// Everything the layout needs for this request: the resolved user and the
/// pending flash message (consumed here).
pub async fn page_context(state: &AppState, session: &Session) -> PageContext {
    PageContext {
        user: current_user(state, session).await,
        flash: take_flash(session).await,
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires any authenticated user; anonymous requests are sent to the
/// login page with a prompt.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, WebError> {
    if current_user(&state, &session).await.is_some() {
        return Ok(next.run(request).await);
    }

    flash(&session, "Please log in to access this page.").await;
    Ok(Redirect::to("/login").into_response())
}

/// Requires the admin account. Anyone else, authenticated or not, gets a
/// forbidden response and the wrapped handler never runs.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, WebError> {
    match current_user(&state, &session).await {
        Some(user) if user.is_admin => Ok(next.run(request).await),
        _ => Err(WebError::Forbidden),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /register
pub async fn register_form(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let ctx = page_context(&state, &session).await;
    Ok(Html(views::register_page(&ctx, None)))
}

/// POST /register
/// A duplicate email never creates a second account; the new user is logged
/// in immediately on success.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<RegisterForm>,
) -> Result<Response, WebError> {
    if let Err(message) = form.validate() {
        let ctx = page_context(&state, &session).await;
        return Ok(Html(views::register_page(&ctx, Some(&message))).into_response());
    }

    let existing = state
        .store()
        .get_user_by_email(&form.email)
        .await
        .map_err(|e| WebError::database(format!("Failed to look up account: {e}")))?;

    if existing.is_some() {
        flash(&session, "Account already exists, log in instead.").await;
        return Ok(Redirect::to("/login").into_response());
    }

    let user = state
        .store()
        .create_user(&form.email, &form.password, &form.name)
        .await
        .map_err(|e| WebError::database(format!("Failed to create account: {e}")))?;

    establish_session(&session, user.id).await?;
    Ok(Redirect::to("/").into_response())
}

/// GET /login
pub async fn login_form(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let ctx = page_context(&state, &session).await;
    Ok(Html(views::login_page(&ctx, None)))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<LoginForm>,
) -> Result<Response, WebError> {
    if let Err(message) = form.validate() {
        let ctx = page_context(&state, &session).await;
        return Ok(Html(views::login_page(&ctx, Some(&message))).into_response());
    }

    let user = state
        .store()
        .get_user_by_email(&form.email)
        .await
        .map_err(|e| WebError::database(format!("Failed to look up account: {e}")))?;

    let Some(user) = user else {
        flash(&session, "Email does not exist. Try again.").await;
        return Ok(Redirect::to("/login").into_response());
    };

    let is_valid = state
        .store()
        .verify_user_password(&form.email, &form.password)
        .await
        .map_err(|e| WebError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        flash(&session, "Password incorrect. Try again.").await;
        return Ok(Redirect::to("/login").into_response());
    }

    establish_session(&session, user.id).await?;
    Ok(Redirect::to("/profile").into_response())
}

/// GET /logout
/// Clearing an absent session is a no-op, not an error.
pub async fn logout(session: Session) -> Redirect {
    let _ = session.flush().await;
    Redirect::to("/")
}

/// GET /profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let ctx = page_context(&state, &session).await;

    match ctx.user.clone() {
        Some(user) => Ok(Html(views::profile_page(&ctx, &user)).into_response()),
        None => Ok(Redirect::to("/login").into_response()),
    }
}
