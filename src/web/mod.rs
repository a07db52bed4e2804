use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{
    Expiry, MemoryStore, SessionManagerLayer,
    cookie::{Key, SameSite},
};

use time;

pub use crate::state::AppState;

mod assets;
pub mod auth;
mod comments;
mod error;
mod pages;
mod posts;
pub mod views;

pub use error::WebError;

/// Build the full HTTP surface: public pages, the session layer, the
/// admin-gated post routes, and the static asset fallback.
pub fn router(state: Arc<AppState>) -> Router {
    let signing_key = if state.config.session.secret.is_empty() {
        tracing::warn!(
            "No session secret configured; using an ephemeral signing key \
             (sessions will not survive a restart)"
        );
        Key::generate()
    } else {
        Key::derive_from(state.config.session.secret.as_bytes())
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.session.expiry_minutes,
        )))
        .with_signed(signing_key);

    let admin_routes = Router::new()
        .route(
            "/new-post",
            get(posts::new_post_form).post(posts::create_post),
        )
        .route(
            "/edit-post/{id}",
            get(posts::edit_post_form).post(posts::update_post),
        )
        .route("/delete/{id}", get(posts::delete_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let authenticated_routes = Router::new()
        .route("/profile", get(auth::profile))
        .route(
            "/delete-comment/{id}/{post_id}",
            get(comments::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let page_routes = Router::new()
        .route("/", get(posts::home))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/post/{id}", get(posts::show_post).post(posts::add_comment))
        .route("/about", get(pages::about))
        .route(
            "/contact",
            get(pages::contact_form).post(pages::send_contact),
        )
        .merge(admin_routes)
        .merge(authenticated_routes)
        .layer(session_layer)
        .with_state(state);

    Router::new()
        .merge(page_routes)
        .fallback(assets::serve_asset)
        .layer(TraceLayer::new_for_http())
}
