use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse},
};
use rust_embed::RustEmbed;

use super::views;

#[derive(RustEmbed)]
#[folder = "static"]
struct Asset;

/// Fallback route: embedded static assets under /static/, a rendered 404
/// page for everything else.
pub async fn serve_asset(uri: Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    if let Some(asset_path) = path.strip_prefix("static/")
        && let Some(content) = Asset::get(asset_path)
    {
        let mime = mime_guess::from_path(asset_path).first_or_octet_stream();
        return (
            [(header::CONTENT_TYPE, mime.as_ref())],
            Body::from(content.data),
        )
            .into_response();
    }

    (
        StatusCode::NOT_FOUND,
        Html(views::error_page(
            StatusCode::NOT_FOUND,
            "The page you requested does not exist",
        )),
    )
        .into_response()
}
