use axum::{
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;

use super::{AppState, WebError};

/// GET /delete-comment/{id}/{post_id}
/// Any authenticated user may delete any comment (the auth middleware gates
/// this route). The redirect target comes from the caller-supplied post id,
/// verbatim; it is not derived from the deleted comment.
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((comment_id, post_id)): Path<(i32, i32)>,
) -> Result<Redirect, WebError> {
    let removed = state
        .store()
        .remove_comment(comment_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to delete comment: {e}")))?;

    if !removed {
        return Err(WebError::not_found("Comment", comment_id));
    }

    Ok(Redirect::to(&format!("/post/{post_id}")))
}
