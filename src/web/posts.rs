use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{current_user, flash, page_context};
use super::views;
use super::{AppState, WebError};
use crate::forms::{CommentForm, PostForm};

/// Publish dates are display strings fixed at creation time, e.g.
/// "August 06, 2026".
pub fn display_date() -> String {
    chrono::Local::now().format("%B %d, %Y").to_string()
}

/// GET /
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let posts = state
        .store()
        .list_posts_with_authors()
        .await
        .map_err(|e| WebError::database(format!("Failed to list posts: {e}")))?;

    let ctx = page_context(&state, &session).await;
    Ok(Html(views::home_page(&ctx, &posts)))
}

/// GET /post/{id}
pub async fn show_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(post_id): Path<i32>,
) -> Result<Html<String>, WebError> {
    let post = state
        .store()
        .get_post_with_author(post_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to load post: {e}")))?
        .ok_or_else(|| WebError::not_found("Post", post_id))?;

    let comments = state
        .store()
        .comments_for_post(post_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to load comments: {e}")))?;

    let ctx = page_context(&state, &session).await;
    Ok(Html(views::post_page(&ctx, &post, &comments)))
}

/// POST /post/{id}
/// Submit a comment. Anonymous submissions are bounced to the login page
/// and the text is discarded.
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(post_id): Path<i32>,
    axum::Form(form): axum::Form<CommentForm>,
) -> Result<Response, WebError> {
    let Some(user) = current_user(&state, &session).await else {
        flash(&session, "You need to login or register to comment.").await;
        return Ok(Redirect::to("/login").into_response());
    };

    if let Err(message) = form.validate() {
        flash(&session, &message).await;
        return Ok(Redirect::to(&format!("/post/{post_id}")).into_response());
    }

    let post = state
        .store()
        .get_post(post_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to load post: {e}")))?;
    if post.is_none() {
        return Err(WebError::not_found("Post", post_id));
    }

    state
        .store()
        .add_comment(post_id, user.id, form.text.trim(), &display_date())
        .await
        .map_err(|e| WebError::database(format!("Failed to save comment: {e}")))?;

    Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
}

/// GET /new-post (admin)
pub async fn new_post_form(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let ctx = page_context(&state, &session).await;
    Ok(Html(views::post_form_page(
        &ctx,
        "New Post",
        "/new-post",
        &PostForm::default(),
        None,
    )))
}

/// POST /new-post (admin)
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    axum::Form(form): axum::Form<PostForm>,
) -> Result<Response, WebError> {
    let Some(user) = current_user(&state, &session).await else {
        return Err(WebError::Forbidden);
    };

    if let Err(message) = redisplay_reason(&state, &form, None).await? {
        let ctx = page_context(&state, &session).await;
        return Ok(Html(views::post_form_page(
            &ctx,
            "New Post",
            "/new-post",
            &form,
            Some(&message),
        ))
        .into_response());
    }

    state
        .store()
        .add_post(
            user.id,
            form.title.trim(),
            &form.subtitle,
            &form.body,
            &form.img_url,
            &display_date(),
        )
        .await
        .map_err(|e| WebError::database(format!("Failed to create post: {e}")))?;

    Ok(Redirect::to("/").into_response())
}

/// GET /edit-post/{id} (admin)
/// The form is pre-filled from the stored record.
pub async fn edit_post_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(post_id): Path<i32>,
) -> Result<Html<String>, WebError> {
    let post = state
        .store()
        .get_post(post_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to load post: {e}")))?
        .ok_or_else(|| WebError::not_found("Post", post_id))?;

    let values = PostForm {
        title: post.title,
        subtitle: post.subtitle,
        body: post.body,
        img_url: post.img_url,
    };

    let ctx = page_context(&state, &session).await;
    Ok(Html(views::post_form_page(
        &ctx,
        "Edit Post",
        &format!("/edit-post/{post_id}"),
        &values,
        None,
    )))
}

/// POST /edit-post/{id} (admin)
/// Overwrites the mutable fields only; id, author, and the original publish
/// date are preserved.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(post_id): Path<i32>,
    axum::Form(form): axum::Form<PostForm>,
) -> Result<Response, WebError> {
    if let Err(message) = redisplay_reason(&state, &form, Some(post_id)).await? {
        let ctx = page_context(&state, &session).await;
        return Ok(Html(views::post_form_page(
            &ctx,
            "Edit Post",
            &format!("/edit-post/{post_id}"),
            &form,
            Some(&message),
        ))
        .into_response());
    }

    let updated = state
        .store()
        .update_post(
            post_id,
            form.title.trim(),
            &form.subtitle,
            &form.body,
            &form.img_url,
        )
        .await
        .map_err(|e| WebError::database(format!("Failed to update post: {e}")))?;

    if !updated {
        return Err(WebError::not_found("Post", post_id));
    }

    Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
}

/// GET /delete/{id} (admin)
/// Deletes the post and its comments, no confirmation step.
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> Result<Redirect, WebError> {
    let removed = state
        .store()
        .remove_post(post_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to delete post: {e}")))?;

    if !removed {
        return Err(WebError::not_found("Post", post_id));
    }

    Ok(Redirect::to("/"))
}

/// Field validation plus the duplicate-title check; `Ok(Err(message))`
/// means the form should redisplay with that message.
async fn redisplay_reason(
    state: &AppState,
    form: &PostForm,
    exclude_id: Option<i32>,
) -> Result<Result<(), String>, WebError> {
    if let Err(message) = form.validate() {
        return Ok(Err(message));
    }

    let taken = state
        .store()
        .post_title_taken(form.title.trim(), exclude_id)
        .await
        .map_err(|e| WebError::database(format!("Failed to check title: {e}")))?;

    if taken {
        return Ok(Err(
            "A post with that title already exists. Pick another title.".to_string(),
        ));
    }

    Ok(Ok(()))
}
