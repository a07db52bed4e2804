//! Server-side HTML rendering. Every page is assembled from a shared layout
//! plus a body fragment; all user-supplied text is escaped on the way out.
//! Post bodies are the one exception: they hold admin-authored rich text and
//! render as-is.

use axum::http::StatusCode;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::db::{CommentView, PostView, User};
use crate::forms::PostForm;

/// What the layout needs to know about the current request: who is logged
/// in and any one-shot flash message taken from the session.
#[derive(Debug, Default)]
pub struct PageContext {
    pub user: Option<User>,
    pub flash: Option<String>,
}

impl PageContext {
    #[must_use]
    pub const fn logged_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

fn layout(title: &str, ctx: &PageContext, body: &str) -> String {
    let mut nav = String::new();
    nav.push_str(r#"<a href="/">Home</a> <a href="/about">About</a> <a href="/contact">Contact</a>"#);
    if ctx.is_admin() {
        nav.push_str(r#" <a href="/new-post">New Post</a>"#);
    }
    if ctx.logged_in() {
        nav.push_str(r#" <a href="/profile">Profile</a> <a href="/logout">Log Out</a>"#);
    } else {
        nav.push_str(r#" <a href="/login">Log In</a> <a href="/register">Register</a>"#);
    }

    let flash = ctx.flash.as_ref().map_or_else(String::new, |msg| {
        format!(
            r#"<div class="flash">{}</div>"#,
            encode_text(msg)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="/static/styles.css">
</head>
<body>
<nav>{nav}</nav>
{flash}
<main>
{body}
</main>
</body>
</html>
"#,
        title = encode_text(title),
    )
}

pub fn home_page(ctx: &PageContext, posts: &[PostView]) -> String {
    let mut body = String::from("<h1>The Blog</h1>\n");

    if posts.is_empty() {
        body.push_str("<p>No posts yet.</p>\n");
    }

    for view in posts {
        let post = &view.post;
        body.push_str(&format!(
            r#"<article class="post-preview">
<h2><a href="/post/{id}">{title}</a></h2>
<h3>{subtitle}</h3>
<p class="meta">Posted by {author} on {date}</p>
"#,
            id = post.id,
            title = encode_text(&post.title),
            subtitle = encode_text(&post.subtitle),
            author = encode_text(&view.author_name),
            date = encode_text(&post.date),
        ));
        if ctx.is_admin() {
            body.push_str(&format!(
                r#"<p><a href="/edit-post/{id}">Edit</a> <a href="/delete/{id}">Delete</a></p>
"#,
                id = post.id,
            ));
        }
        body.push_str("</article>\n");
    }

    layout("The Blog", ctx, &body)
}

pub fn post_page(ctx: &PageContext, view: &PostView, comments: &[CommentView]) -> String {
    let post = &view.post;
    let mut body = format!(
        r#"<article class="post">
<h1>{title}</h1>
<h2>{subtitle}</h2>
<p class="meta">Posted by {author} on {date}</p>
<img src="{img_url}" alt="">
<div class="post-body">
{post_body}
</div>
</article>
"#,
        title = encode_text(&post.title),
        subtitle = encode_text(&post.subtitle),
        author = encode_text(&view.author_name),
        date = encode_text(&post.date),
        img_url = encode_double_quoted_attribute(&post.img_url),
        // Rich text authored by the admin, stored verbatim.
        post_body = post.body,
    );

    if ctx.is_admin() {
        body.push_str(&format!(
            r#"<p><a href="/edit-post/{id}">Edit Post</a> <a href="/delete/{id}">Delete Post</a></p>
"#,
            id = post.id,
        ));
    }

    body.push_str("<section class=\"comments\">\n<h3>Comments</h3>\n");
    for comment in comments {
        body.push_str(&format!(
            r#"<div class="comment">
<p>{text}</p>
<p class="meta">{name} on {date}</p>
"#,
            text = encode_text(&comment.text),
            name = encode_text(&comment.commenter_name),
            date = encode_text(&comment.date),
        ));
        if ctx.logged_in() {
            body.push_str(&format!(
                r#"<p><a href="/delete-comment/{comment_id}/{post_id}">Delete</a></p>
"#,
                comment_id = comment.id,
                post_id = post.id,
            ));
        }
        body.push_str("</div>\n");
    }

    if ctx.logged_in() {
        body.push_str(&format!(
            r#"<form method="post" action="/post/{id}">
<textarea name="text" rows="4" required></textarea>
<button type="submit">Submit Comment</button>
</form>
"#,
            id = post.id,
        ));
    } else {
        body.push_str(
            r#"<p><a href="/login">Log in</a> or <a href="/register">register</a> to comment.</p>
"#,
        );
    }
    body.push_str("</section>\n");

    layout(&post.title, ctx, &body)
}

pub fn register_page(ctx: &PageContext, error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Register</h1>
{error}<form method="post" action="/register">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<label>Name <input type="text" name="name" required></label>
<button type="submit">Sign Up</button>
</form>
"#,
        error = error_fragment(error),
    );

    layout("Register", ctx, &body)
}

pub fn login_page(ctx: &PageContext, error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Log In</h1>
{error}<form method="post" action="/login">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log In</button>
</form>
"#,
        error = error_fragment(error),
    );

    layout("Log In", ctx, &body)
}

pub fn profile_page(ctx: &PageContext, user: &User) -> String {
    let body = format!(
        r#"<h1>{name}</h1>
<p>Email: {email}</p>
<p>Member since {created_at}</p>
"#,
        name = encode_text(&user.name),
        email = encode_text(&user.email),
        created_at = encode_text(&user.created_at),
    );

    layout("Profile", ctx, &body)
}

pub fn about_page(ctx: &PageContext) -> String {
    let body = r#"<h1>About</h1>
<p>A small blog: the site owner writes posts, registered readers leave comments.</p>
"#;

    layout("About", ctx, body)
}

pub fn contact_page(ctx: &PageContext, sent: bool, error: Option<&str>) -> String {
    let mut body = String::from("<h1>Contact</h1>\n");

    if sent {
        body.push_str("<p class=\"notice\">Your message has been sent.</p>\n");
    }
    body.push_str(&error_fragment(error));
    body.push_str(
        r#"<form method="post" action="/contact">
<label>Name <input type="text" name="name" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Phone <input type="text" name="phone"></label>
<label>Message <textarea name="msg" rows="6" required></textarea></label>
<button type="submit">Send</button>
</form>
"#,
    );

    layout("Contact", ctx, &body)
}

/// Shared by the new-post and edit-post routes; `action` decides where the
/// form submits and `values` pre-fills the fields.
pub fn post_form_page(
    ctx: &PageContext,
    heading: &str,
    action: &str,
    values: &PostForm,
    error: Option<&str>,
) -> String {
    let body = format!(
        r#"<h1>{heading}</h1>
{error}<form method="post" action="{action}">
<label>Title <input type="text" name="title" value="{title}" required></label>
<label>Subtitle <input type="text" name="subtitle" value="{subtitle}" required></label>
<label>Image URL <input type="text" name="img_url" value="{img_url}" required></label>
<label>Body <textarea name="body" rows="12" required>{post_body}</textarea></label>
<button type="submit">Submit</button>
</form>
"#,
        heading = encode_text(heading),
        error = error_fragment(error),
        action = encode_double_quoted_attribute(action),
        title = encode_double_quoted_attribute(&values.title),
        subtitle = encode_double_quoted_attribute(&values.subtitle),
        img_url = encode_double_quoted_attribute(&values.img_url),
        post_body = encode_text(&values.body),
    );

    layout(heading, ctx, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let ctx = PageContext::default();
    let body = format!(
        "<h1>{status}</h1>\n<p>{message}</p>\n",
        status = status,
        message = encode_text(message),
    );

    layout(
        status.canonical_reason().unwrap_or("Error"),
        &ctx,
        &body,
    )
}

fn error_fragment(error: Option<&str>) -> String {
    error.map_or_else(String::new, |msg| {
        format!("<p class=\"error\">{}</p>\n", encode_text(msg))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Post;

    fn sample_post() -> PostView {
        PostView {
            post: Post {
                id: 1,
                author_id: 1,
                title: "Hello <World>".to_string(),
                subtitle: "A & B".to_string(),
                date: "August 06, 2026".to_string(),
                body: "<p>Rich text</p>".to_string(),
                img_url: "https://example.com/x.jpg".to_string(),
            },
            author_name: "Alice".to_string(),
        }
    }

    #[test]
    fn test_user_text_is_escaped() {
        let ctx = PageContext::default();
        let html = home_page(&ctx, &[sample_post()]);

        assert!(html.contains("Hello &lt;World&gt;"));
        assert!(html.contains("A &amp; B"));
        assert!(!html.contains("Hello <World>"));
    }

    #[test]
    fn test_post_body_renders_rich_text() {
        let ctx = PageContext::default();
        let html = post_page(&ctx, &sample_post(), &[]);

        assert!(html.contains("<p>Rich text</p>"));
    }

    #[test]
    fn test_comment_text_is_escaped() {
        let ctx = PageContext::default();
        let comments = vec![CommentView {
            id: 7,
            text: "<script>alert(1)</script>".to_string(),
            date: "August 06, 2026".to_string(),
            commenter_name: "Mallory".to_string(),
        }];
        let html = post_page(&ctx, &sample_post(), &comments);

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_nav_reflects_session() {
        let anonymous = PageContext::default();
        let html = home_page(&anonymous, &[]);
        assert!(html.contains(r#"<a href="/login">"#));
        assert!(!html.contains(r#"<a href="/logout">"#));

        let admin = PageContext {
            user: Some(User {
                id: 1,
                email: "a@x.com".to_string(),
                name: "Alice".to_string(),
                is_admin: true,
                created_at: String::new(),
            }),
            flash: None,
        };
        let html = home_page(&admin, &[]);
        assert!(html.contains(r#"<a href="/new-post">"#));
        assert!(html.contains(r#"<a href="/logout">"#));
    }
}
