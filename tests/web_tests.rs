use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use quillet::{AppState, Config};

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_url = "sqlite::memory:".to_string();
    // One pooled connection so the in-memory database is shared by every
    // request in the test.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;

    let state = quillet::create_app_state(config)
        .await
        .expect("Failed to create app state");
    let app = quillet::web::router(state.clone());
    (app, state)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: String, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

fn encode(value: &str) -> String {
    urlencoding::encode(value).to_string()
}

/// Register an account and return its session cookie.
async fn register(app: &Router, email: &str, password: &str, name: &str) -> String {
    let body = format!(
        "email={}&password={}&name={}",
        encode(email),
        encode(password),
        encode(name)
    );
    let response = app
        .clone()
        .oneshot(post_form("/register", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).expect("Registration should establish a session")
}

async fn create_post(app: &Router, state: &AppState, cookie: &str, title: &str) -> i32 {
    let body = format!(
        "title={}&subtitle={}&body={}&img_url={}",
        encode(title),
        encode("A subtitle"),
        encode("<p>Hello world</p>"),
        encode("https://example.com/cover.jpg")
    );
    let response = app
        .clone()
        .oneshot(post_form("/new-post", body, Some(cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    state
        .store()
        .list_posts()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.title == title)
        .expect("Post should exist after creation")
        .id
}

#[tokio::test]
async fn test_duplicate_email_registration_creates_no_second_row() {
    let (app, state) = spawn_app().await;

    register(&app, "a@x.com", "pw1", "Alice").await;

    let body = format!(
        "email={}&password={}&name={}",
        encode("a@x.com"),
        encode("other"),
        encode("Impostor")
    );
    let response = app
        .clone()
        .oneshot(post_form("/register", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert_eq!(state.store().count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_fresh_registration_is_authenticated() {
    let (app, _state) = spawn_app().await;

    let cookie = register(&app, "a@x.com", "pw1", "Alice").await;

    let response = app
        .clone()
        .oneshot(get("/profile", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Alice"));
    assert!(html.contains("a@x.com"));
}

#[tokio::test]
async fn test_profile_requires_authentication() {
    let (app, _state) = spawn_app().await;

    let response = app.clone().oneshot(get("/profile", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_wrong_password_establishes_no_session() {
    let (app, _state) = spawn_app().await;

    register(&app, "a@x.com", "pw1", "Alice").await;

    let body = format!("email={}&password={}", encode("a@x.com"), encode("wrong"));
    let response = app
        .clone()
        .oneshot(post_form("/login", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    // The login page redisplays with the error.
    let cookie = session_cookie(&response);
    let response = app
        .clone()
        .oneshot(get("/login", cookie.as_deref()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Password incorrect"));

    // The bounced request carried only a flash message; the cookie must not
    // resolve to an authenticated user.
    let response = app
        .clone()
        .oneshot(get("/profile", cookie.as_deref()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let (app, _state) = spawn_app().await;

    let body = format!("email={}&password={}", encode("ghost@x.com"), encode("pw"));
    let response = app
        .clone()
        .oneshot(post_form("/login", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let cookie = session_cookie(&response);
    let response = app
        .clone()
        .oneshot(get("/login", cookie.as_deref()))
        .await
        .unwrap();
    assert!(body_string(response).await.contains("Email does not exist"));
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_everyone_but_admin() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let user_cookie = register(&app, "b@x.com", "pw2", "Bob").await;

    // The first registered account is the admin.
    let response = app
        .clone()
        .oneshot(get("/new-post", Some(&admin_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Everyone else is rejected before the handler runs.
    for cookie in [Some(user_cookie.as_str()), None] {
        let response = app.clone().oneshot(get("/new-post", cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .clone()
            .oneshot(get("/edit-post/1", cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app.clone().oneshot(get("/delete/1", cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // A forbidden POST mutates nothing.
    let body = format!(
        "title={}&subtitle=s&body=b&img_url={}",
        encode("Sneaky"),
        encode("https://example.com/x.jpg")
    );
    let response = app
        .clone()
        .oneshot(post_form("/new-post", body, Some(&user_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(state.store().list_posts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_anonymous_comment_is_rejected() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let post_id = create_post(&app, &state, &admin_cookie, "Hello").await;

    let body = format!("text={}", encode("drive-by comment"));
    let response = app
        .clone()
        .oneshot(post_form(&format!("/post/{post_id}"), body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(
        state
            .store()
            .comments_for_post(post_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_authenticated_comment_is_stored_and_shown() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let user_cookie = register(&app, "b@x.com", "pw2", "Bob").await;
    let post_id = create_post(&app, &state, &admin_cookie, "Hello").await;

    let body = format!("text={}", encode("Nice post!"));
    let response = app
        .clone()
        .oneshot(post_form(
            &format!("/post/{post_id}"),
            body,
            Some(&user_cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/post/{post_id}"));

    let response = app
        .clone()
        .oneshot(get(&format!("/post/{post_id}"), None))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Nice post!"));
    assert!(html.contains("Bob"));
}

#[tokio::test]
async fn test_duplicate_title_is_surfaced_not_crashed() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    create_post(&app, &state, &admin_cookie, "Hello").await;

    let body = format!(
        "title={}&subtitle=s&body=b&img_url={}",
        encode("Hello"),
        encode("https://example.com/x.jpg")
    );
    let response = app
        .clone()
        .oneshot(post_form("/new-post", body, Some(&admin_cookie)))
        .await
        .unwrap();

    // The form redisplays with a user-visible message.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("already exists"));

    let posts = state.store().list_posts().await.unwrap();
    assert_eq!(posts.iter().filter(|p| p.title == "Hello").count(), 1);
}

#[tokio::test]
async fn test_edit_preserves_id_author_and_date() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let post_id = create_post(&app, &state, &admin_cookie, "Hello").await;
    let original = state.store().get_post(post_id).await.unwrap().unwrap();

    let body = format!(
        "title={}&subtitle={}&body={}&img_url={}",
        encode("Hello, renamed"),
        encode("New subtitle"),
        encode("<p>Rewritten</p>"),
        encode("https://example.com/new.jpg")
    );
    let response = app
        .clone()
        .oneshot(post_form(
            &format!("/edit-post/{post_id}"),
            body,
            Some(&admin_cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/post/{post_id}"));

    let edited = state.store().get_post(post_id).await.unwrap().unwrap();
    assert_eq!(edited.id, original.id);
    assert_eq!(edited.author_id, original.author_id);
    assert_eq!(edited.date, original.date);
    assert_eq!(edited.title, "Hello, renamed");
    assert_eq!(edited.subtitle, "New subtitle");
    assert_eq!(edited.body, "<p>Rewritten</p>");
    assert_eq!(edited.img_url, "https://example.com/new.jpg");
}

#[tokio::test]
async fn test_delete_post_removes_post_and_comments() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let user_cookie = register(&app, "b@x.com", "pw2", "Bob").await;
    let post_id = create_post(&app, &state, &admin_cookie, "Hello").await;

    let body = format!("text={}", encode("soon to be gone"));
    app.clone()
        .oneshot(post_form(
            &format!("/post/{post_id}"),
            body,
            Some(&user_cookie),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/delete/{post_id}"), Some(&admin_cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    assert!(state.store().get_post(post_id).await.unwrap().is_none());
    assert!(
        state
            .store()
            .comments_for_post(post_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_delete_comment_redirects_to_caller_supplied_post() {
    let (app, state) = spawn_app().await;

    let admin_cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let user_cookie = register(&app, "b@x.com", "pw2", "Bob").await;
    let post_id = create_post(&app, &state, &admin_cookie, "Hello").await;

    let body = format!("text={}", encode("delete me"));
    app.clone()
        .oneshot(post_form(
            &format!("/post/{post_id}"),
            body,
            Some(&user_cookie),
        ))
        .await
        .unwrap();
    let comment_id = state.store().comments_for_post(post_id).await.unwrap()[0].id;

    // Any authenticated user may delete, and the redirect target is the
    // post id from the URL, not one derived from the comment.
    let response = app
        .clone()
        .oneshot(get(
            &format!("/delete-comment/{comment_id}/999"),
            Some(&user_cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/post/999");
    assert!(
        state
            .store()
            .comments_for_post(post_id)
            .await
            .unwrap()
            .is_empty()
    );

    // Anonymous deletion is bounced to login.
    let response = app
        .clone()
        .oneshot(get(&format!("/delete-comment/1/{post_id}"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_unknown_post_is_a_404_not_a_crash() {
    let (app, _state) = spawn_app().await;

    let response = app.clone().oneshot(get("/post/42", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_pages_render() {
    let (app, _state) = spawn_app().await;

    for uri in ["/", "/about", "/contact", "/login", "/register"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
    }

    let response = app
        .clone()
        .oneshot(get("/static/styles.css", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/no-such-page", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_failure_is_user_visible() {
    let (app, _state) = spawn_app().await;

    // Mail is not configured in tests; the contact action must fail
    // visibly rather than pretend the message was sent.
    let body = format!(
        "name={}&email={}&phone={}&msg={}",
        encode("Bob"),
        encode("bob@example.com"),
        encode("555-0100"),
        encode("Hi there")
    );
    let response = app
        .clone()
        .oneshot(post_form("/contact", body, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_end_to_end_admin_flow() {
    let (app, state) = spawn_app().await;

    // Register: the first account becomes the admin.
    let cookie = register(&app, "a@x.com", "pw1", "Alice").await;
    let user = state
        .store()
        .get_user_by_email("a@x.com")
        .await
        .unwrap()
        .unwrap();
    assert!(user.is_admin);

    // Create a post and see it on the home page.
    let post_id = create_post(&app, &state, &cookie, "Hello").await;
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Hello"));

    // Edit the subtitle; title stays.
    let body = format!(
        "title={}&subtitle={}&body={}&img_url={}",
        encode("Hello"),
        encode("Changed subtitle"),
        encode("<p>Hello world</p>"),
        encode("https://example.com/cover.jpg")
    );
    let response = app
        .clone()
        .oneshot(post_form(
            &format!("/edit-post/{post_id}"),
            body,
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get(&format!("/post/{post_id}"), None))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Hello"));
    assert!(html.contains("Changed subtitle"));

    // Delete; the home page no longer lists it.
    let response = app
        .clone()
        .oneshot(get(&format!("/delete/{post_id}"), Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    let html = body_string(response).await;
    assert!(!html.contains("Hello"));

    // Log out; the session is gone.
    let response = app.clone().oneshot(get("/logout", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}
