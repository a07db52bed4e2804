use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::comment::{Comment, CommentView};
pub use repositories::post::{Post, PostView};
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    fn comment_repo(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, email: &str, password: &str, name: &str) -> Result<User> {
        self.user_repo().create(email, password, name).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        self.post_repo().list_all().await
    }

    pub async fn get_post(&self, id: i32) -> Result<Option<Post>> {
        self.post_repo().get(id).await
    }

    pub async fn list_posts_with_authors(&self) -> Result<Vec<PostView>> {
        self.post_repo().list_with_authors().await
    }

    pub async fn get_post_with_author(&self, id: i32) -> Result<Option<PostView>> {
        self.post_repo().get_with_author(id).await
    }

    pub async fn post_title_taken(&self, title: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.post_repo().title_taken(title, exclude_id).await
    }

    pub async fn add_post(
        &self,
        author_id: i32,
        title: &str,
        subtitle: &str,
        body: &str,
        img_url: &str,
        date: &str,
    ) -> Result<i32> {
        self.post_repo()
            .add(author_id, title, subtitle, body, img_url, date)
            .await
    }

    pub async fn update_post(
        &self,
        id: i32,
        title: &str,
        subtitle: &str,
        body: &str,
        img_url: &str,
    ) -> Result<bool> {
        self.post_repo()
            .update(id, title, subtitle, body, img_url)
            .await
    }

    /// Delete a post together with its comments.
    pub async fn remove_post(&self, id: i32) -> Result<bool> {
        self.comment_repo().remove_for_post(id).await?;
        self.post_repo().remove(id).await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub async fn comments_for_post(&self, post_id: i32) -> Result<Vec<CommentView>> {
        self.comment_repo().list_for_post(post_id).await
    }

    pub async fn add_comment(
        &self,
        post_id: i32,
        commenter_id: i32,
        text: &str,
        date: &str,
    ) -> Result<i32> {
        self.comment_repo()
            .add(post_id, commenter_id, text, date)
            .await
    }

    pub async fn get_comment(&self, id: i32) -> Result<Option<Comment>> {
        self.comment_repo().get(id).await
    }

    pub async fn remove_comment(&self, id: i32) -> Result<bool> {
        self.comment_repo().remove(id).await
    }
}
