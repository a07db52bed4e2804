use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::collections::HashMap;
use tracing::info;

use crate::entities::{blog_posts, users};

#[derive(Debug, Clone)]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
}

impl From<blog_posts::Model> for Post {
    fn from(model: blog_posts::Model) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            title: model.title,
            subtitle: model.subtitle,
            date: model.date,
            body: model.body,
            img_url: model.img_url,
        }
    }
}

/// A post joined with its author's display name for rendering.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author_name: String,
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All posts in insertion order.
    pub async fn list_all(&self) -> Result<Vec<Post>> {
        let rows = blog_posts::Entity::find()
            .all(&self.conn)
            .await
            .context("Failed to list posts")?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Post>> {
        let post = blog_posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post by ID")?;

        Ok(post.map(Post::from))
    }

    /// All posts with author names resolved, in insertion order.
    pub async fn list_with_authors(&self) -> Result<Vec<PostView>> {
        let posts = self.list_all().await?;

        let author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
        let names: HashMap<i32, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(author_ids))
            .all(&self.conn)
            .await
            .context("Failed to resolve author names")?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| {
                let author_name = names
                    .get(&post.author_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string());
                PostView { post, author_name }
            })
            .collect())
    }

    pub async fn get_with_author(&self, id: i32) -> Result<Option<PostView>> {
        let Some(post) = self.get(id).await? else {
            return Ok(None);
        };

        let author_name = users::Entity::find_by_id(post.author_id)
            .one(&self.conn)
            .await
            .context("Failed to resolve post author")?
            .map_or_else(|| "Unknown".to_string(), |u| u.name);

        Ok(Some(PostView { post, author_name }))
    }

    /// Whether a title is already used by a post other than `exclude_id`.
    /// Backs the user-visible duplicate-title message; the unique index on
    /// the title column remains the hard guarantee.
    pub async fn title_taken(&self, title: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query =
            blog_posts::Entity::find().filter(blog_posts::Column::Title.eq(title));

        if let Some(id) = exclude_id {
            query = query.filter(blog_posts::Column::Id.ne(id));
        }

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check title uniqueness")?;

        Ok(existing.is_some())
    }

    pub async fn add(
        &self,
        author_id: i32,
        title: &str,
        subtitle: &str,
        body: &str,
        img_url: &str,
        date: &str,
    ) -> Result<i32> {
        let active = blog_posts::ActiveModel {
            author_id: Set(author_id),
            title: Set(title.to_string()),
            subtitle: Set(subtitle.to_string()),
            date: Set(date.to_string()),
            body: Set(body.to_string()),
            img_url: Set(img_url.to_string()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert post")?;

        info!("Created post {}: {}", model.id, model.title);
        Ok(model.id)
    }

    /// Overwrite the mutable fields only. The id, author, and original
    /// publish date never change across edits.
    pub async fn update(
        &self,
        id: i32,
        title: &str,
        subtitle: &str,
        body: &str,
        img_url: &str,
    ) -> Result<bool> {
        let post = blog_posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post for update")?;

        let Some(post) = post else {
            return Ok(false);
        };

        let mut active: blog_posts::ActiveModel = post.into();
        active.title = Set(title.to_string());
        active.subtitle = Set(subtitle.to_string());
        active.body = Set(body.to_string());
        active.img_url = Set(img_url.to_string());
        active
            .update(&self.conn)
            .await
            .context("Failed to update post")?;

        info!("Updated post {}", id);
        Ok(true)
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = blog_posts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        if result.rows_affected > 0 {
            info!("Deleted post {}", id);
        }
        Ok(result.rows_affected > 0)
    }
}
