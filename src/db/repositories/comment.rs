use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::collections::HashMap;
use tracing::info;

use crate::entities::{comments, users};

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub commenter_id: i32,
    pub text: String,
    pub date: String,
}

impl From<comments::Model> for Comment {
    fn from(model: comments::Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            commenter_id: model.commenter_id,
            text: model.text,
            date: model.date,
        }
    }
}

/// A comment joined with its commenter's display name for rendering.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i32,
    pub text: String,
    pub date: String,
    pub commenter_name: String,
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Comments of a post with commenter names resolved, in insertion order.
    pub async fn list_for_post(&self, post_id: i32) -> Result<Vec<CommentView>> {
        let rows = comments::Entity::find()
            .filter(comments::Column::PostId.eq(post_id))
            .all(&self.conn)
            .await
            .context("Failed to list comments for post")?;

        let commenter_ids: Vec<i32> = rows.iter().map(|c| c.commenter_id).collect();
        let names: HashMap<i32, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(commenter_ids))
            .all(&self.conn)
            .await
            .context("Failed to resolve commenter names")?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|c| CommentView {
                id: c.id,
                text: c.text,
                date: c.date,
                commenter_name: names
                    .get(&c.commenter_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Comment>> {
        let comment = comments::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query comment by ID")?;

        Ok(comment.map(Comment::from))
    }

    pub async fn add(
        &self,
        post_id: i32,
        commenter_id: i32,
        text: &str,
        date: &str,
    ) -> Result<i32> {
        let active = comments::ActiveModel {
            post_id: Set(post_id),
            commenter_id: Set(commenter_id),
            text: Set(text.to_string()),
            date: Set(date.to_string()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert comment")?;

        info!("Added comment {} on post {}", model.id, post_id);
        Ok(model.id)
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = comments::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected > 0)
    }

    /// Delete every comment of a post. Runs before the post row itself is
    /// deleted so no orphaned foreign keys are left behind.
    pub async fn remove_for_post(&self, post_id: i32) -> Result<u64> {
        let result = comments::Entity::delete_many()
            .filter(comments::Column::PostId.eq(post_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete comments for post")?;

        if result.rows_affected > 0 {
            info!(
                "Deleted {} comment(s) of post {}",
                result.rows_affected, post_id
            );
        }
        Ok(result.rows_affected)
    }
}
