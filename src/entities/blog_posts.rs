use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blog_posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub author_id: i32,

    #[sea_orm(unique)]
    pub title: String,

    pub subtitle: String,

    /// Human-readable publish date ("August 06, 2026"), fixed at creation.
    pub date: String,

    /// Rich-text body as authored in the editor.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    pub img_url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Author,
}

impl ActiveModelBehavior for ActiveModel {}
