use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub post_id: i32,

    pub commenter_id: i32,

    pub text: String,

    pub date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blog_posts::Entity",
        from = "Column::PostId",
        to = "super::blog_posts::Column::Id"
    )]
    Post,

    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CommenterId",
        to = "super::users::Column::Id"
    )]
    Commenter,
}

impl ActiveModelBehavior for ActiveModel {}
