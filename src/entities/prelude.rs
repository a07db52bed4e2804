pub use super::blog_posts::Entity as BlogPosts;
pub use super::comments::Entity as Comments;
pub use super::users::Entity as Users;
