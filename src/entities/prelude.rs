pub use super::ratings::Entity as Ratings;
pub use super::response_cache::Entity as ResponseCache;
pub use super::users::Entity as Users;
