pub mod cache;
pub mod rating;
pub mod user;
