pub mod prelude;

pub mod ratings;
pub mod response_cache;
pub mod users;
