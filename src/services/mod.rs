pub mod movie_service;
pub mod movie_service_impl;
pub use movie_service::{MovieDetail, MovieError, MovieService, PopularMovies};
pub use movie_service_impl::CachedMovieService;

pub mod rating_service;
pub mod rating_service_impl;
pub use rating_service::{RatingError, RatingService};
pub use rating_service_impl::SeaOrmRatingService;
