/// Movie metadata provider abstraction
///
/// The board only needs listings, details and videos from a catalog. TMDb is the
/// one implementation; tests substitute the mock generated from this trait.
use crate::{
    error::AppResult,
    models::{MovieDetails, MoviePage, VideoList},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie catalog providers
///
/// Implementations return errors; degrading to empty results is the catalog
/// service's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search movies by title
    async fn search(
        &self,
        query: &str,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage>;

    async fn popular(&self, language: &str, include_adult: bool, page: u32)
        -> AppResult<MoviePage>;

    async fn top_rated(
        &self,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage>;

    async fn upcoming(
        &self,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage>;

    /// Most popular movies of one genre
    async fn by_genre(
        &self,
        genre_id: u64,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage>;

    /// Full record including videos and credits
    async fn details(&self, movie_id: u64, language: &str) -> AppResult<MovieDetails>;

    /// Videos published for a movie in one language
    async fn videos(&self, movie_id: u64, language: &str) -> AppResult<VideoList>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
