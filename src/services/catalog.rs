use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MoviePage, Trailer},
    services::providers::MetadataProvider,
};

const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w1280";
const POSTER_PLACEHOLDER: &str =
    "https://via.placeholder.com/500x750/1e1b4b/8B5CF6?text=No+Image";
const BACKDROP_PLACEHOLDER: &str =
    "https://via.placeholder.com/1280x720/1e1b4b/8B5CF6?text=No+Image";

/// Language tried when a movie has no trailer in the viewer's language
const FALLBACK_TRAILER_LANGUAGE: &str = "en";

/// Soft-failing front for the metadata provider.
///
/// A catalog outage must never take a page down with it, so every provider error
/// is logged and replaced with an empty page or `None`. Only caller mistakes
/// (such as a blank search query) surface as errors.
#[derive(Clone)]
pub struct CatalogService {
    provider: Arc<dyn MetadataProvider>,
    image_base_url: String,
}

impl CatalogService {
    pub fn new(provider: Arc<dyn MetadataProvider>, image_base_url: String) -> Self {
        Self {
            provider,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn search(
        &self,
        query: &str,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let result = self
            .provider
            .search(query, language, include_adult, page)
            .await;
        Ok(self.page_or_empty(result, "search"))
    }

    pub async fn popular(&self, language: &str, include_adult: bool, page: u32) -> MoviePage {
        let result = self.provider.popular(language, include_adult, page).await;
        self.page_or_empty(result, "popular")
    }

    pub async fn top_rated(&self, language: &str, include_adult: bool, page: u32) -> MoviePage {
        let result = self.provider.top_rated(language, include_adult, page).await;
        self.page_or_empty(result, "top_rated")
    }

    pub async fn upcoming(&self, language: &str, include_adult: bool, page: u32) -> MoviePage {
        let result = self.provider.upcoming(language, include_adult, page).await;
        self.page_or_empty(result, "upcoming")
    }

    pub async fn by_genre(
        &self,
        genre_id: u64,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> MoviePage {
        let result = self
            .provider
            .by_genre(genre_id, language, include_adult, page)
            .await;
        self.page_or_empty(result, "by_genre")
    }

    pub async fn details(&self, movie_id: u64, language: &str) -> Option<MovieDetails> {
        match self.provider.details(movie_id, language).await {
            Ok(details) => Some(details),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    movie_id = movie_id,
                    provider = self.provider.name(),
                    "Movie details unavailable"
                );
                None
            }
        }
    }

    /// First YouTube trailer in `language`, falling back to English
    pub async fn trailer(&self, movie_id: u64, language: &str) -> Option<Trailer> {
        find_trailer(self.provider.as_ref(), movie_id, language).await
    }

    /// Resolves trailers for several movies concurrently.
    ///
    /// The result is aligned with `movie_ids`; a failed lookup only costs that
    /// movie its trailer.
    pub async fn trailers(&self, movie_ids: &[u64], language: &str) -> Vec<Option<Trailer>> {
        let mut tasks = Vec::with_capacity(movie_ids.len());

        for &movie_id in movie_ids {
            let provider = self.provider.clone();
            let language = language.to_string();
            let task = tokio::spawn(async move {
                find_trailer(provider.as_ref(), movie_id, &language).await
            });
            tasks.push(task);
        }

        let mut trailers = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(trailer) => trailers.push(trailer),
                Err(e) => {
                    tracing::error!(error = %e, "Trailer task join error");
                    trailers.push(None);
                }
            }
        }

        tracing::debug!(
            requested = movie_ids.len(),
            found = trailers.iter().filter(|t| t.is_some()).count(),
            "Trailers resolved"
        );

        trailers
    }

    pub fn poster_url(&self, path: Option<&str>) -> String {
        self.image_url(path, POSTER_SIZE, POSTER_PLACEHOLDER)
    }

    pub fn backdrop_url(&self, path: Option<&str>) -> String {
        self.image_url(path, BACKDROP_SIZE, BACKDROP_PLACEHOLDER)
    }

    fn image_url(&self, path: Option<&str>, size: &str, placeholder: &str) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(path) => format!("{}/{}{}", self.image_base_url, size, path),
            None => placeholder.to_string(),
        }
    }

    fn page_or_empty(&self, result: AppResult<MoviePage>, listing: &str) -> MoviePage {
        match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    listing = %listing,
                    provider = self.provider.name(),
                    "Catalog listing failed, returning empty page"
                );
                MoviePage::empty()
            }
        }
    }
}

async fn find_trailer(
    provider: &dyn MetadataProvider,
    movie_id: u64,
    language: &str,
) -> Option<Trailer> {
    let videos = match provider.videos(movie_id, language).await {
        Ok(videos) => videos,
        Err(e) => {
            tracing::warn!(error = %e, movie_id = movie_id, "Trailer lookup failed");
            return None;
        }
    };

    if let Some(video) = videos.first_trailer() {
        return Some(video.clone().into());
    }

    if language == FALLBACK_TRAILER_LANGUAGE {
        return None;
    }

    match provider.videos(movie_id, FALLBACK_TRAILER_LANGUAGE).await {
        Ok(videos) => videos.first_trailer().cloned().map(Trailer::from),
        Err(e) => {
            tracing::warn!(error = %e, movie_id = movie_id, "Fallback trailer lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieSummary, Video, VideoList};
    use crate::services::providers::MockMetadataProvider;
    use mockall::predicate::eq;

    fn youtube_trailer(key: &str) -> VideoList {
        VideoList {
            results: vec![Video {
                key: key.to_string(),
                name: "Trailer".to_string(),
                site: "YouTube".to_string(),
                video_type: "Trailer".to_string(),
            }],
        }
    }

    fn page_of(ids: &[u64]) -> MoviePage {
        MoviePage {
            page: 1,
            results: ids
                .iter()
                .map(|&id| MovieSummary {
                    id,
                    title: format!("Movie {}", id),
                    adult: false,
                    vote_average: 6.0,
                    poster_path: None,
                    backdrop_path: None,
                    release_date: None,
                    overview: None,
                })
                .collect(),
            total_results: ids.len() as u64,
            total_pages: 1,
        }
    }

    fn catalog(mock: MockMetadataProvider) -> CatalogService {
        CatalogService::new(Arc::new(mock), "https://image.tmdb.org/t/p/".to_string())
    }

    fn mock_provider() -> MockMetadataProvider {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock
    }

    #[tokio::test]
    async fn test_search_rejects_empty_query_without_calling_provider() {
        let mut mock = mock_provider();
        mock.expect_search().never();

        let result = catalog(mock).search("  ", "es", false, 1).await;
        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_empty() {
        let mut mock = mock_provider();
        mock.expect_search()
            .returning(|_, _, _, _| Err(AppError::ExternalApi("down".to_string())));

        let page = catalog(mock).search("matrix", "es", false, 1).await.unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_results, 0);
    }

    #[tokio::test]
    async fn test_popular_passes_through() {
        let mut mock = mock_provider();
        mock.expect_popular()
            .with(eq("en"), eq(true), eq(1))
            .returning(|_, _, _| Ok(page_of(&[1, 2])));

        let page = catalog(mock).popular("en", true, 1).await;
        assert_eq!(page.results.len(), 2);
    }

    #[tokio::test]
    async fn test_details_failure_is_none() {
        let mut mock = mock_provider();
        mock.expect_details()
            .returning(|_, _| Err(AppError::ExternalApi("404".to_string())));

        assert!(catalog(mock).details(1, "es").await.is_none());
    }

    #[tokio::test]
    async fn test_trailer_in_requested_language() {
        let mut mock = mock_provider();
        mock.expect_videos()
            .with(eq(7), eq("es"))
            .times(1)
            .returning(|_, _| Ok(youtube_trailer("es-key")));

        let trailer = catalog(mock).trailer(7, "es").await.unwrap();
        assert_eq!(trailer.key, "es-key");
    }

    #[tokio::test]
    async fn test_trailer_falls_back_to_english() {
        let mut mock = mock_provider();
        mock.expect_videos()
            .with(eq(7), eq("es"))
            .returning(|_, _| Ok(VideoList::default()));
        mock.expect_videos()
            .with(eq(7), eq("en"))
            .returning(|_, _| Ok(youtube_trailer("en-key")));

        let trailer = catalog(mock).trailer(7, "es").await.unwrap();
        assert_eq!(trailer.key, "en-key");
    }

    #[tokio::test]
    async fn test_no_second_lookup_when_already_english() {
        let mut mock = mock_provider();
        mock.expect_videos()
            .with(eq(7), eq("en"))
            .times(1)
            .returning(|_, _| Ok(VideoList::default()));

        assert!(catalog(mock).trailer(7, "en").await.is_none());
    }

    #[tokio::test]
    async fn test_trailers_isolate_failures() {
        let mut mock = mock_provider();
        mock.expect_videos()
            .with(eq(1), eq("en"))
            .returning(|_, _| Ok(youtube_trailer("one")));
        mock.expect_videos()
            .with(eq(2), eq("en"))
            .returning(|_, _| Err(AppError::ExternalApi("timeout".to_string())));
        mock.expect_videos()
            .with(eq(3), eq("en"))
            .returning(|_, _| Ok(youtube_trailer("three")));

        let trailers = catalog(mock).trailers(&[1, 2, 3], "en").await;
        assert_eq!(trailers.len(), 3);
        assert_eq!(trailers[0].as_ref().unwrap().key, "one");
        assert!(trailers[1].is_none());
        assert_eq!(trailers[2].as_ref().unwrap().key, "three");
    }

    #[test]
    fn test_image_urls() {
        let catalog = catalog(mock_provider());
        assert_eq!(
            catalog.poster_url(Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            catalog.backdrop_url(Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w1280/abc.jpg"
        );
        assert_eq!(catalog.poster_url(None), POSTER_PLACEHOLDER);
        assert_eq!(catalog.poster_url(Some("")), POSTER_PLACEHOLDER);
    }
}
