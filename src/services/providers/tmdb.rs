/// TMDb (The Movie Database) provider
///
/// API Flow:
/// 1. Listings: /search/movie, /movie/popular, /movie/top_rated, /movie/upcoming,
///    /discover/movie → paged `MovieSummary` results
/// 2. Details: /movie/{id}?append_to_response=videos,credits
/// 3. Trailers: /movie/{id}/videos
///
/// Every request carries `api_key` and `language` as query parameters.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieDetails, MoviePage, VideoList},
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
    cache_ttl: u64,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String, cache_ttl: u64) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            cache_ttl,
        }
    }

    /// Query parameters shared by every paged listing endpoint
    fn listing_params(language: &str, include_adult: bool, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("language", language.to_string()),
            ("include_adult", include_adult.to_string()),
            ("page", page.max(1).to_string()),
        ]
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url, endpoint)
    }

    /// Issues a GET against `endpoint` and decodes the JSON body
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                endpoint = %endpoint,
                status = %status,
                "TMDb request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDb API returned status {}: {}",
                status, body
            )));
        }

        let data = response.json::<T>().await?;
        tracing::debug!(endpoint = %endpoint, provider = "tmdb", "TMDb request completed");
        Ok(data)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn search(
        &self,
        query: &str,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::MovieSearch {
                query: query.to_string(),
                language: language.to_string(),
                include_adult,
                page,
            },
            self.cache_ttl,
            async move {
                let mut params = Self::listing_params(language, include_adult, page);
                params.push(("query", query.to_string()));

                let results: MoviePage = self.fetch("/search/movie", &params).await?;

                tracing::info!(
                    query = %query,
                    results = results.results.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(results)
            }
        )
    }

    async fn popular(
        &self,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage> {
        cached!(
            self.cache,
            CacheKey::Popular {
                language: language.to_string(),
                include_adult,
                page,
            },
            self.cache_ttl,
            async move {
                let params = Self::listing_params(language, include_adult, page);
                self.fetch::<MoviePage>("/movie/popular", &params).await
            }
        )
    }

    async fn top_rated(
        &self,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage> {
        let params = Self::listing_params(language, include_adult, page);
        self.fetch("/movie/top_rated", &params).await
    }

    async fn upcoming(
        &self,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage> {
        let params = Self::listing_params(language, include_adult, page);
        self.fetch("/movie/upcoming", &params).await
    }

    async fn by_genre(
        &self,
        genre_id: u64,
        language: &str,
        include_adult: bool,
        page: u32,
    ) -> AppResult<MoviePage> {
        let mut params = Self::listing_params(language, include_adult, page);
        params.push(("with_genres", genre_id.to_string()));
        params.push(("sort_by", "popularity.desc".to_string()));
        self.fetch("/discover/movie", &params).await
    }

    async fn details(&self, movie_id: u64, language: &str) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails {
                movie_id,
                language: language.to_string(),
            },
            self.cache_ttl,
            async move {
                let params = vec![
                    ("language", language.to_string()),
                    ("append_to_response", "videos,credits".to_string()),
                ];
                self.fetch::<MovieDetails>(&format!("/movie/{}", movie_id), &params)
                    .await
            }
        )
    }

    async fn videos(&self, movie_id: u64, language: &str) -> AppResult<VideoList> {
        let params = vec![("language", language.to_string())];
        self.fetch(&format!("/movie/{}/videos", movie_id), &params)
            .await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
