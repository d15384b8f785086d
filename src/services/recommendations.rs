use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    db::{load_json, save_json, KeyValueStore, StorageKey},
    error::{AppError, AppResult},
    models::{
        normalize_streamer, rank_recommendations, DownvoteOutcome, Identity, MovieSummary,
        Recommendation, RecommendationBoard, Trailer, UpvoteOutcome, VoteState,
    },
    services::catalog::CatalogService,
};

/// Where the movies of a feed came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// The streamer's ranked recommendations
    Recommended,
    /// Nothing qualified, so the catalog's popular list is shown instead
    Popular,
}

/// Vote totals shown on a recommended movie
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub likes: usize,
    pub dislikes: usize,
    pub score: i64,
    pub recommenders: Vec<String>,
}

impl From<&Recommendation> for VoteSummary {
    fn from(rec: &Recommendation) -> Self {
        Self {
            likes: rec.likes(),
            dislikes: rec.dislikes(),
            score: rec.score(),
            recommenders: rec.recommenders(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub movie: MovieSummary,
    pub poster_url: String,
    pub backdrop_url: String,
    /// Year shown on the movie card
    pub release_year: Option<String>,
    pub rating: f64,
    pub trailer: Option<Trailer>,
    pub votes: Option<VoteSummary>,
    pub viewer_vote: Option<VoteState>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamerFeed {
    pub streamer: String,
    pub source: FeedSource,
    /// Number of recommendations that passed filtering
    pub recommendation_count: usize,
    pub movies: Vec<FeedItem>,
}

/// Preferences a feed is rendered with
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub language: String,
    pub adult_filter: bool,
}

/// Owns the persisted recommendation board.
///
/// Every mutation is load, modify, save under one lock, so requests within this
/// process cannot lose each other's votes.
pub struct RecommendationService {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn board(&self) -> AppResult<RecommendationBoard> {
        load_json(self.store.as_ref(), StorageKey::Recommendations).await
    }

    /// A streamer's recommendations in stored order; empty for unknown streamers
    pub async fn recommendations_for(&self, streamer: &str) -> AppResult<Vec<Recommendation>> {
        Ok(self.board().await?.bucket(streamer).to_vec())
    }

    /// Applies `apply` to the board and persists the result.
    ///
    /// `apply` returns its output plus whether it changed anything; unchanged
    /// boards and failed updates are not written.
    pub(crate) async fn update<T, F>(&self, apply: F) -> AppResult<T>
    where
        F: FnOnce(&mut RecommendationBoard) -> AppResult<(T, bool)>,
    {
        let _guard = self.write_lock.lock().await;

        let mut board = self.board().await?;
        let (output, changed) = apply(&mut board)?;

        if changed {
            save_json(self.store.as_ref(), StorageKey::Recommendations, &board).await?;
        }

        Ok(output)
    }

    /// Like [`update`](Self::update) for mutations that must be followed by a
    /// second write.
    ///
    /// The board is always saved; if `commit` then fails, the board is put back
    /// the way it was before `apply`, still under the same lock.
    pub(crate) async fn update_committed<T, F, C, Fut>(&self, apply: F, commit: C) -> AppResult<T>
    where
        F: FnOnce(&mut RecommendationBoard) -> AppResult<T>,
        C: FnOnce(&T) -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let _guard = self.write_lock.lock().await;

        let mut board = self.board().await?;
        let previous = board.clone();
        let output = apply(&mut board)?;
        save_json(self.store.as_ref(), StorageKey::Recommendations, &board).await?;

        if let Err(e) = commit(&output).await {
            tracing::warn!(error = %e, "Follow-up write failed, restoring recommendations");
            if let Err(restore) =
                save_json(self.store.as_ref(), StorageKey::Recommendations, &previous).await
            {
                tracing::error!(error = %restore, "Failed to restore recommendations");
            }
            return Err(e);
        }

        Ok(output)
    }

    pub async fn upvote(
        &self,
        streamer: &str,
        movie_id: u64,
        movie: MovieSummary,
        voter: Option<&Identity>,
    ) -> AppResult<UpvoteOutcome> {
        let voter = require_voter(voter, "recommend movies")?;
        let streamer = require_streamer(streamer)?;
        if movie.id != movie_id {
            return Err(AppError::InvalidInput(format!(
                "Movie data is for {} but the vote is for {}",
                movie.id, movie_id
            )));
        }

        let outcome = self
            .update(|board| {
                let outcome = board.upvote(streamer, movie, voter);
                Ok((outcome, outcome != UpvoteOutcome::AlreadyRecommended))
            })
            .await?;

        tracing::info!(
            streamer = %streamer,
            movie_id = movie_id,
            user_id = %voter.id,
            outcome = ?outcome,
            "Upvote recorded"
        );

        Ok(outcome)
    }

    pub async fn downvote(
        &self,
        streamer: &str,
        movie_id: u64,
        voter: Option<&Identity>,
    ) -> AppResult<DownvoteOutcome> {
        let voter = require_voter(voter, "dislike movies")?;
        let streamer = require_streamer(streamer)?;

        let outcome = self
            .update(|board| {
                let outcome = board.downvote(streamer, movie_id, voter);
                Ok((outcome, outcome != DownvoteOutcome::NotRecommended))
            })
            .await?;

        tracing::info!(
            streamer = %streamer,
            movie_id = movie_id,
            user_id = %voter.id,
            outcome = ?outcome,
            "Downvote recorded"
        );

        Ok(outcome)
    }

    /// Builds the movie list a viewer sees on a streamer's page.
    ///
    /// Ranked recommendations when any qualify, otherwise the catalog's popular
    /// movies. Trailers are looked up concurrently for every movie shown.
    pub async fn feed(
        &self,
        streamer: &str,
        options: &FeedOptions,
        viewer: Option<&Identity>,
        catalog: &CatalogService,
    ) -> AppResult<StreamerFeed> {
        let streamer = require_streamer(streamer)?;
        let board = self.board().await?;
        let ranked = rank_recommendations(board.bucket(streamer), options.adult_filter);

        let (source, mut movies): (FeedSource, Vec<FeedItem>) = if ranked.is_empty() {
            let page = catalog
                .popular(&options.language, !options.adult_filter, 1)
                .await;
            let items = page
                .results
                .into_iter()
                .map(|movie| FeedItem {
                    poster_url: catalog.poster_url(movie.poster_path.as_deref()),
                    backdrop_url: catalog.backdrop_url(movie.backdrop_path.as_deref()),
                    release_year: movie.release_year().map(str::to_string),
                    rating: movie.vote_average,
                    movie,
                    trailer: None,
                    votes: None,
                    viewer_vote: None,
                })
                .collect();
            (FeedSource::Popular, items)
        } else {
            let items = ranked
                .iter()
                .map(|ranked| {
                    let rec = ranked.recommendation;
                    FeedItem {
                        movie: rec.movie_data.clone(),
                        poster_url: catalog.poster_url(rec.movie_data.poster_path.as_deref()),
                        backdrop_url: catalog
                            .backdrop_url(rec.movie_data.backdrop_path.as_deref()),
                        release_year: rec.movie_data.release_year().map(str::to_string),
                        rating: rec.rating(),
                        trailer: None,
                        votes: Some(VoteSummary::from(rec)),
                        viewer_vote: viewer
                            .and_then(|v| rec.vote_of(&v.id))
                            .map(|vote| vote.state()),
                    }
                })
                .collect();
            (FeedSource::Recommended, items)
        };

        let movie_ids: Vec<u64> = movies.iter().map(|item| item.movie.id).collect();
        let trailers = catalog.trailers(&movie_ids, &options.language).await;
        for (item, trailer) in movies.iter_mut().zip(trailers) {
            item.trailer = trailer;
        }

        tracing::info!(
            streamer = %streamer,
            source = ?source,
            movies = movies.len(),
            "Feed built"
        );

        Ok(StreamerFeed {
            streamer: streamer.to_string(),
            source,
            recommendation_count: ranked.len(),
            movies,
        })
    }
}

fn require_voter<'a>(voter: Option<&'a Identity>, action: &str) -> AppResult<&'a Identity> {
    voter.ok_or_else(|| AppError::Unauthenticated(format!("Log in to {}", action)))
}

/// Canonical streamer name, rejecting blank ones
pub(crate) fn require_streamer(streamer: &str) -> AppResult<&str> {
    let streamer = normalize_streamer(streamer);
    if streamer.is_empty() {
        return Err(AppError::InvalidInput("No streamer specified".to_string()));
    }
    Ok(streamer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::{MoviePage, Platform, Video, VideoList};
    use crate::services::providers::MockMetadataProvider;

    fn viewer(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            username: format!("user-{}", id),
            display_name: format!("user-{}", id),
            avatar: String::new(),
            platform: Platform::Twitch,
            is_streamer: false,
            language: "es".to_string(),
            adult_filter: true,
        }
    }

    fn movie(id: u64, adult: bool) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {}", id),
            adult,
            vote_average: 7.5,
            poster_path: Some(format!("/{}.jpg", id)),
            backdrop_path: None,
            release_date: None,
            overview: None,
        }
    }

    fn options(adult_filter: bool) -> FeedOptions {
        FeedOptions {
            language: "es".to_string(),
            adult_filter,
        }
    }

    /// Catalog whose popular list holds `popular_ids` and where every movie has a trailer
    fn catalog(popular_ids: Vec<u64>) -> CatalogService {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_popular().returning(move |_, _, _| {
            Ok(MoviePage {
                page: 1,
                results: popular_ids.iter().map(|&id| movie(id, false)).collect(),
                total_results: popular_ids.len() as u64,
                total_pages: 1,
            })
        });
        mock.expect_videos().returning(|movie_id, _| {
            Ok(VideoList {
                results: vec![Video {
                    key: format!("trailer-{}", movie_id),
                    name: "Trailer".to_string(),
                    site: "YouTube".to_string(),
                    video_type: "Trailer".to_string(),
                }],
            })
        });
        CatalogService::new(Arc::new(mock), "https://image.tmdb.org/t/p".to_string())
    }

    async fn seed(
        service: &RecommendationService,
        streamer: &str,
        m: MovieSummary,
        likes: usize,
        dislikes: usize,
    ) {
        for i in 0..likes {
            let voter = viewer(&format!("like-{}-{}", m.id, i));
            service
                .upvote(streamer, m.id, m.clone(), Some(&voter))
                .await
                .unwrap();
        }
        for i in 0..dislikes {
            let voter = viewer(&format!("dislike-{}-{}", m.id, i));
            service
                .downvote(streamer, m.id, Some(&voter))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_upvote_requires_identity() {
        let store = Arc::new(InMemoryStore::new());
        let service = RecommendationService::new(store.clone());

        let result = service.upvote("alice", 1, movie(1, false), None).await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
        assert_eq!(
            store
                .get(&StorageKey::Recommendations.to_string())
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_downvote_requires_identity() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        let result = service.downvote("alice", 1, None).await;
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_vote_requires_streamer() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        let result = service
            .upvote(" ", 1, movie(1, false), Some(&viewer("u1")))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_upvote_rejects_mismatched_movie() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        let result = service
            .upvote("alice", 2, movie(1, false), Some(&viewer("u1")))
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_votes_persist_across_instances() {
        let store = Arc::new(InMemoryStore::new());
        let service = RecommendationService::new(store.clone());
        let u1 = viewer("u1");

        assert_eq!(
            service
                .upvote("alice", 1, movie(1, false), Some(&u1))
                .await
                .unwrap(),
            UpvoteOutcome::Created
        );
        assert_eq!(
            service
                .upvote("alice", 1, movie(1, false), Some(&u1))
                .await
                .unwrap(),
            UpvoteOutcome::AlreadyRecommended
        );
        assert_eq!(
            service.downvote("alice", 1, Some(&u1)).await.unwrap(),
            DownvoteOutcome::Changed
        );

        let recs = RecommendationService::new(store)
            .recommendations_for("alice")
            .await
            .unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].users.len(), 1);
        assert!(recs[0].users[0].disliked);
        assert!(!recs[0].users[0].liked);
    }

    #[tokio::test]
    async fn test_downvote_on_unknown_movie_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let service = RecommendationService::new(store.clone());

        let outcome = service
            .downvote("alice", 99, Some(&viewer("u1")))
            .await
            .unwrap();

        assert_eq!(outcome, DownvoteOutcome::NotRecommended);
        assert_eq!(
            store
                .get(&StorageKey::Recommendations.to_string())
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_unknown_streamer_has_no_recommendations() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        assert!(service.recommendations_for("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_scenario_alice() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        seed(&service, "alice", movie(1, false), 3, 1).await;
        seed(&service, "alice", movie(2, false), 1, 2).await;

        let feed = service
            .feed("alice", &options(false), None, &catalog(vec![]))
            .await
            .unwrap();

        assert_eq!(feed.source, FeedSource::Recommended);
        assert_eq!(feed.recommendation_count, 1);
        assert_eq!(feed.movies.len(), 1);
        let item = &feed.movies[0];
        assert_eq!(item.movie.id, 1);
        assert_eq!(item.votes.as_ref().unwrap().score, 2);
        assert_eq!(item.votes.as_ref().unwrap().recommenders.len(), 3);
        assert_eq!(item.trailer.as_ref().unwrap().key, "trailer-1");
        assert_eq!(item.poster_url, "https://image.tmdb.org/t/p/w500/1.jpg");
    }

    #[tokio::test]
    async fn test_feed_falls_back_to_popular() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        seed(&service, "alice", movie(1, true), 4, 0).await;

        let feed = service
            .feed("alice", &options(true), None, &catalog(vec![10, 11]))
            .await
            .unwrap();

        assert_eq!(feed.source, FeedSource::Popular);
        assert_eq!(feed.recommendation_count, 0);
        let ids: Vec<u64> = feed.movies.iter().map(|m| m.movie.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(feed.movies.iter().all(|m| m.votes.is_none()));
    }

    #[tokio::test]
    async fn test_feed_reports_viewer_vote() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        let u1 = viewer("u1");
        seed(&service, "alice", movie(1, false), 2, 0).await;
        service
            .downvote("alice", 1, Some(&u1))
            .await
            .unwrap();

        let feed = service
            .feed("alice", &options(false), Some(&u1), &catalog(vec![]))
            .await
            .unwrap();
        assert_eq!(feed.movies[0].viewer_vote, Some(VoteState::Disliked));
    }

    #[tokio::test]
    async fn test_feed_uses_custom_score_as_rating() {
        let service = RecommendationService::new(Arc::new(InMemoryStore::new()));
        seed(&service, "alice", movie(1, false), 1, 0).await;
        service
            .update(|board| {
                board.find_mut("alice", 1).unwrap().custom_score = Some(9.0);
                Ok(((), true))
            })
            .await
            .unwrap();

        let feed = service
            .feed("alice", &options(false), None, &catalog(vec![]))
            .await
            .unwrap();
        assert_eq!(feed.movies[0].rating, 9.0);
    }
}
