use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::{AuditEntry, Identity, Recommendation, RecommendationBoard},
    services::{
        audit::AuditService,
        identity::IdentityService,
        recommendations::{require_streamer, RecommendationService},
    },
};

pub const MIN_CUSTOM_SCORE: f64 = 0.0;
pub const MAX_CUSTOM_SCORE: f64 = 10.0;

const ACTION_SCORE_UPDATED: &str = "Score updated";
const ACTION_RECOMMENDATION_DELETED: &str = "Recommendation deleted";

/// Board-wide totals for the admin dashboard
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_streamers: usize,
    /// Likes across every streamer's recommendations
    pub total_recommendations: usize,
    /// Distinct voters across the whole board
    pub total_users: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOverview {
    pub movie_id: u64,
    pub title: String,
    pub likes: usize,
    pub dislikes: usize,
    pub rating: f64,
    pub custom_score: Option<f64>,
}

impl From<&Recommendation> for RecommendationOverview {
    fn from(rec: &Recommendation) -> Self {
        Self {
            movie_id: rec.movie_id,
            title: rec.movie_data.title.clone(),
            likes: rec.likes(),
            dislikes: rec.dislikes(),
            rating: rec.rating(),
            custom_score: rec.custom_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamerOverview {
    pub username: String,
    pub movie_count: usize,
    pub like_count: usize,
    pub recommendations: Vec<RecommendationOverview>,
}

/// Result of a custom score change
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreChange {
    pub movie_id: u64,
    pub previous: f64,
    pub current: f64,
}

/// Admin overrides on the recommendation board.
///
/// Callers pass the identity performing the action, which must be an admin.
/// Every successful mutation is written to the audit log; if that write fails
/// the board is left as it was.
pub struct AdminService {
    recommendations: Arc<RecommendationService>,
    audit: Arc<AuditService>,
    identity: Arc<IdentityService>,
}

impl AdminService {
    pub fn new(
        recommendations: Arc<RecommendationService>,
        audit: Arc<AuditService>,
        identity: Arc<IdentityService>,
    ) -> Self {
        Self {
            recommendations,
            audit,
            identity,
        }
    }

    fn ensure_admin(&self, admin: &Identity) -> AppResult<()> {
        if !self.identity.is_admin(admin) {
            tracing::debug!(username = %admin.username, "Admin action refused");
            return Err(AppError::Forbidden(
                "Administrator rights required".to_string(),
            ));
        }
        Ok(())
    }

    /// Overrides the rating shown for a recommendation; vote counts are untouched
    pub async fn set_custom_score(
        &self,
        admin: &Identity,
        streamer: &str,
        movie_id: u64,
        score: f64,
    ) -> AppResult<ScoreChange> {
        self.ensure_admin(admin)?;
        let streamer = require_streamer(streamer)?;
        validate_score(score)?;

        let audit = self.audit.begin().await?;
        let (change, _) = self
            .recommendations
            .update_committed(
                |board| {
                    let rec = find_recommendation(board, streamer, movie_id)?;
                    let previous = rec.rating();
                    rec.custom_score = Some(score);
                    rec.movie_data.vote_average = score;

                    let change = ScoreChange {
                        movie_id,
                        previous,
                        current: score,
                    };
                    Ok((change, rec.movie_data.title.clone()))
                },
                |(change, title): &(ScoreChange, String)| {
                    audit.commit(AuditEntry::new(
                        ACTION_SCORE_UPDATED,
                        format!(
                            "Movie: {} | Streamer: {} | {:.1} -> {:.1}",
                            title, streamer, change.previous, change.current
                        ),
                        &admin.username,
                    ))
                },
            )
            .await?;

        Ok(change)
    }

    /// Removes a recommendation; a streamer left with none disappears from the board
    pub async fn delete_recommendation(
        &self,
        admin: &Identity,
        streamer: &str,
        movie_id: u64,
    ) -> AppResult<Recommendation> {
        self.ensure_admin(admin)?;
        let streamer = require_streamer(streamer)?;

        let audit = self.audit.begin().await?;
        self.recommendations
            .update_committed(
                |board| {
                    board
                        .remove(streamer, movie_id)
                        .ok_or_else(|| not_found(streamer, movie_id))
                },
                |removed: &Recommendation| {
                    audit.commit(AuditEntry::new(
                        ACTION_RECOMMENDATION_DELETED,
                        format!(
                            "Movie: {} | Streamer: {}",
                            removed.movie_data.title, streamer
                        ),
                        &admin.username,
                    ))
                },
            )
            .await
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let board = self.recommendations.board().await?;
        Ok(compute_stats(&board))
    }

    /// Every streamer with at least one recommendation
    pub async fn streamers(&self) -> AppResult<Vec<StreamerOverview>> {
        let board = self.recommendations.board().await?;

        Ok(board
            .streamers()
            .filter(|(_, recs)| !recs.is_empty())
            .map(|(username, recs)| StreamerOverview {
                username: username.clone(),
                movie_count: recs.len(),
                like_count: recs.iter().map(Recommendation::likes).sum(),
                recommendations: recs.iter().map(RecommendationOverview::from).collect(),
            })
            .collect())
    }

    pub async fn audit_log(&self) -> AppResult<Vec<AuditEntry>> {
        self.audit.list().await
    }
}

fn compute_stats(board: &RecommendationBoard) -> DashboardStats {
    let mut total_streamers = 0;
    let mut total_recommendations = 0;
    let mut users = HashSet::new();

    for (_, recs) in board.streamers() {
        total_streamers += 1;
        for rec in recs {
            total_recommendations += rec.likes();
            users.extend(rec.users.iter().map(|v| v.user_id.as_str()));
        }
    }

    DashboardStats {
        total_streamers,
        total_recommendations,
        total_users: users.len(),
    }
}

/// Accepts finite scores within [0, 10], fractions included
pub fn validate_score(score: f64) -> AppResult<()> {
    if !score.is_finite() || !(MIN_CUSTOM_SCORE..=MAX_CUSTOM_SCORE).contains(&score) {
        return Err(AppError::InvalidInput(format!(
            "Score must be a number between {} and {}",
            MIN_CUSTOM_SCORE, MAX_CUSTOM_SCORE
        )));
    }
    Ok(())
}

/// Reads a score from user input, accepting numbers and numeric strings
pub fn parse_score(value: &serde_json::Value) -> AppResult<f64> {
    let score = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::InvalidInput("Score must be numeric".to_string()))?;

    validate_score(score)?;
    Ok(score)
}

fn find_recommendation<'a>(
    board: &'a mut RecommendationBoard,
    streamer: &str,
    movie_id: u64,
) -> AppResult<&'a mut Recommendation> {
    board
        .find_mut(streamer, movie_id)
        .ok_or_else(|| not_found(streamer, movie_id))
}

fn not_found(streamer: &str, movie_id: u64) -> AppError {
    AppError::NotFound(format!(
        "No recommendation of movie {} for streamer {}",
        movie_id, streamer
    ))
}
