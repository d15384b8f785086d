use chrono::{DateTime, Utc};
use serde::{
    de::{MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::fmt;

use super::{Identity, MovieSummary};

/// One viewer's opinion of a recommended movie.
///
/// `liked` and `disliked` are never both true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: String,
    pub username: String,
    pub avatar: String,
    pub liked: bool,
    pub disliked: bool,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    fn like(voter: &Identity) -> Self {
        Self::cast(voter, true)
    }

    fn dislike(voter: &Identity) -> Self {
        Self::cast(voter, false)
    }

    fn cast(voter: &Identity, liked: bool) -> Self {
        Self {
            user_id: voter.id.clone(),
            username: voter.username.clone(),
            avatar: voter.avatar.clone(),
            liked,
            disliked: !liked,
            timestamp: Utc::now(),
        }
    }

    pub fn state(&self) -> VoteState {
        if self.liked {
            VoteState::Liked
        } else {
            VoteState::Disliked
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    Liked,
    Disliked,
}

/// A movie recommended to one streamer, with every vote cast on it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub movie_id: u64,
    pub movie_data: MovieSummary,
    pub users: Vec<Vote>,
    pub added_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_score: Option<f64>,
}

impl Recommendation {
    pub fn likes(&self) -> usize {
        self.users.iter().filter(|v| v.liked).count()
    }

    pub fn dislikes(&self) -> usize {
        self.users.iter().filter(|v| v.disliked).count()
    }

    /// Likes minus dislikes
    pub fn score(&self) -> i64 {
        self.likes() as i64 - self.dislikes() as i64
    }

    /// Rating shown next to the movie: the admin override, else the catalog average
    pub fn rating(&self) -> f64 {
        self.custom_score.unwrap_or(self.movie_data.vote_average)
    }

    pub fn vote_of(&self, user_id: &str) -> Option<&Vote> {
        self.users.iter().find(|v| v.user_id == user_id)
    }

    fn vote_of_mut(&mut self, user_id: &str) -> Option<&mut Vote> {
        self.users.iter_mut().find(|v| v.user_id == user_id)
    }

    /// Usernames of everyone who liked the movie, in voting order
    pub fn recommenders(&self) -> Vec<String> {
        self.users
            .iter()
            .filter(|v| v.liked)
            .map(|v| v.username.clone())
            .collect()
    }
}

/// Result of an upvote
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UpvoteOutcome {
    /// First vote on this movie for this streamer
    Created,
    /// New voter on an existing recommendation
    Added,
    /// The voter's dislike became a like
    Changed,
    /// The voter already liked this movie; nothing changed
    AlreadyRecommended,
}

/// Result of a downvote
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownvoteOutcome {
    Added,
    Changed,
    /// The movie was never recommended to this streamer; nothing changed
    NotRecommended,
}

/// Every streamer's recommendations, keyed by streamer username.
///
/// Streamers keep the order in which they first received a recommendation, and
/// persist as a JSON object in that order. Names are trimmed on every lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecommendationBoard(Vec<(String, Vec<Recommendation>)>);

/// Canonical form of a streamer name as used for board keys
pub fn normalize_streamer(streamer: &str) -> &str {
    streamer.trim()
}

impl RecommendationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, streamer: &str) -> Option<usize> {
        let streamer = normalize_streamer(streamer);
        self.0.iter().position(|(name, _)| name == streamer)
    }

    fn bucket_mut(&mut self, streamer: &str) -> Option<&mut Vec<Recommendation>> {
        let index = self.position(streamer)?;
        Some(&mut self.0[index].1)
    }

    /// Recommendations for a streamer; unknown streamers have none
    pub fn bucket(&self, streamer: &str) -> &[Recommendation] {
        self.position(streamer)
            .map(|index| self.0[index].1.as_slice())
            .unwrap_or(&[])
    }

    /// Streamers in the order they were first recommended to
    pub fn streamers(&self) -> impl Iterator<Item = (&String, &Vec<Recommendation>)> {
        self.0.iter().map(|(name, recs)| (name, recs))
    }

    pub fn contains_streamer(&self, streamer: &str) -> bool {
        self.position(streamer).is_some()
    }

    pub fn find(&self, streamer: &str, movie_id: u64) -> Option<&Recommendation> {
        self.bucket(streamer).iter().find(|r| r.movie_id == movie_id)
    }

    pub fn find_mut(&mut self, streamer: &str, movie_id: u64) -> Option<&mut Recommendation> {
        self.bucket_mut(streamer)
            .and_then(|recs| recs.iter_mut().find(|r| r.movie_id == movie_id))
    }

    pub fn upvote(
        &mut self,
        streamer: &str,
        movie: MovieSummary,
        voter: &Identity,
    ) -> UpvoteOutcome {
        if let Some(rec) = self.find_mut(streamer, movie.id) {
            return match rec.vote_of_mut(&voter.id) {
                Some(vote) if vote.liked => UpvoteOutcome::AlreadyRecommended,
                Some(vote) => {
                    vote.liked = true;
                    vote.disliked = false;
                    UpvoteOutcome::Changed
                }
                None => {
                    rec.users.push(Vote::like(voter));
                    UpvoteOutcome::Added
                }
            };
        }

        let rec = Recommendation {
            movie_id: movie.id,
            movie_data: movie,
            users: vec![Vote::like(voter)],
            added_at: Utc::now(),
            custom_score: None,
        };
        match self.bucket_mut(streamer) {
            Some(recs) => recs.push(rec),
            None => self
                .0
                .push((normalize_streamer(streamer).to_string(), vec![rec])),
        }
        UpvoteOutcome::Created
    }

    pub fn downvote(&mut self, streamer: &str, movie_id: u64, voter: &Identity) -> DownvoteOutcome {
        let Some(rec) = self.find_mut(streamer, movie_id) else {
            return DownvoteOutcome::NotRecommended;
        };

        match rec.vote_of_mut(&voter.id) {
            Some(vote) => {
                vote.liked = false;
                vote.disliked = true;
                DownvoteOutcome::Changed
            }
            None => {
                rec.users.push(Vote::dislike(voter));
                DownvoteOutcome::Added
            }
        }
    }

    /// Removes a recommendation, dropping the streamer entirely once their list is empty
    pub fn remove(&mut self, streamer: &str, movie_id: u64) -> Option<Recommendation> {
        let bucket_index = self.position(streamer)?;
        let recs = &mut self.0[bucket_index].1;
        let index = recs.iter().position(|r| r.movie_id == movie_id)?;
        let removed = recs.remove(index);

        if recs.is_empty() {
            self.0.remove(bucket_index);
        }

        Some(removed)
    }
}

impl Serialize for RecommendationBoard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.streamers())
    }
}

impl<'de> Deserialize<'de> for RecommendationBoard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BoardVisitor;

        impl<'de> Visitor<'de> for BoardVisitor {
            type Value = RecommendationBoard;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of streamer names to recommendations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut board = RecommendationBoard::new();
                while let Some((name, recs)) = map.next_entry::<String, Vec<Recommendation>>()? {
                    // A repeated key replaces the earlier bucket in place
                    match board.position(&name) {
                        Some(index) => board.0[index].1 = recs,
                        None => board.0.push((normalize_streamer(&name).to_string(), recs)),
                    }
                }
                Ok(board)
            }
        }

        deserializer.deserialize_map(BoardVisitor)
    }
}

/// A recommendation that made it through filtering, with its net score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecommendation<'a> {
    pub recommendation: &'a Recommendation,
    pub score: i64,
}

/// Filters and orders a streamer's recommendations for display.
///
/// Drops adult movies when `adult_filter` is on and anything whose score is not
/// positive, then orders by score, highest first. Ties keep their stored order.
pub fn rank_recommendations(
    bucket: &[Recommendation],
    adult_filter: bool,
) -> Vec<RankedRecommendation<'_>> {
    let mut ranked: Vec<RankedRecommendation<'_>> = bucket
        .iter()
        .filter(|rec| !(adult_filter && rec.movie_data.adult))
        .map(|rec| RankedRecommendation {
            recommendation: rec,
            score: rec.score(),
        })
        .filter(|ranked| ranked.score > 0)
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}
