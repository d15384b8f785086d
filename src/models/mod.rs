pub mod audit;
pub mod identity;
pub mod movie;
pub mod recommendation;

pub use audit::{AuditEntry, AuditLog, AUDIT_LOG_CAPACITY};
pub use identity::{
    is_supported_language, Identity, Language, LoginRequest, Platform, PreferencesUpdate,
    SUPPORTED_LANGUAGES,
};
pub use movie::{
    youtube_embed_url, CastMember, Credits, Genre, MovieDetails, MoviePage, MovieSummary, Trailer,
    Video, VideoList,
};
pub use recommendation::{
    normalize_streamer, rank_recommendations, DownvoteOutcome, RankedRecommendation,
    Recommendation, RecommendationBoard, UpvoteOutcome, Vote, VoteState,
};
