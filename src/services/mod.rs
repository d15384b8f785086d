pub mod admin;
pub mod audit;
pub mod catalog;
pub mod identity;
pub mod providers;
pub mod recommendations;

pub use admin::{AdminService, DashboardStats, StreamerOverview};
pub use audit::AuditService;
pub use catalog::CatalogService;
pub use identity::IdentityService;
pub use recommendations::{FeedOptions, FeedSource, RecommendationService, StreamerFeed};
