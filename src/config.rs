use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDb API key
    pub tmdb_api_key: String,

    /// TMDb API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDb image CDN base URL
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Redis connection URL. When unset, state is kept in process memory.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Usernames allowed to use the admin endpoints (comma-separated)
    #[serde(default = "default_admin_users")]
    pub admin_users: Vec<String>,

    /// Language assigned to new identities
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Adult filter assigned to new identities
    #[serde(default = "default_adult_filter")]
    pub default_adult_filter: bool,

    /// TTL in seconds for cached metadata responses
    #[serde(default = "default_metadata_cache_ttl")]
    pub metadata_cache_ttl: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_admin_users() -> Vec<String> {
    vec!["lemany01".to_string()]
}

fn default_language() -> String {
    "es".to_string()
}

fn default_adult_filter() -> bool {
    true
}

fn default_metadata_cache_ttl() -> u64 {
    3600 // 1 hour
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Configuration for tests and local tooling; no Redis, placeholder API key.
    pub fn for_tests() -> Self {
        Self {
            tmdb_api_key: "test_key".to_string(),
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_url: default_tmdb_image_url(),
            redis_url: None,
            host: default_host(),
            port: default_port(),
            admin_users: default_admin_users(),
            default_language: default_language(),
            default_adult_filter: default_adult_filter(),
            metadata_cache_ttl: default_metadata_cache_ttl(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
