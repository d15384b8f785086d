use std::sync::Arc;

use reqwest::Url;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    config::Config,
    db::{load_optional_json, save_json, KeyValueStore, StorageKey},
    error::{AppError, AppResult},
    models::{is_supported_language, Identity, LoginRequest, PreferencesUpdate},
};

const AVATAR_SERVICE_URL: &str = "https://ui-avatars.com/api/";
const ID_SUFFIX_LEN: usize = 9;

/// Holds the single active identity of the board
///
/// Login is simulated: whoever calls `login` becomes the active identity,
/// replacing any previous one.
pub struct IdentityService {
    store: Arc<dyn KeyValueStore>,
    admin_users: Vec<String>,
    default_language: String,
    default_adult_filter: bool,
    write_lock: Mutex<()>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self {
            store,
            admin_users: config.admin_users.clone(),
            default_language: config.default_language.clone(),
            default_adult_filter: config.default_adult_filter,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<Identity> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(AppError::InvalidInput("Username cannot be empty".to_string()));
        }

        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(ID_SUFFIX_LEN)
            .collect();

        let identity = Identity {
            id: format!("{}_{}", request.platform, suffix),
            username: username.to_string(),
            display_name: username.to_string(),
            avatar: avatar_url(username, request.platform.avatar_color())?,
            platform: request.platform,
            is_streamer: request.is_streamer && request.platform.can_stream(),
            language: self.default_language.clone(),
            adult_filter: self.default_adult_filter,
        };

        let _guard = self.write_lock.lock().await;
        save_json(self.store.as_ref(), StorageKey::Identity, &identity).await?;

        tracing::info!(
            user_id = %identity.id,
            username = %identity.username,
            platform = %identity.platform,
            is_streamer = identity.is_streamer,
            "Identity logged in"
        );

        Ok(identity)
    }

    pub async fn logout(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store
            .delete(&StorageKey::Identity.to_string())
            .await?;
        tracing::info!("Identity logged out");
        Ok(())
    }

    pub async fn current(&self) -> AppResult<Option<Identity>> {
        load_optional_json(self.store.as_ref(), StorageKey::Identity).await
    }

    /// The active identity, or `Unauthenticated` when nobody is logged in
    pub async fn require_current(&self) -> AppResult<Identity> {
        self.current().await?.ok_or_else(|| {
            AppError::Unauthenticated("Log in to perform this action".to_string())
        })
    }

    /// The active identity if it may use admin operations
    pub async fn require_admin(&self) -> AppResult<Identity> {
        let identity = self.require_current().await?;
        if !self.is_admin(&identity) {
            tracing::debug!(username = %identity.username, "Admin action refused");
            return Err(AppError::Forbidden(
                "Administrator rights required".to_string(),
            ));
        }
        Ok(identity)
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admin_users.iter().any(|admin| *admin == identity.username)
    }

    pub fn is_streamer(&self, identity: &Identity) -> bool {
        identity.is_streamer
    }

    pub async fn update_preferences(&self, update: PreferencesUpdate) -> AppResult<Identity> {
        if let Some(language) = &update.language {
            if !is_supported_language(language) {
                return Err(AppError::InvalidInput(format!(
                    "Unsupported language: {}",
                    language
                )));
            }
        }

        let _guard = self.write_lock.lock().await;
        let mut identity = self.require_current().await?;

        if let Some(language) = update.language {
            identity.language = language;
        }
        if let Some(adult_filter) = update.adult_filter {
            identity.adult_filter = adult_filter;
        }

        save_json(self.store.as_ref(), StorageKey::Identity, &identity).await?;

        tracing::info!(
            user_id = %identity.id,
            language = %identity.language,
            adult_filter = identity.adult_filter,
            "Preferences updated"
        );

        Ok(identity)
    }
}

fn avatar_url(username: &str, background: &str) -> AppResult<String> {
    let url = Url::parse_with_params(
        AVATAR_SERVICE_URL,
        &[("name", username), ("background", background), ("color", "fff")],
    )
    .map_err(|e| AppError::Internal(format!("Invalid avatar URL: {}", e)))?;
    Ok(url.to_string())
}
