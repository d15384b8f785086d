use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Platform a simulated login came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    Kick,
    Discord,
}

impl Platform {
    /// Avatar background colour used for this platform
    pub fn avatar_color(&self) -> &'static str {
        match self {
            Platform::Twitch => "8B5CF6",
            Platform::Kick => "EC4899",
            Platform::Discord => "5865F2",
        }
    }

    /// Discord accounts are viewers only
    pub fn can_stream(&self) -> bool {
        !matches!(self, Platform::Discord)
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Twitch => write!(f, "twitch"),
            Platform::Kick => write!(f, "kick"),
            Platform::Discord => write!(f, "discord"),
        }
    }
}

/// The active viewer (or streamer) of the board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
    pub platform: Platform,
    pub is_streamer: bool,
    pub language: String,
    pub adult_filter: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "es", name: "Español" },
    Language { code: "en", name: "English" },
    Language { code: "fr", name: "Français" },
    Language { code: "de", name: "Deutsch" },
    Language { code: "pt", name: "Português" },
    Language { code: "it", name: "Italiano" },
    Language { code: "ja", name: "日本語" },
];

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|lang| lang.code == code)
}

/// Simulated login: the platform account is taken at its word
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub platform: Platform,
    #[serde(default)]
    pub is_streamer: bool,
}

/// Viewer preference update; absent fields are left untouched
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub adult_filter: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_serializes_camel_case() {
        let identity = Identity {
            id: "twitch_abc123xyz".to_string(),
            username: "viewer".to_string(),
            display_name: "viewer".to_string(),
            avatar: "https://example.test/a.png".to_string(),
            platform: Platform::Twitch,
            is_streamer: false,
            language: "es".to_string(),
            adult_filter: true,
        };

        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["displayName"], "viewer");
        assert_eq!(json["isStreamer"], false);
        assert_eq!(json["adultFilter"], true);
        assert_eq!(json["platform"], "twitch");
    }

    #[test]
    fn test_platform_rules() {
        assert!(Platform::Twitch.can_stream());
        assert!(Platform::Kick.can_stream());
        assert!(!Platform::Discord.can_stream());
        assert_eq!(Platform::Kick.to_string(), "kick");
    }

    #[test]
    fn test_supported_languages() {
        assert!(is_supported_language("ja"));
        assert!(!is_supported_language("xx"));
        assert_eq!(SUPPORTED_LANGUAGES.len(), 7);
    }
}
