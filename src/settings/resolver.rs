use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::document::{RawConfigDocument, RawPageSize};
use crate::settings::flags::FeatureFlagIndex;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5100/api";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_THEME: &str = "blue";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 200;

/// Environment variable that supplies [`ResolveEnv::api_base_url`].
pub const API_BASE_URL_ENV: &str = "FOLIO_API_BASE_URL";

const RATINGS_FLAG: &str = "Ratings";
const DARK_MODE_FLAG: &str = "DarkMode";

/// Inputs to resolution that come from the process rather than the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveEnv {
    pub api_base_url: Option<String>,
}

impl ResolveEnv {
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var(API_BASE_URL_ENV)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

/// Fully defaulted configuration handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfiguration {
    pub api: ApiConfig,
    pub ui: UiConfig,
    pub features: Features,
    /// The raw `Settings` object, kept for diagnostics.
    pub settings: Map<String, Value>,
    pub feature_flags: FeatureFlagIndex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub theme: String,
    pub page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub enable_ratings: bool,
    pub enable_dark_mode: bool,
    pub enable_advanced_search: bool,
    /// Every other flag from the document, keyed by its id.
    #[serde(flatten)]
    pub other: BTreeMap<String, bool>,
}

impl Features {
    fn from_flags(flags: &FeatureFlagIndex) -> Self {
        let other = flags
            .iter()
            .filter(|(id, _)| !Self::is_reserved(id))
            .map(|(id, enabled)| (id.to_string(), enabled))
            .collect();

        Self {
            enable_ratings: flags.is_enabled(RATINGS_FLAG),
            enable_dark_mode: flags.is_enabled(DARK_MODE_FLAG),
            enable_advanced_search: true,
            other,
        }
    }

    /// Ids already represented by a named field, or colliding with one.
    fn is_reserved(id: &str) -> bool {
        matches!(
            id,
            RATINGS_FLAG
                | DARK_MODE_FLAG
                | "enableRatings"
                | "enableDarkMode"
                | "enableAdvancedSearch"
        )
    }
}

/// Resolve a raw document into an [`AppConfiguration`].
///
/// Total over its input: every missing or malformed path degrades to its
/// default, so an empty document yields the defaults.
pub fn resolve(raw: &RawConfigDocument, env: &ResolveEnv) -> AppConfiguration {
    let (page_size, max_page_size) = match raw.page_size() {
        Some(RawPageSize::Bounds { default, max }) => (
            default.unwrap_or(DEFAULT_PAGE_SIZE),
            max.unwrap_or(DEFAULT_MAX_PAGE_SIZE),
        ),
        Some(RawPageSize::Number(n)) => (n, DEFAULT_MAX_PAGE_SIZE),
        None => (DEFAULT_PAGE_SIZE, DEFAULT_MAX_PAGE_SIZE),
    };

    let theme = raw
        .color_scheme()
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_THEME.to_string());

    let feature_flags = FeatureFlagIndex::build(&raw.feature_flags());

    AppConfiguration {
        api: ApiConfig {
            base_url: env
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            timeout: DEFAULT_API_TIMEOUT_MS,
        },
        ui: UiConfig {
            theme,
            page_size,
            max_page_size,
        },
        features: Features::from_flags(&feature_flags),
        settings: raw.settings().cloned().unwrap_or_default(),
        feature_flags,
    }
}

impl Default for AppConfiguration {
    fn default() -> Self {
        resolve(&RawConfigDocument::fallback(), &ResolveEnv::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_is_fully_defaulted() {
        let config = resolve(&RawConfigDocument::empty(), &ResolveEnv::default());
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.timeout, 10_000);
        assert_eq!(config.ui.theme, "blue");
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.ui.max_page_size, 200);
        assert!(!config.features.enable_ratings);
        assert!(!config.features.enable_dark_mode);
        assert!(config.features.enable_advanced_search);
        assert!(config.settings.is_empty());
        assert!(config.feature_flags.is_empty());
    }

    #[test]
    fn test_non_object_documents_do_not_panic() {
        for value in [json!(null), json!(3), json!("text"), json!([{}])] {
            let config = resolve(&RawConfigDocument::new(value), &ResolveEnv::default());
            assert_eq!(config.ui.page_size, DEFAULT_PAGE_SIZE);
        }
    }

    #[test]
    fn test_fallback_document_round_trip() {
        let config = resolve(&RawConfigDocument::fallback(), &ResolveEnv::default());
        let body = serde_json::to_value(&config).unwrap();

        assert_eq!(body["ui"]["theme"], "blue");
        assert_eq!(body["ui"]["pageSize"], 10);
        assert_eq!(body["ui"]["maxPageSize"], 200);
        assert_eq!(body["features"]["enableDarkMode"], false);
        assert_eq!(body["features"]["enableRatings"], true);
        assert_eq!(body["features"]["enableAdvancedSearch"], true);
        assert_eq!(body["api"]["baseUrl"], DEFAULT_API_BASE_URL);
        assert_eq!(body["featureFlags"]["Ratings"], true);
        assert_eq!(body["settings"]["ColorScheme"], "Blue");

        let parsed: AppConfiguration = serde_json::from_value(body).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_page_size_without_default_field() {
        let raw = RawConfigDocument::new(json!({
            "Settings": { "PageSize": { "Max": 50 } }
        }));
        let config = resolve(&raw, &ResolveEnv::default());
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.ui.max_page_size, 50);
    }

    #[test]
    fn test_zero_page_size_uses_default() {
        let raw = RawConfigDocument::new(json!({
            "Settings": { "PageSize": { "Default": 0, "Max": 0 } }
        }));
        let config = resolve(&raw, &ResolveEnv::default());
        assert_eq!(config.ui.page_size, 10);
        assert_eq!(config.ui.max_page_size, 200);
    }

    #[test]
    fn test_theme_is_lowercased() {
        let raw = RawConfigDocument::new(json!({ "Settings": { "ColorScheme": "DarkGreen" } }));
        let config = resolve(&raw, &ResolveEnv::default());
        assert_eq!(config.ui.theme, "darkgreen");
    }

    #[test]
    fn test_env_api_base_url() {
        let env = ResolveEnv {
            api_base_url: Some("https://catalog.example.com/api".into()),
        };
        let config = resolve(&RawConfigDocument::empty(), &env);
        assert_eq!(config.api.base_url, "https://catalog.example.com/api");
    }

    #[test]
    fn test_string_encoded_flags_and_extra_ids() {
        let raw = RawConfigDocument::new(json!({
            "feature_management": {
                "feature_flags": [
                    { "id": "Ratings", "enabled": "true" },
                    { "id": "DarkMode", "enabled": "false" },
                    { "id": "Beta", "enabled": true },
                    { "id": "enableAdvancedSearch", "enabled": false }
                ]
            }
        }));
        let config = resolve(&raw, &ResolveEnv::default());
        assert!(config.features.enable_ratings);
        assert!(!config.features.enable_dark_mode);
        assert!(config.features.enable_advanced_search);
        assert_eq!(config.features.other.get("Beta"), Some(&true));
        assert!(!config.features.other.contains_key("enableAdvancedSearch"));
        assert_eq!(config.feature_flags.get("enableAdvancedSearch"), Some(false));

        let body = serde_json::to_value(&config).unwrap();
        assert_eq!(body["features"]["Beta"], true);
        assert_eq!(body["features"]["enableAdvancedSearch"], true);
    }
}
