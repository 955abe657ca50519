use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::settings::flags::FeatureFlagDescriptor;

/// Untyped settings tree as read from the backing store.
///
/// Nothing in here is trusted: every accessor tolerates missing keys and
/// values of the wrong type, returning `None` instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawConfigDocument(Value);

/// The `Settings.PageSize` entry, before defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPageSize {
    /// `{ "Default": .., "Max": .. }`; either field may be unusable.
    Bounds {
        default: Option<u32>,
        max: Option<u32>,
    },
    /// A bare number, taken as the default page size.
    Number(u32),
}

impl RawConfigDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// An empty document (`{}`).
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Parse a JSON document. Any syntactically valid JSON is accepted.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content).map(Self)
    }

    /// Built-in document used whenever the backing store cannot be read.
    pub fn fallback() -> Self {
        Self(json!({
            "Settings": {
                "ColorScheme": "Blue",
                "PageSize": {
                    "Default": 10,
                    "Max": 200
                }
            },
            "feature_management": {
                "feature_flags": [
                    { "id": "DarkMode", "enabled": false },
                    { "id": "Ratings", "enabled": true }
                ]
            }
        }))
    }

    /// The `Settings` object, if present and an object.
    pub fn settings(&self) -> Option<&Map<String, Value>> {
        self.0.get("Settings").and_then(Value::as_object)
    }

    /// `Settings.ColorScheme` when it is a non-empty string.
    pub fn color_scheme(&self) -> Option<&str> {
        self.settings()?
            .get("ColorScheme")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn page_size(&self) -> Option<RawPageSize> {
        match self.settings()?.get("PageSize")? {
            Value::Object(bounds) => Some(RawPageSize::Bounds {
                default: bounds.get("Default").and_then(positive_u32),
                max: bounds.get("Max").and_then(positive_u32),
            }),
            other => positive_u32(other).map(RawPageSize::Number),
        }
    }

    /// Flag descriptors under `feature_management.feature_flags`, in document order.
    ///
    /// Entries that are not objects or have no string `id` are skipped.
    pub fn feature_flags(&self) -> Vec<FeatureFlagDescriptor> {
        let Some(entries) = self
            .0
            .get("feature_management")
            .and_then(|fm| fm.get("feature_flags"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                let descriptor = FeatureFlagDescriptor::from_value(entry);
                if descriptor.is_none() {
                    tracing::debug!("Skipping malformed feature flag entry: {}", entry);
                }
                descriptor
            })
            .collect()
    }
}

impl Default for RawConfigDocument {
    fn default() -> Self {
        Self::empty()
    }
}

fn positive_u32(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
}
