//! Feature flag parsing.
//!
//! Flags arrive with heterogeneous encodings of "enabled". Only the encodings
//! listed in [`TruthyEncoding`] turn a flag on; everything else, including
//! `"false"`, `null`, a missing field and strings such as `"yes"`, turns it off.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The accepted encodings of an enabled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruthyEncoding {
    /// JSON `true`.
    Bool,
    /// The exact string `"true"`.
    TrueString,
}

impl TruthyEncoding {
    pub const ALL: [TruthyEncoding; 2] = [TruthyEncoding::Bool, TruthyEncoding::TrueString];

    fn matches(self, value: &Value) -> bool {
        match self {
            TruthyEncoding::Bool => value == &Value::Bool(true),
            TruthyEncoding::TrueString => value.as_str() == Some("true"),
        }
    }
}

/// Parse the raw `enabled` field of a flag descriptor.
pub fn parse_enabled(value: Option<&Value>) -> bool {
    value.is_some_and(|v| TruthyEncoding::ALL.iter().any(|enc| enc.matches(v)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlagDescriptor {
    pub id: String,
    pub enabled: bool,
}

impl FeatureFlagDescriptor {
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
        }
    }

    /// Build a descriptor from an untyped entry; `None` when there is no string `id`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let id = entry.get("id")?.as_str()?;
        Some(Self::new(id, parse_enabled(entry.get("enabled"))))
    }
}

/// Mapping from flag id to enabled state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlagIndex(BTreeMap<String, bool>);

impl FeatureFlagIndex {
    /// Fold descriptors left to right; a later descriptor overwrites an
    /// earlier one with the same id.
    pub fn build(descriptors: &[FeatureFlagDescriptor]) -> Self {
        let mut flags = BTreeMap::new();
        for descriptor in descriptors {
            flags.insert(descriptor.id.clone(), descriptor.enabled);
        }
        Self(flags)
    }

    /// Unknown flags are disabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.0.get(id).copied().unwrap_or(false)
    }

    pub fn get(&self, id: &str) -> Option<bool> {
        self.0.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(id, enabled)| (id.as_str(), *enabled))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
