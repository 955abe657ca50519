//! Settings resolution.
//!
//! ```text
//! ConfigSource → RawConfigDocument → resolve() → AppConfiguration → ConfigHandle
//! ```
//!
//! The raw document is read from a mounted `settings.json` (or a remote
//! endpoint), never trusted, and resolved into a fully defaulted
//! [`AppConfiguration`]. A missing or broken document is not an error: the
//! source logs a diagnostic and the built-in document is used instead.

pub mod document;
pub mod flags;
pub mod handle;
pub mod resolver;
pub mod source;

pub use document::{RawConfigDocument, RawPageSize};
pub use flags::{parse_enabled, FeatureFlagDescriptor, FeatureFlagIndex, TruthyEncoding};
pub use handle::{ConfigClient, ConfigHandle, CONFIG_ENDPOINT};
pub use resolver::{resolve, ApiConfig, AppConfiguration, Features, ResolveEnv, UiConfig};
pub use source::{ConfigLoadDiagnostic, ConfigSource, FileConfigSource, HttpConfigSource};
