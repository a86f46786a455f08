//! Resolver configuration shared by the pipeline and the HTTP client.

use crate::caption::DEFAULT_MERGE_THRESHOLD;
use std::time::Duration;

/// Default base for the JSON endpoints.
pub const DEFAULT_API_URL: &str = "https://frinkiac.com/api";
/// Default base for rendered media.
pub const DEFAULT_MEDIA_URL: &str = "https://frinkiac.com";
/// Milliseconds fetched on each side of a hit's timestamp.
pub const DEFAULT_WINDOW_MARGIN_MS: i64 = 10_000;

/// How the captions around a search hit are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowStrategy {
    /// `/episode/<ep>/<start>/<end>`, guarantees neighbours on both sides.
    #[default]
    Range,
    /// Legacy `/caption?e=<ep>&t=<t>` lookup.
    Caption,
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub api_url: String,
    pub media_url: String,
    pub window_strategy: WindowStrategy,
    pub window_margin_ms: i64,
    pub merge_threshold: f64,
    /// Upper bound for each network step. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            window_strategy: WindowStrategy::default(),
            window_margin_ms: DEFAULT_WINDOW_MARGIN_MS,
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            timeout: None,
        }
    }
}
