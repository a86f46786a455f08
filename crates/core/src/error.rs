//! Error taxonomy for the resolution pipeline.
//! Every step fails fast with one of these and nothing is recovered locally.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while turning a search term into a rendered clip.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The search endpoint returned an empty or non-list result.
    #[error("No results found for \"{term}\"")]
    NoResults { term: String },

    /// The HTTP request itself failed or returned a non-success status.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote answered but the body did not have the expected shape.
    #[error("unexpected response from {url}: {source}")]
    InvalidResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// No caption interval strictly contains the timestamp.
    #[error("Subtitle with timestamp \"{timestamp}\" not found")]
    NotFound { timestamp: i64 },

    /// `combine` was handed nothing to combine.
    #[error("cannot combine an empty set of captions")]
    EmptyInput,

    /// `merge` was pointed at an index outside the caption window.
    #[error("caption index {index} is outside a window of {len} captions")]
    InvalidIndex { index: usize, len: usize },

    /// A network step did not complete within the configured limit.
    #[error("{step} timed out after {after:?}")]
    Timeout { step: &'static str, after: Duration },
}

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
