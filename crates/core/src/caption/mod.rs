//! This module is responsible for caption selection and fusion.
//! It picks the caption under a timestamp and decides whether its neighbours
//! should be rendered along with it.

use crate::error::{ResolveError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub mod similarity;

/// Neighbours scoring above this against the search term are merged.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.2;

/// Best-ranked search result: an episode and a timestamp inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchHit {
    #[serde(default)]
    pub id: Option<u64>,
    pub episode: String,
    pub timestamp: i64,
}

/// A single timed line of dialogue as returned by the caption endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Caption {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub representative_timestamp: Option<i64>,
    pub episode: String,
    #[serde(rename = "StartTimestamp")]
    pub start: i64,
    #[serde(rename = "EndTimestamp")]
    pub end: i64,
    pub content: String,
    #[serde(default)]
    pub language: String,
}

/// Time range and text handed to the render step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSpan {
    pub start: i64,
    pub end: i64,
    pub content: String,
}

impl From<&Caption> for ResolvedSpan {
    fn from(caption: &Caption) -> Self {
        Self {
            start: caption.start,
            end: caption.end,
            content: caption.content.clone(),
        }
    }
}

/// Return the index of the first caption whose open interval contains
/// `timestamp`. Touching a boundary exactly does not count.
pub fn position(captions: &[Caption], timestamp: i64) -> Result<usize> {
    trace!("position captions={} timestamp={}", captions.len(), timestamp);
    captions
        .iter()
        .position(|c| c.start < timestamp && c.end > timestamp)
        .ok_or(ResolveError::NotFound { timestamp })
}

/// Return the caption under `timestamp`.
/// This function should fail with `NotFound` when no interval contains it.
pub fn select(captions: &[Caption], timestamp: i64) -> Result<&Caption> {
    position(captions, timestamp).map(|i| &captions[i])
}

/// Fuse captions into a single span regardless of input order.
/// The way this works is by sorting on start time, taking the outer bounds
/// and joining the text with spaces.
pub fn combine(captions: &[Caption]) -> Result<ResolvedSpan> {
    trace!("combine captions={}", captions.len());
    let mut sorted: Vec<&Caption> = captions.iter().collect();
    sorted.sort_by_key(|c| c.start);
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ResolveError::EmptyInput),
    };
    let content = sorted
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Ok(ResolvedSpan {
        start: first.start,
        end: last.end,
        content: content.trim().to_string(),
    })
}

/// Decide whether the captions around `index` should join the selected one.
/// A neighbour is included when its similarity to `term` exceeds
/// `threshold`. Neighbours missing at the edge of the window never match.
pub fn merge(
    term: &str,
    captions: &[Caption],
    index: usize,
    threshold: f64,
) -> Result<ResolvedSpan> {
    trace!(
        "merge term={:?} index={} window={} threshold={}",
        term,
        index,
        captions.len(),
        threshold
    );
    let selected = captions.get(index).ok_or(ResolveError::InvalidIndex {
        index,
        len: captions.len(),
    })?;
    let before = index.checked_sub(1).and_then(|i| captions.get(i));
    let after = captions.get(index + 1);

    let mut fused = vec![selected.clone()];
    for neighbour in [before, after].into_iter().flatten() {
        let score = similarity::compare(term, &neighbour.content);
        debug!(
            "neighbour {}-{} scored {:.3} against {:?}",
            neighbour.start, neighbour.end, score, term
        );
        if score > threshold {
            fused.push(neighbour.clone());
        }
    }

    if fused.len() > 1 {
        combine(&fused)
    } else {
        Ok(ResolvedSpan::from(selected))
    }
}
