//! Frinkiac-style caption service over HTTP.
//! Search and caption lookups are JSON endpoints; rendering is a plain GET
//! whose final location after redirects is the media URL.

use super::{CaptionService, ResolvedClip};
use crate::caption::{Caption, SearchHit};
use crate::config::{ResolverConfig, WindowStrategy};
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

/// Body of both caption window endpoints.
#[derive(Debug, Deserialize)]
struct WindowResponse {
    #[serde(rename = "Subtitles")]
    subtitles: Vec<Caption>,
}

/// `CaptionService` backed by the remote JSON API.
pub struct FrinkiacClient {
    client: Client,
    config: ResolverConfig,
}

impl FrinkiacClient {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Build the render URL for `clip` without requesting it.
    pub fn render_url(&self, clip: &ResolvedClip) -> String {
        format!(
            "{}/gif/{}/{}/{}.gif?b64lines={}",
            self.config.media_url.trim_end_matches('/'),
            clip.episode,
            clip.span.start,
            clip.span.end,
            clip.payload
        )
    }

    /// Issue a GET and return the raw body.
    /// Transport failures and non-success statuses map to `Transport`.
    async fn get_body(&self, url: &str, query: &[(&str, String)]) -> Result<Bytes> {
        trace!("get_body url={} query={:?}", url, query);
        let transport = |source| ResolveError::Transport {
            url: url.to_string(),
            source,
        };
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        resp.bytes().await.map_err(transport)
    }

    /// Issue a GET and parse the body as JSON into `T`.
    /// Bodies of the wrong shape map to `InvalidResponse`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get_body(&url, query).await?;
        serde_json::from_slice(&body)
            .map_err(|source| ResolveError::InvalidResponse { url, source })
    }
}

#[async_trait]
impl CaptionService for FrinkiacClient {
    /// Search for `term` and keep only the first ranked hit.
    async fn search(&self, term: &str) -> Result<Option<SearchHit>> {
        let url = self.api_url("/search");
        let body = self.get_body(&url, &[("q", term.to_string())]).await?;
        // Anything that is not a JSON list, including a non-JSON body, has no hits.
        let value: Option<Value> = serde_json::from_slice(&body).ok();
        let first = match value.as_ref().and_then(Value::as_array).and_then(|h| h.first()) {
            Some(first) => first.clone(),
            None => {
                debug!("search for {:?} returned no hits", term);
                return Ok(None);
            }
        };
        serde_json::from_value(first)
            .map(Some)
            .map_err(|source| ResolveError::InvalidResponse { url, source })
    }

    /// Fetch captions around the hit using the configured strategy.
    async fn fetch_window(&self, hit: &SearchHit) -> Result<Vec<Caption>> {
        let response: WindowResponse = match self.config.window_strategy {
            WindowStrategy::Range => {
                let margin = self.config.window_margin_ms.max(0);
                let url = self.api_url(&format!(
                    "/episode/{}/{}/{}",
                    hit.episode,
                    hit.timestamp.saturating_sub(margin).max(0),
                    hit.timestamp.saturating_add(margin)
                ));
                self.get_json(url, &[]).await?
            }
            WindowStrategy::Caption => {
                let query = [("e", hit.episode.clone()), ("t", hit.timestamp.to_string())];
                self.get_json(self.api_url("/caption"), &query).await?
            }
        };
        Ok(response.subtitles)
    }

    /// Request the clip and report where the redirects ended up.
    async fn render(&self, clip: &ResolvedClip) -> Result<String> {
        let url = self.render_url(clip);
        debug!("requesting render {}", url);
        let transport = |source| ResolveError::Transport {
            url: url.clone(),
            source,
        };
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        Ok(resp.url().to_string())
    }
}
