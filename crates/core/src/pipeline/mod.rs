//! Resolution pipeline orchestration.
//! This module wires search, caption lookup, merging, encoding and the
//! render request into one sequential chain.

use crate::caption::{self, Caption, ResolvedSpan, SearchHit};
use crate::config::ResolverConfig;
use crate::encode;
use crate::error::{ResolveError, Result};
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, info, trace};

pub mod frinkiac;

/// Everything needed to issue a render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClip {
    pub episode: String,
    pub span: ResolvedSpan,
    /// Encoded caption text for the `b64lines` parameter.
    pub payload: String,
}

/// Remote caption service the pipeline talks to.
/// Implementations own their transport; the pipeline only sequences calls.
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Return the best-ranked hit for `term`, or `None` when nothing matched.
    async fn search(&self, term: &str) -> Result<Option<SearchHit>>;

    /// Fetch the time-ordered captions around `hit`.
    async fn fetch_window(&self, hit: &SearchHit) -> Result<Vec<Caption>>;

    /// Request the rendered clip and return its final media URL.
    async fn render(&self, clip: &ResolvedClip) -> Result<String>;
}

/// Turns search terms into media URLs using an injected `CaptionService`.
pub struct Pipeline<S> {
    service: S,
    config: ResolverConfig,
}

impl<S: CaptionService> Pipeline<S> {
    pub fn new(service: S, config: ResolverConfig) -> Self {
        Self { service, config }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Resolve `term` into a render request without issuing it.
    /// This function should fail fast on the first step that errors.
    pub async fn resolve(&self, term: &str) -> Result<ResolvedClip> {
        trace!("resolve term={:?}", term);
        let hit = self
            .step("search", self.service.search(term))
            .await?
            .ok_or_else(|| ResolveError::NoResults {
                term: term.to_string(),
            })?;
        debug!("best hit {} at {}ms", hit.episode, hit.timestamp);

        let window = self
            .step("caption window", self.service.fetch_window(&hit))
            .await?;
        debug!("fetched {} captions around {}ms", window.len(), hit.timestamp);

        let index = caption::position(&window, hit.timestamp)?;
        let span = caption::merge(term, &window, index, self.config.merge_threshold)?;
        debug!(
            "resolved span {}-{}ms: {:?}",
            span.start, span.end, span.content
        );

        let payload = encode::encode(&span.content);
        Ok(ResolvedClip {
            episode: hit.episode,
            span,
            payload,
        })
    }

    /// Resolve `term` and render it, returning the playable media URL.
    pub async fn generate(&self, term: &str) -> Result<String> {
        let clip = self.resolve(term).await?;
        let url = self.step("render", self.service.render(&clip)).await?;
        info!("rendered {:?} as {}", term, url);
        Ok(url)
    }

    /// Await a network step, bounded by the configured timeout if any.
    async fn step<T, F>(&self, step: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.timeout {
            Some(after) => tokio::time::timeout(after, fut)
                .await
                .map_err(|_| ResolveError::Timeout { step, after })?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn caption(start: i64, end: i64, content: &str) -> Caption {
        Caption {
            id: None,
            representative_timestamp: None,
            episode: "S07E21".into(),
            start,
            end,
            content: content.into(),
            language: "en".into(),
        }
    }

    /// In-memory service returning canned hits and captions.
    struct MockService {
        hit: Option<SearchHit>,
        window: Vec<Caption>,
        search_delay: Option<Duration>,
        fail_window: bool,
        renders: AtomicUsize,
    }

    impl MockService {
        fn new(hit: Option<SearchHit>, window: Vec<Caption>) -> Self {
            Self {
                hit,
                window,
                search_delay: None,
                fail_window: false,
                renders: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CaptionService for MockService {
        /// Return the canned hit, optionally after sleeping.
        async fn search(&self, _term: &str) -> Result<Option<SearchHit>> {
            if let Some(delay) = self.search_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.hit.clone())
        }

        /// Return the canned window, or a transport error when told to fail.
        async fn fetch_window(&self, _hit: &SearchHit) -> Result<Vec<Caption>> {
            if self.fail_window {
                let source = reqwest::Client::new().get("not a url").build().unwrap_err();
                return Err(ResolveError::Transport {
                    url: "not a url".into(),
                    source,
                });
            }
            Ok(self.window.clone())
        }

        /// Count the call and build a URL from the clip's keys.
        async fn render(&self, clip: &ResolvedClip) -> Result<String> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "https://media.test/{}/{}/{}.gif?b64lines={}",
                clip.episode, clip.span.start, clip.span.end, clip.payload
            ))
        }
    }

    fn hit(timestamp: i64) -> Option<SearchHit> {
        Some(SearchHit {
            id: Some(963130),
            episode: "S07E21".into(),
            timestamp,
        })
    }

    fn window() -> Vec<Caption> {
        vec![
            caption(480_000, 490_000, "Xyzzy qwv"),
            caption(490_000, 494_000, "Do you remember that"),
            caption(494_000, 497_000, "unforgettable luncheon?"),
            caption(497_000, 500_000, "Hi, Seymour!"),
        ]
    }

    /// Ensure a matching neighbour is merged and the URL comes from render.
    #[tokio::test]
    async fn generates_merged_clip() {
        let pipeline = Pipeline::new(
            MockService::new(hit(493_041), window()),
            ResolverConfig::default(),
        );
        let url = pipeline.generate("Unforgettable luncheon").await.unwrap();
        let payload = encode::encode("Do you remember that unforgettable luncheon?");
        assert_eq!(
            url,
            format!("https://media.test/S07E21/490000/497000.gif?b64lines={payload}")
        );
        assert_eq!(pipeline.service().renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolves_single_caption_without_rendering() {
        let pipeline = Pipeline::new(
            MockService::new(hit(498_500), window()),
            ResolverConfig::default(),
        );
        let clip = pipeline.resolve("Hi, Seymour!").await.unwrap();
        assert_eq!(clip.episode, "S07E21");
        assert_eq!(clip.span, ResolvedSpan::from(&window()[3]));
        assert_eq!(clip.payload, encode::encode("Hi, Seymour!"));
        assert_eq!(pipeline.service().renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_search_is_no_results() {
        let pipeline = Pipeline::new(MockService::new(None, window()), ResolverConfig::default());
        let err = pipeline.generate("Unforgettable luncheon").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoResults { .. }));
        assert_eq!(err.to_string(), "No results found for \"Unforgettable luncheon\"");
    }

    /// A timestamp outside every caption stops the chain before render.
    #[tokio::test]
    async fn missing_caption_short_circuits() {
        let pipeline = Pipeline::new(
            MockService::new(hit(600_000), window()),
            ResolverConfig::default(),
        );
        let err = pipeline.generate("anything").await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { timestamp: 600_000 }));
        assert_eq!(pipeline.service().renders.load(Ordering::SeqCst), 0);
    }

    /// A failing window fetch surfaces unchanged and nothing is rendered.
    #[tokio::test]
    async fn window_transport_error_stops_the_chain() {
        let mut service = MockService::new(hit(493_041), window());
        service.fail_window = true;
        let pipeline = Pipeline::new(service, ResolverConfig::default());
        let err = pipeline.generate("luncheon").await.unwrap_err();
        match err {
            ResolveError::Transport { url, source } => {
                assert_eq!(url, "not a url");
                assert!(source.is_builder());
            }
            other => panic!("expected transport error, got {other:?}"),
        }
        assert_eq!(pipeline.service().renders.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_step_times_out() {
        let mut service = MockService::new(hit(493_041), window());
        service.search_delay = Some(Duration::from_millis(500));
        let config = ResolverConfig {
            timeout: Some(Duration::from_millis(20)),
            ..ResolverConfig::default()
        };
        let pipeline = Pipeline::new(service, config);
        let err = pipeline.generate("luncheon").await.unwrap_err();
        assert!(matches!(err, ResolveError::Timeout { step: "search", .. }));
    }

    /// Raising the threshold keeps the neighbour out of the span.
    #[tokio::test]
    async fn threshold_comes_from_config() {
        let config = ResolverConfig {
            merge_threshold: 1.0,
            ..ResolverConfig::default()
        };
        let pipeline = Pipeline::new(MockService::new(hit(493_041), window()), config);
        let clip = pipeline.resolve("Unforgettable luncheon").await.unwrap();
        assert_eq!((clip.span.start, clip.span.end), (490_000, 494_000));
    }
}
