//! Resolve a quote into a rendered clip from a captioned-screenshot service.

pub mod caption;
pub mod config;
pub mod encode;
pub mod error;
pub mod pipeline;

pub use caption::{Caption, ResolvedSpan, SearchHit};
pub use config::{ResolverConfig, WindowStrategy};
pub use error::ResolveError;
pub use pipeline::{frinkiac::FrinkiacClient, CaptionService, Pipeline, ResolvedClip};
