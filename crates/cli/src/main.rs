//! Binary entry point for the quote-to-gif resolver.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use quotegif_core::caption::DEFAULT_MERGE_THRESHOLD;
use quotegif_core::config::{DEFAULT_API_URL, DEFAULT_MEDIA_URL, DEFAULT_WINDOW_MARGIN_MS};
use quotegif_core::{FrinkiacClient, Pipeline, ResolverConfig, WindowStrategy};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum Window {
    /// Fetch a time range around the hit.
    Range,
    /// Use the single-timestamp caption lookup.
    Caption,
}

/// Command line options for the binary.
#[derive(Parser)]
struct Cli {
    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,

    /// Print the resolved caption span and render URL without rendering.
    #[arg(long)]
    no_render: bool,

    /// Base URL of the search and caption endpoints.
    #[arg(long, env = "QUOTEGIF_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Base URL of the render endpoint.
    #[arg(long, env = "QUOTEGIF_MEDIA_URL", default_value = DEFAULT_MEDIA_URL)]
    media_url: String,

    /// How captions around the search hit are fetched.
    #[arg(long, value_enum, default_value_t = Window::Range)]
    window: Window,

    /// Milliseconds fetched on each side of the hit.
    #[arg(
        long,
        default_value_t = DEFAULT_WINDOW_MARGIN_MS,
        value_parser = clap::value_parser!(i64).range(0..)
    )]
    window_margin_ms: i64,

    /// Similarity a neighbouring caption must exceed to be merged.
    #[arg(long, default_value_t = DEFAULT_MERGE_THRESHOLD)]
    threshold: f64,

    /// Give up on any single request after this many seconds.
    #[arg(long, env = "QUOTEGIF_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Quote to search for.
    #[arg(required = true)]
    term: Vec<String>,
}

impl Cli {
    fn config(&self) -> ResolverConfig {
        ResolverConfig {
            api_url: self.api_url.clone(),
            media_url: self.media_url.clone(),
            window_strategy: match self.window {
                Window::Range => WindowStrategy::Range,
                Window::Caption => WindowStrategy::Caption,
            },
            window_margin_ms: self.window_margin_ms,
            merge_threshold: self.threshold,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Application entry point which parses CLI args and performs actions.
/// This function should initialize logging and delegate to the core library.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("quotegif=trace".parse()?)
            .add_directive("quotegif_core=trace".parse()?)
            .add_directive("info".parse()?)
    } else {
        EnvFilter::default()
            .add_directive("quotegif=info".parse()?)
            .add_directive("quotegif_core=info".parse()?)
            .add_directive("warn".parse()?)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let term = cli.term.join(" ");
    let config = cli.config();
    let client = FrinkiacClient::new(config.clone());
    let pipeline = Pipeline::new(client, config);
    if cli.no_render {
        let clip = pipeline.resolve(&term).await?;
        println!(
            "{} {}-{}ms: {}",
            clip.episode, clip.span.start, clip.span.end, clip.span.content
        );
        println!("{}", pipeline.service().render_url(&clip));
    } else {
        println!("{}", pipeline.generate(&term).await?);
    }
    Ok(())
}
