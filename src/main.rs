//! # News Bharat
//!
//! Fetches the News Bharat article list from its HTTP endpoint and renders it
//! as a feed: an HTML page by default, or plain text for terminals.
//!
//! ## Usage
//!
//! ```sh
//! news_bharat -o ./public/index.html
//! news_bharat --format text
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: defaults, optional YAML file, then CLI flags
//! 2. **Fetching**: one feed view is mounted and issues a single GET
//! 3. **Settling**: the fetch resolves, fails, or is cancelled on Ctrl-C
//! 4. **Rendering**: the settled phase is turned into a view and written out

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod lifecycle;
mod models;
mod render;
mod utils;

use api::NewsClient;
use cli::{Cli, OutputFormat};
use config::FeedConfig;
use lifecycle::{FetchLifecycle, FetchPhase};
use render::{RenderContext, build_view, html, text};
use utils::ensure_writable_parent;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, so stdout only carries the page) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_bharat starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.format, ?args.output, "Parsed CLI arguments");

    let config = FeedConfig::resolve(&args).await?;
    let html_renderer = html::HtmlRenderer::new()?;

    // Early check: fail before fetching if the page cannot be written
    if let Some(path) = &args.output {
        if let Err(e) = ensure_writable_parent(path).await {
            error!(path = %path, error = %e, "Output location is not writable");
            return Err(e);
        }
    }

    let client = Arc::new(NewsClient::new(&config)?);
    info!(
        endpoint = client.endpoint(),
        with_credentials = client.sends_credentials(),
        "Fetching news"
    );

    let ctx = RenderContext::new(&config, Local::now().date_naive());
    let mut lifecycle = FetchLifecycle::new();
    lifecycle.mount(client);
    debug!(loading = lifecycle.state().loading, "Feed mounted");

    if args.format == OutputFormat::Text && args.output.is_none() {
        eprint!("{}", text::render_text(&build_view(&lifecycle.phase(), &ctx)));
    }

    let settled = tokio::select! {
        phase = lifecycle.settled() => Some(phase),
        _ = tokio::signal::ctrl_c() => None,
    };
    let phase = match settled {
        Some(phase) => phase,
        None => {
            warn!("Interrupted; unmounting feed");
            lifecycle.unmount();
            lifecycle.phase()
        }
    };

    let view = build_view(&phase, &ctx);
    let report = view.report();
    info!(
        phase = phase.name(),
        cards = report.cards,
        images = report.images,
        defects = report.defects,
        "Rendered feed"
    );

    let rendered = match args.format {
        OutputFormat::Html => html_renderer.render_document(&view)?,
        OutputFormat::Text => text::render_text(&view),
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &rendered).await?;
            info!(path = %path, bytes = rendered.len(), "Wrote feed");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(rendered.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    match phase {
        FetchPhase::Failed(e) => Err(Box::new(e)),
        _ => Ok(()),
    }
}
