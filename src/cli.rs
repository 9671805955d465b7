//! Command-line interface definitions for News Bharat.
//!
//! Every option can also be given through the environment variable named in
//! its help text. Values given here override the YAML config file.

use clap::{Parser, ValueEnum};

/// How the settled feed is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// A standalone HTML document.
    #[default]
    Html,
    /// Plain text for terminals.
    Text,
}

/// Command-line arguments for the News Bharat feed.
///
/// # Examples
///
/// ```sh
/// # Render the live feed to stdout
/// news_bharat
///
/// # Write an HTML page, sending a session cookie with the request
/// news_bharat -o ./public/index.html --cookie session=abc123
///
/// # Read the feed in a terminal from a local test server
/// news_bharat --format text --endpoint http://localhost:3000/news
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, env = "NEWS_CONFIG")]
    pub config: Option<String>,

    /// News list endpoint
    #[arg(long, env = "NEWS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Cookie to send with the request as name=value (repeatable)
    #[arg(long = "cookie", env = "NEWS_COOKIE", value_delimiter = ',')]
    pub cookies: Vec<String>,

    /// Do not attach any cookies to the request
    #[arg(long)]
    pub omit_credentials: bool,

    /// Give up on the request after this many seconds (no timeout by default)
    #[arg(long, env = "NEWS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    /// File to write the rendered feed to (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,
}
