//! Data models for the news feed.
//!
//! - [`Article`]: a single item from the upstream news service
//! - [`Payload`]: the response body, kept verbatim until render time
//!
//! The upstream service owns the article schema. Nothing here validates it:
//! missing string fields become empty strings and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A news article as published by the upstream service.
///
/// The `link` doubles as the article's stable identity when rendering a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Display headline.
    #[serde(default)]
    pub title: String,
    /// Summary text shown under the headline.
    #[serde(default)]
    pub description: String,
    /// Target URL of every interactive element on the card.
    #[serde(default)]
    pub link: String,
    /// Optional cover image. No image is rendered when absent.
    #[serde(default)]
    pub img_url: Option<String>,
}

impl Article {
    /// The identity used to key this article in a rendered feed, if it has one.
    pub fn key(&self) -> Option<&str> {
        let link = self.link.trim();
        if link.is_empty() { None } else { Some(link) }
    }

    /// Host of the article link, e.g. `"www.thehindu.com"`.
    pub fn source_host(&self) -> Option<String> {
        url::Url::parse(&self.link)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
    }
}

/// The response body of a successful fetch, stored exactly as received.
///
/// A body that is not JSON at all is kept as a JSON string so that the
/// mismatch surfaces when the feed is rendered, not when it is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Value);

impl Payload {
    /// An empty article list, the state before any response arrives.
    pub fn empty() -> Self {
        Payload(Value::Array(Vec::new()))
    }

    /// Store a raw response body. A blank body (e.g. `204 No Content`)
    /// counts as an empty list.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Payload::empty();
        }
        match serde_json::from_str(body) {
            Ok(value) => Payload(value),
            Err(_) => Payload(Value::String(body.to_string())),
        }
    }

    /// Number of entries when the payload is a list.
    pub fn len(&self) -> Option<usize> {
        self.0.as_array().map(Vec::len)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::empty()
    }
}
