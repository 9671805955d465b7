//! Turning a fetch phase into something a reader can look at.
//!
//! Rendering happens in two steps:
//!
//! 1. [`build_view`] maps a [`FetchPhase`] to a [`View`], deciding which of
//!    the loading, error, empty, or feed states applies and decoding the
//!    payload into cards
//! 2. a format module turns the view into output:
//!    - [`html`]: a standalone HTML document, through handlebars templates
//!    - [`text`]: plain lines for a terminal
//!
//! Both steps are pure. The card date badge uses the date in
//! [`RenderContext`], which callers set to the current date; the upstream
//! service publishes no article dates.

pub mod html;
pub mod text;

use crate::config::FeedConfig;
use crate::lifecycle::FetchPhase;
use crate::models::{Article, Payload};
use crate::utils::display_date;
use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Prefix of the message shown when the fetch failed.
pub const FETCH_ERROR_PREFIX: &str = "Error fetching news: ";
pub const NO_ARTICLES_MESSAGE: &str = "No news articles found.";
pub const LOADING_AVATAR_URL: &str = "https://www.svgrepo.com/show/509001/avatar-thinking-9.svg";

/// A payload that cannot be shown as a feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("expected a list of articles, got {0}")]
    NotAList(&'static str),
}

/// An article that lacks a usable stable identity or shape.
///
/// Defects never stop rendering. The affected card is still shown and
/// marked, and the defect is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataDefect {
    /// Entry is not an article object; rendered as an empty card.
    MalformedEntry { position: usize, message: String },
    MissingLink { position: usize },
    /// Several articles share one link, so none of them is uniquely keyed.
    DuplicateLink { link: String, positions: Vec<usize> },
}

impl DataDefect {
    /// Short tag used to mark affected cards.
    pub fn tag(&self) -> &'static str {
        match self {
            DataDefect::MalformedEntry { .. } => "malformed-entry",
            DataDefect::MissingLink { .. } => "missing-link",
            DataDefect::DuplicateLink { .. } => "duplicate-link",
        }
    }

    pub fn positions(&self) -> Vec<usize> {
        match self {
            DataDefect::MalformedEntry { position, .. } | DataDefect::MissingLink { position } => {
                vec![*position]
            }
            DataDefect::DuplicateLink { positions, .. } => positions.clone(),
        }
    }
}

impl fmt::Display for DataDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataDefect::MalformedEntry { position, message } => {
                write!(f, "article #{position} is malformed: {message}")
            }
            DataDefect::MissingLink { position } => {
                write!(f, "article #{position} has no link to key it by")
            }
            DataDefect::DuplicateLink { link, positions } => {
                write!(f, "articles {positions:?} share the link {link}")
            }
        }
    }
}

/// Page-level metadata handed to the host document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub charset: &'static str,
    pub title: String,
    pub canonical_url: String,
}

/// One rendered article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Stable identity; `None` when the article has no link.
    pub key: Option<String>,
    pub article: Article,
    pub date_badge: String,
    /// Tags of the defects affecting this card.
    pub defects: Vec<&'static str>,
}

impl Card {
    pub fn has_image(&self) -> bool {
        self.article.img_url.is_some()
    }
}

/// What to show for a given phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Nothing mounted, or the view was discarded.
    Blank,
    Loading,
    FetchFailed(String),
    NoArticles,
    Unrenderable(RenderError),
    Feed {
        metadata: PageMetadata,
        cards: Vec<Card>,
        defects: Vec<DataDefect>,
    },
}

impl View {
    /// The single line of text shown in place of a feed, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            View::FetchFailed(message) => Some(format!("{FETCH_ERROR_PREFIX}{message}")),
            View::NoArticles => Some(NO_ARTICLES_MESSAGE.to_string()),
            View::Unrenderable(e) => Some(format!("Unable to render news: {e}")),
            _ => None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            View::Feed { cards, .. } => cards,
            _ => &[],
        }
    }

    pub fn report(&self) -> RenderReport {
        let cards = self.cards();
        RenderReport {
            cards: cards.len(),
            images: cards.iter().filter(|c| c.has_image()).count(),
            defects: match self {
                View::Feed { defects, .. } => defects.len(),
                _ => 0,
            },
        }
    }
}

/// Counts logged after a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderReport {
    pub cards: usize,
    pub images: usize,
    pub defects: usize,
}

/// Inputs to rendering that do not come from the fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub page_title: String,
    pub canonical_url: String,
    /// Date shown on every card badge.
    pub today: NaiveDate,
}

impl RenderContext {
    pub fn new(config: &FeedConfig, today: NaiveDate) -> Self {
        Self {
            page_title: config.page_title.clone(),
            canonical_url: config.canonical_url.clone(),
            today,
        }
    }

    fn metadata(&self) -> PageMetadata {
        PageMetadata {
            charset: "utf-8",
            title: self.page_title.clone(),
            canonical_url: self.canonical_url.clone(),
        }
    }
}

/// Decide what to show for `phase`.
pub fn build_view(phase: &FetchPhase, ctx: &RenderContext) -> View {
    match phase {
        FetchPhase::Idle | FetchPhase::Cancelled => View::Blank,
        FetchPhase::Pending => View::Loading,
        FetchPhase::Failed(e) => View::FetchFailed(e.to_string()),
        FetchPhase::Resolved(payload) => match payload_entries(payload) {
            Err(e) => {
                warn!(error = %e, "News payload cannot be rendered");
                View::Unrenderable(e)
            }
            Ok([]) => View::NoArticles,
            Ok(entries) => feed_view(entries, ctx),
        },
    }
}

fn payload_entries(payload: &Payload) -> Result<&[Value], RenderError> {
    match &payload.0 {
        Value::Array(entries) => Ok(entries),
        Value::Null => Err(RenderError::NotAList("null")),
        Value::Bool(_) => Err(RenderError::NotAList("a boolean")),
        Value::Number(_) => Err(RenderError::NotAList("a number")),
        Value::String(_) => Err(RenderError::NotAList("a string")),
        Value::Object(_) => Err(RenderError::NotAList("an object")),
    }
}

fn feed_view(entries: &[Value], ctx: &RenderContext) -> View {
    let date_badge = display_date(ctx.today);
    let mut defects = Vec::new();

    let mut cards: Vec<Card> = entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let article = match serde_json::from_value::<Article>(entry.clone()) {
                Ok(article) => article,
                Err(e) => {
                    defects.push(DataDefect::MalformedEntry {
                        position,
                        message: e.to_string(),
                    });
                    Article::default()
                }
            };
            let key = article.key().map(str::to_string);
            if key.is_none() {
                defects.push(DataDefect::MissingLink { position });
            }
            Card {
                key,
                article,
                date_badge: date_badge.clone(),
                defects: Vec::new(),
            }
        })
        .collect();

    let duplicates = cards
        .iter()
        .enumerate()
        .filter_map(|(position, card)| card.key.clone().map(|key| (key, position)))
        .into_group_map()
        .into_iter()
        .filter(|(_, positions)| positions.len() > 1)
        .sorted_by_key(|(_, positions)| positions[0])
        .map(|(link, positions)| DataDefect::DuplicateLink { link, positions });
    defects.extend(duplicates);

    for defect in &defects {
        warn!(defect = %defect, "News article data defect");
        for position in defect.positions() {
            cards[position].defects.push(defect.tag());
        }
    }

    View::Feed {
        metadata: ctx.metadata(),
        cards,
        defects,
    }
}
