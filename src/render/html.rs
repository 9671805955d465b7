//! HTML output.
//!
//! Documents are rendered from handlebars templates, which escape every
//! `{{value}}` they interpolate. The `<head>` carries the page metadata only
//! when a non-empty feed is shown; every other state renders a bare body.
//!
//! # Card layout
//!
//! ```text
//! <article class="card" data-key="{link}">
//!   <a class="card-media" href="{link}">      image (optional) + date badge
//!   <div class="card-body">
//!     <a class="card-title" href="{link}">    title
//!     <p class="card-description">            description
//!     <a class="read-more" href="{link}">     "Read more"
//! ```
//!
//! All three links open in a new browsing context.

use super::{Card, LOADING_AVATAR_URL, PageMetadata, View};
use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;

const DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
{{#if metadata}}
<meta charset="{{metadata.charset}}">
<title>{{metadata.title}}</title>
<link rel="canonical" href="{{metadata.canonical_url}}">
{{/if}}
</head>
<body>
{{> body}}
</body>
</html>
"#;

const BODY_TEMPLATE: &str = r#"{{#if loading_avatar}}
<div class="loading" role="status">
  <div class="spinner" aria-hidden="true"></div>
  <img class="loading-avatar" src="{{loading_avatar}}" alt="Loading avatar">
</div>
{{/if}}
{{#if message}}
<p>{{message}}</p>
{{/if}}
{{#if cards}}
<div class="feed">
{{#each cards}}
{{> card}}
{{/each}}
</div>
{{/if}}
"#;

const CARD_TEMPLATE: &str = r#"<article class="card"{{#if key}} data-key="{{key}}"{{/if}}{{#if defects}} data-defect="{{defects}}"{{/if}}>
  <a class="card-media" href="{{link}}" target="_blank" rel="noopener noreferrer">
{{#if img_url}}
    <img class="card-image" src="{{img_url}}" alt="{{title}}">
{{/if}}
    <span class="date-badge">{{date_badge}}</span>
  </a>
  <div class="card-body">
    <a class="card-title" href="{{link}}" target="_blank" rel="noopener noreferrer">{{title}}</a>
    <p class="card-description">{{description}}</p>
    <a class="read-more" href="{{link}}" target="_blank" rel="noopener noreferrer">Read more</a>
  </div>
</article>
"#;

#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("invalid page template: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),
}

#[derive(Serialize)]
struct PageData<'a> {
    metadata: Option<&'a PageMetadata>,
    loading_avatar: Option<&'static str>,
    message: Option<String>,
    cards: Vec<CardData<'a>>,
}

#[derive(Serialize)]
struct CardData<'a> {
    key: Option<&'a str>,
    defects: String,
    link: &'a str,
    title: &'a str,
    description: &'a str,
    img_url: Option<&'a str>,
    date_badge: &'a str,
}

impl<'a> PageData<'a> {
    fn new(view: &'a View) -> Self {
        Self {
            metadata: match view {
                View::Feed { metadata, .. } => Some(metadata),
                _ => None,
            },
            loading_avatar: matches!(view, View::Loading).then_some(LOADING_AVATAR_URL),
            message: view.message(),
            cards: view.cards().iter().map(CardData::new).collect(),
        }
    }
}

impl<'a> CardData<'a> {
    fn new(card: &'a Card) -> Self {
        Self {
            key: card.key.as_deref(),
            defects: card.defects.join(" "),
            link: &card.article.link,
            title: &card.article.title,
            description: &card.article.description,
            img_url: card.article.img_url.as_deref(),
            date_badge: &card.date_badge,
        }
    }
}

/// Template registry for the feed page.
pub struct HtmlRenderer {
    registry: Handlebars<'static>,
}

impl HtmlRenderer {
    pub fn new() -> Result<Self, HtmlError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_template_string("document", DOCUMENT_TEMPLATE)?;
        registry.register_partial("body", BODY_TEMPLATE)?;
        registry.register_partial("card", CARD_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Render `view` as a standalone HTML document.
    pub fn render_document(&self, view: &View) -> Result<String, HtmlError> {
        Ok(self.registry.render("document", &PageData::new(view))?)
    }
}
