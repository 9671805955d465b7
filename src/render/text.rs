//! Plain-text output for terminals.

use super::View;
use std::fmt::Write;

pub fn render_text(view: &View) -> String {
    let mut out = String::new();
    match view {
        View::Blank => {}
        View::Loading => out.push_str("Loading news…\n"),
        View::FetchFailed(_) | View::NoArticles | View::Unrenderable(_) => {
            if let Some(message) = view.message() {
                writeln!(out, "{message}").unwrap();
            }
        }
        View::Feed {
            metadata, cards, ..
        } => {
            writeln!(out, "{}\n", metadata.title).unwrap();
            for (i, card) in cards.iter().enumerate() {
                let article = &card.article;
                writeln!(out, "[{}] {}", i + 1, article.title).unwrap();

                let mut byline = card.date_badge.clone();
                if let Some(host) = article.source_host() {
                    write!(byline, " · {host}").unwrap();
                }
                if card.has_image() {
                    byline.push_str(" · image");
                }
                writeln!(out, "    {byline}").unwrap();

                if !article.description.is_empty() {
                    writeln!(out, "    {}", article.description).unwrap();
                }
                writeln!(out, "    Read more: {}\n", article.link).unwrap();
            }
        }
    }
    out
}
