//! Structural extraction of post records from rendered timeline HTML.
//!
//! All functions here operate on a parsed snapshot (`scraper::Html`), never
//! on the live browser, so the heuristics can be exercised against
//! synthetic fixtures.

mod media;
mod quote;

pub use quote::expandable_posts;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::constants::{
    AUTHOR_BLOCK_SELECTOR, BODY_TEXT_SELECTOR, PERMALINK_SELECTOR, POST_SELECTOR,
    TIMESTAMP_SELECTOR,
};
use crate::record::PostRecord;

static POST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(POST_SELECTOR).expect("valid selector"));
static BODY_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(BODY_TEXT_SELECTOR).expect("valid selector"));
static AUTHOR_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(AUTHOR_BLOCK_SELECTOR).expect("valid selector"));
static TIMESTAMP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(TIMESTAMP_SELECTOR).expect("valid selector"));
static PERMALINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PERMALINK_SELECTOR).expect("valid selector"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").expect("valid selector"));
static SITE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href^="/"]"#).expect("valid selector"));

/// Pattern to extract the post identifier from a permalink path.
static STATUS_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").expect("valid regex"));

/// Extract every post visible in a rendered snapshot, in document order.
///
/// Posts without a parseable permalink are skipped.
#[must_use]
pub fn extract_posts(html: &str) -> Vec<PostRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for post in document.select(&POST) {
        match extract_post(&post) {
            Some(record) => records.push(record),
            None => debug!("Skipping post without a permalink identifier"),
        }
    }

    records
}

/// Extract a single post container into a flat record.
///
/// Returns `None` when no permalink identifier can be found; the post is
/// considered malformed and the caller skips it.
#[must_use]
pub fn extract_post(post: &ElementRef) -> Option<PostRecord> {
    let permalink_el = post.select(&PERMALINK).next()?;
    let permalink = permalink_el.value().attr("href")?;
    let id = parse_status_id(permalink)?;

    let timestamp = post
        .select(&TIMESTAMP)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .map(format_timestamp)
        .unwrap_or_default();

    let (author_name, handle) = post
        .select(&AUTHOR_BLOCK)
        .next()
        .map(|block| (author_name(&block), author_handle(&block)))
        .unwrap_or_default();

    let content = post
        .select(&BODY_TEXT)
        .next()
        .map(|el| rendered_text(&el))
        .unwrap_or_default();

    let (quoted_content, quoted_url) = quote::find_quote(post);

    Some(PostRecord {
        id,
        timestamp,
        author_name,
        handle,
        content,
        url: permalink.to_string(),
        media: media::collect_media(post),
        quoted_content,
        quoted_url,
    })
}

/// Parse the numeric identifier out of a `/status/` permalink path.
#[must_use]
pub fn parse_status_id(permalink: &str) -> Option<String> {
    STATUS_ID_PATTERN
        .captures(permalink)
        .map(|caps| caps[1].to_string())
}

/// Reformat a machine-readable timestamp as `YYYY-MM-DD HH:MM:SS`,
/// rendered in the timestamp's own offset. Unparseable values pass
/// through unchanged.
#[must_use]
pub fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Collected rendered text of an element, trimmed.
fn rendered_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Pick the display name out of an author block: the first span text that
/// is non-empty, not an `@`-handle, not the separator glyph, and not a
/// verification badge label.
fn author_name(block: &ElementRef) -> String {
    for span in block.select(&SPAN) {
        let text = span.text().collect::<String>();
        let text = text.trim();
        if !text.is_empty() && !text.starts_with('@') && text != "·" && !text.contains("Verified") {
            return text.to_string();
        }
    }
    String::new()
}

/// Locate the author handle: prefer the visible `@text` of the first
/// site-internal link, else derive it from the link target path.
fn author_handle(block: &ElementRef) -> String {
    let Some(link) = block.select(&SITE_LINK).next() else {
        return String::new();
    };

    let text = link.text().collect::<String>();
    let text = text.trim();
    if text.starts_with('@') {
        return text.to_string();
    }

    link.value()
        .attr("href")
        .and_then(handle_from_href)
        .unwrap_or_default()
}

/// Derive an `@handle` from a profile link target, tolerating both
/// absolute and site-relative hrefs.
fn handle_from_href(href: &str) -> Option<String> {
    let path = match url::Url::parse(href) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => href.to_string(),
    };

    let segment = path.trim_start_matches('/').split('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(format!("@{segment}"))
    }
}
