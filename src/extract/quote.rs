//! Quoted-post detection and truncation-expander targeting.
//!
//! Both jobs hinge on the same structural question: is a given node part
//! of the post itself, or of a quoted post nested inside it? The answer is
//! computed by walking ancestors up to the post boundary and testing for
//! quote-container markers.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{parse_status_id, rendered_text, AUTHOR_BLOCK, BODY_TEXT, PERMALINK, POST, TIMESTAMP};
use crate::constants::{EXPANDER_SELECTOR, QUOTE_SELECTOR};

static QUOTE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(QUOTE_SELECTOR).expect("valid selector"));
static ROLE_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[role="link"]"#).expect("valid selector"));
static EXPANDER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(EXPANDER_SELECTOR).expect("valid selector"));

/// Extract the text and permalink of a quoted post nested inside `post`.
/// Returns empty strings when no quote is present.
#[must_use]
pub fn find_quote(post: &ElementRef) -> (String, String) {
    let container = post
        .select(&QUOTE)
        .next()
        .or_else(|| find_quote_container(post));

    let Some(container) = container else {
        return (String::new(), String::new());
    };

    let quoted_content = container
        .select(&BODY_TEXT)
        .next()
        .map(|el| rendered_text(&el))
        .unwrap_or_default();

    let quoted_url = container
        .select(&PERMALINK)
        .next()
        .and_then(|el| el.value().attr("href"))
        .unwrap_or_default()
        .to_string();

    (quoted_content, quoted_url)
}

/// Fallback quote detection for containers without an explicit quote tag:
/// a link-like descendant carrying both a timestamp and post content,
/// whose nearest post-container ancestor is this post itself.
fn find_quote_container<'a>(post: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    for candidate in post.select(&ROLE_LINK) {
        let has_timestamp = candidate.select(&TIMESTAMP).next().is_some();
        let has_body = candidate.select(&BODY_TEXT).next().is_some()
            || candidate.select(&AUTHOR_BLOCK).next().is_some();

        if has_timestamp && has_body && nearest_post_is(&candidate, post) {
            return Some(candidate);
        }
    }
    None
}

/// Identifiers of not-yet-seen posts that have at least one "show more"
/// expander control outside any quoted subtree. These are the posts the
/// collector must expand before first extraction.
#[must_use]
pub fn expandable_posts(html: &str, seen: &HashSet<String>) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut ids = Vec::new();
    let mut picked = HashSet::new();

    for post in document.select(&POST) {
        let Some(id) = post
            .select(&PERMALINK)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(parse_status_id)
        else {
            continue;
        };
        if seen.contains(&id) || picked.contains(&id) {
            continue;
        }

        let has_own_expander = post
            .select(&EXPANDER)
            .any(|control| !is_in_quoted_subtree(&control, &post));
        if has_own_expander {
            picked.insert(id.clone());
            ids.push(id);
        }
    }

    ids
}

/// Walk ancestors from `el` up to (exclusive) the post boundary, testing
/// for quote-container markers: a quote-tagged container, an intervening
/// independently-articulated post element, or a link-like container that
/// itself holds a timestamp.
fn is_in_quoted_subtree(el: &ElementRef, post: &ElementRef) -> bool {
    let mut current = el.parent();

    while let Some(node) = current {
        if node.id() == post.id() {
            break;
        }
        if let Some(ancestor) = ElementRef::wrap(node) {
            let value = ancestor.value();

            if let Some(testid) = value.attr("data-testid") {
                if testid.contains("quote") || testid.contains("Quote") {
                    return true;
                }
            }

            if value.name() == "article" {
                return true;
            }

            if value.attr("role") == Some("link")
                && ancestor.select(&TIMESTAMP).next().is_some()
            {
                return true;
            }
        }
        current = node.parent();
    }

    false
}

/// Whether the nearest post-container ancestor of `el` is `post` itself,
/// ruling out candidates that belong to some other (nested) post.
fn nearest_post_is(el: &ElementRef, post: &ElementRef) -> bool {
    let mut current = el.parent();
    while let Some(node) = current {
        if let Some(ancestor) = ElementRef::wrap(node) {
            if ancestor.value().attr("data-testid") == Some("tweet") {
                return node.id() == post.id();
            }
        }
        current = node.parent();
    }
    false
}
