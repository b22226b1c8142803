//! Media attachment collection for a single post.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::constants::{PHOTO_SELECTOR, VIDEO_SELECTOR};

static PHOTO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(PHOTO_SELECTOR).expect("valid selector"));
static VIDEO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(VIDEO_SELECTOR).expect("valid selector"));
static SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("source").expect("valid selector"));

/// Pattern matching the size variant query parameter of an image URL.
static SIZE_PARAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&])name=\w+").expect("valid regex"));

/// Collect attachment URLs for a post: photos (upgraded to the large
/// variant) followed by video posters and sources, deduplicated while
/// preserving first-seen order.
#[must_use]
pub fn collect_media(post: &ElementRef) -> Vec<String> {
    let mut urls = Vec::new();

    for img in post.select(&PHOTO) {
        if let Some(src) = img.value().attr("src") {
            if is_attachment_source(src) {
                urls.push(upgrade_image_quality(src));
            }
        }
    }

    for video in post.select(&VIDEO) {
        if let Some(poster) = video.value().attr("poster") {
            if !poster.is_empty() && !poster.starts_with("blob:") {
                urls.push(poster.to_string());
            }
        }
        if let Some(source) = video.select(&SOURCE).next() {
            if let Some(src) = source.value().attr("src") {
                if !src.is_empty() && !src.starts_with("blob:") {
                    urls.push(src.to_string());
                }
            }
        }
    }

    dedup_preserving_order(urls)
}

/// Filter out sources that are not real attachments: ephemeral in-memory
/// references, profile pictures, and emoji assets.
fn is_attachment_source(src: &str) -> bool {
    !src.is_empty()
        && !src.starts_with("blob:")
        && !src.contains("profile_images")
        && !src.contains("emoji")
}

/// Rewrite the size variant query parameter to request the large version.
fn upgrade_image_quality(src: &str) -> String {
    SIZE_PARAM_PATTERN
        .replace(src, "${1}name=large")
        .into_owned()
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter().filter(|u| seen.insert(u.clone())).collect()
}
