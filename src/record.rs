use serde::{Deserialize, Serialize};

/// One scraped post, flattened for export.
///
/// A record is immutable once inserted into the collected set; the
/// collector never re-extracts an identifier it has already seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Numeric token from the permalink `/status/{id}` path segment.
    /// Unique within a collected set; used as the dedup key.
    pub id: String,
    /// Normalized `YYYY-MM-DD HH:MM:SS` timestamp, or the raw attribute
    /// value when it could not be parsed.
    pub timestamp: String,
    /// Display name of the post's author.
    pub author_name: String,
    /// `@`-prefixed unique handle of the post's author.
    pub handle: String,
    /// Plain-text body, with any truncation expanded before extraction.
    pub content: String,
    /// Canonical permalink to the post.
    pub url: String,
    /// Ordered, deduplicated attachment URLs.
    pub media: Vec<String>,
    /// Text of an embedded quoted post, empty if none.
    pub quoted_content: String,
    /// Permalink of an embedded quoted post, empty if none.
    pub quoted_url: String,
}
