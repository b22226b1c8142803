//! Shared constants used across the application.

/// User agent string presented by the headless browser.
///
/// A realistic browser user agent so the timeline renders the same markup
/// it would serve to a normal browser session.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// CSS selector matching one rendered post container.
pub const POST_SELECTOR: &str = r#"[data-testid="tweet"]"#;

/// CSS selector matching the body-text element of a post.
pub const BODY_TEXT_SELECTOR: &str = r#"[data-testid="tweetText"]"#;

/// CSS selector matching the author block of a post.
pub const AUTHOR_BLOCK_SELECTOR: &str = r#"[data-testid="User-Name"]"#;

/// CSS selector matching the photo container of a post.
pub const PHOTO_SELECTOR: &str = r#"[data-testid="tweetPhoto"] img"#;

/// CSS selector matching video elements of a post.
pub const VIDEO_SELECTOR: &str = r#"[data-testid="videoComponent"] video"#;

/// CSS selector matching a machine-readable timestamp element.
pub const TIMESTAMP_SELECTOR: &str = "time[datetime]";

/// CSS selector matching a post permalink.
pub const PERMALINK_SELECTOR: &str = r#"a[href*="/status/"]"#;

/// CSS selector matching an explicitly tagged quoted-post container.
pub const QUOTE_SELECTOR: &str = r#"[data-testid="quoteTweet"]"#;

/// CSS selector matching a "show more" truncation-expander control.
pub const EXPANDER_SELECTOR: &str = r#"[data-testid="tweet-text-show-more-link"]"#;
