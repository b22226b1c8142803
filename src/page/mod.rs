//! Timeline page access.
//!
//! The collector only needs three capabilities from the page it scrapes:
//! a rendered-DOM snapshot, triggering truncation expanders, and loading
//! more content by scrolling. [`Timeline`] is that seam;
//! [`browser::BrowserTimeline`] drives a real headless browser and
//! [`scripted::ScriptedTimeline`] replays canned snapshots.

pub mod browser;
pub mod scripted;

pub use browser::BrowserTimeline;
pub use scripted::{ScriptedTimeline, TimelineFrame};

use anyhow::Result;
use async_trait::async_trait;

/// A live, auto-scrolling page of posts. The page is an external,
/// uncontrolled mutable resource; all reads are best-effort.
#[async_trait]
pub trait Timeline: Send {
    /// Serialized HTML of the currently rendered page.
    async fn snapshot(&mut self) -> Result<String>;

    /// Trigger the "show more" expander controls of the given posts and
    /// wait for the layout to settle. Returns the number of controls
    /// activated.
    async fn expand_posts(&mut self, post_ids: &[String]) -> Result<usize>;

    /// Scroll to the bottom of the content area so further posts render.
    async fn scroll_to_bottom(&mut self) -> Result<()>;
}
