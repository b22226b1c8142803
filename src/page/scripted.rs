//! Replay-based timeline for tests and offline runs.

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::Timeline;

/// One scroll position of a scripted timeline: the rendered HTML, plus an
/// optional variant shown after truncation expanders are triggered.
#[derive(Debug, Clone)]
pub struct TimelineFrame {
    pub html: String,
    pub expanded_html: Option<String>,
}

impl TimelineFrame {
    #[must_use]
    pub fn plain(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            expanded_html: None,
        }
    }

    #[must_use]
    pub fn with_expansion(html: impl Into<String>, expanded_html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            expanded_html: Some(expanded_html.into()),
        }
    }
}

/// A timeline that replays a fixed sequence of snapshots. Scrolling
/// advances through the frames and then keeps serving the last one, which
/// mirrors a page whose content stays "present" but stops growing.
#[derive(Debug)]
pub struct ScriptedTimeline {
    frames: Vec<TimelineFrame>,
    cursor: usize,
    expanded: bool,
    /// Post ids requested for expansion, one entry per call.
    pub expand_requests: Vec<Vec<String>>,
    /// Number of scroll calls served.
    pub scroll_count: usize,
}

impl ScriptedTimeline {
    #[must_use]
    pub fn new(frames: Vec<TimelineFrame>) -> Self {
        Self {
            frames,
            cursor: 0,
            expanded: false,
            expand_requests: Vec::new(),
            scroll_count: 0,
        }
    }
}

#[async_trait]
impl Timeline for ScriptedTimeline {
    async fn snapshot(&mut self) -> Result<String> {
        let Some(frame) = self.frames.get(self.cursor) else {
            bail!("scripted timeline has no frames");
        };
        if self.expanded {
            if let Some(ref expanded) = frame.expanded_html {
                return Ok(expanded.clone());
            }
        }
        Ok(frame.html.clone())
    }

    async fn expand_posts(&mut self, post_ids: &[String]) -> Result<usize> {
        self.expand_requests.push(post_ids.to_vec());
        self.expanded = true;
        Ok(post_ids.len())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.scroll_count += 1;
        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
            self.expanded = false;
        }
        Ok(())
    }
}
