//! Live timeline access through a headless Chromium browser.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::Timeline;
use crate::config::Config;
use crate::constants::{BROWSER_USER_AGENT, EXPANDER_SELECTOR, POST_SELECTOR, TIMESTAMP_SELECTOR};

/// A timeline page driven through the Chrome DevTools protocol.
///
/// Holds the browser alive for the duration of the scrape; the child
/// process is torn down when this is dropped.
pub struct BrowserTimeline {
    page: Page,
    settle_delay: Duration,
    _browser: Browser,
    _handler_task: JoinHandle<()>,
}

impl BrowserTimeline {
    /// Launch a headless browser and navigate to the configured timeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser cannot be launched or the page
    /// fails to load.
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Launching headless browser");

        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.page_timeout)
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--mute-audio")
            .arg("--hide-scrollbars")
            .arg("--lang=en-US,en")
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"));

        if let Some(ref chrome_path) = config.chrome_path {
            builder = builder.chrome_executable(chrome_path);
        }
        if let Some(ref user_data_dir) = config.user_data_dir {
            builder = builder.user_data_dir(user_data_dir);
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        let page = browser
            .new_page(config.timeline_url.as_str())
            .await
            .context("Failed to open timeline page")?;
        page.wait_for_navigation()
            .await
            .context("Timed out waiting for the timeline to load")?;

        info!(url = %config.timeline_url, "Timeline page loaded");

        Ok(Self {
            page,
            settle_delay: config.expand_settle_delay,
            _browser: browser,
            _handler_task: handler_task,
        })
    }
}

#[async_trait]
impl Timeline for BrowserTimeline {
    async fn snapshot(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .context("Failed to read rendered page content")
    }

    async fn expand_posts(&mut self, post_ids: &[String]) -> Result<usize> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        let script = expand_script(post_ids)?;
        let clicked: u64 = self
            .page
            .evaluate(script)
            .await
            .context("Failed to run expander script")?
            .into_value()
            .context("Expander script returned an unexpected value")?;

        debug!(posts = post_ids.len(), clicked, "Triggered expander controls");

        // Give the layout time to re-render with the expanded text.
        if clicked > 0 {
            tokio::time::sleep(self.settle_delay).await;
        }

        Ok(usize::try_from(clicked).unwrap_or(usize::MAX))
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .context("Failed to scroll timeline")?;
        Ok(())
    }
}

/// Click actuator for "show more" controls, scoped to the given post ids.
/// The structural decision of *which* posts to expand is made beforehand
/// against the snapshot; this script re-checks the quoted-subtree guard
/// only because the live DOM may have shifted since.
fn expand_script(post_ids: &[String]) -> Result<String> {
    let ids = serde_json::to_string(post_ids).context("Failed to encode post ids")?;
    Ok(format!(
        r#"(() => {{
    const ids = {ids};
    let clicked = 0;
    for (const id of ids) {{
        const link = document.querySelector('{post} a[href*="/status/' + id + '"]');
        if (!link) continue;
        const post = link.closest('{post}');
        if (!post) continue;
        for (const control of post.querySelectorAll('{expander}')) {{
            const quoted = control.closest('[data-testid*="quote"], [data-testid*="Quote"], article');
            if (quoted && quoted !== post) continue;
            const linkish = control.closest('[role="link"]');
            if (linkish && post.contains(linkish) && linkish.querySelector('{timestamp}')) continue;
            try {{ control.click(); clicked += 1; }} catch (err) {{}}
        }}
    }}
    return clicked;
}})()"#,
        post = POST_SELECTOR,
        expander = EXPANDER_SELECTOR,
        timestamp = TIMESTAMP_SELECTOR,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_script_embeds_ids() {
        let script = expand_script(&["111".to_string(), "222".to_string()]).unwrap();
        assert!(script.contains(r#"["111","222"]"#));
        assert!(script.contains("tweet-text-show-more-link"));
    }
}
