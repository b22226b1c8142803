//! The scrape loop: an Idle/Running state machine around the record store.
//!
//! The collector is a tokio actor. While idle it waits on the command
//! channel; a start command opens a session that alternates extraction
//! cycles with cancellable waits, and every path out of a session (stop,
//! natural completion, fatal timeline failure) goes through the exporter.

mod control;

pub use control::{control_channel, Command, ControlError, ControlHandle, Event, Status};

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::export;
use crate::extract;
use crate::page::Timeline;
use crate::record::PostRecord;

/// Loop tuning, split off from the full [`Config`] so tests can drive the
/// collector without any environment.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Suspension between scrape cycles.
    pub cycle_delay: Duration,
    /// Consecutive no-growth cycles after which the session completes.
    pub max_stalled_cycles: u32,
    /// Directory receiving the CSV export.
    pub output_dir: PathBuf,
}

impl From<&Config> for CollectorConfig {
    fn from(config: &Config) -> Self {
        Self {
            cycle_delay: config.scroll_delay,
            max_stalled_cycles: config.max_stalled_cycles,
            output_dir: config.output_dir.clone(),
        }
    }
}

/// How a running session ended.
enum SessionEnd {
    /// Stall threshold reached; the timeline stopped yielding new posts.
    Completed,
    /// Explicit stop command (or the command channel closed).
    Stopped,
    /// The timeline itself failed.
    Failed(anyhow::Error),
}

/// The collector actor. Owns the record store and seen-identifier set for
/// one loop run; both are reset on every start command.
pub struct Collector<T: Timeline> {
    timeline: T,
    config: CollectorConfig,
    records: Vec<PostRecord>,
    seen: HashSet<String>,
}

impl<T: Timeline> Collector<T> {
    pub fn new(timeline: T, config: CollectorConfig) -> Self {
        Self {
            timeline,
            config,
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Run the actor until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, events: mpsc::Sender<Event>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Start(reply) => {
                    let _ = reply.send(Ok(()));
                    self.records.clear();
                    self.seen.clear();

                    let end = self.run_session(&mut commands, &events).await;
                    if let SessionEnd::Failed(ref e) = end {
                        error!("Scrape session failed: {e:#}");
                        let _ = events
                            .send(Event::Error {
                                error: format!("{e:#}"),
                            })
                            .await;
                    }
                    self.export_and_notify(&events, matches!(end, SessionEnd::Completed))
                        .await;
                }
                Command::Stop(reply) => {
                    // Stop while idle still delivers whatever the last
                    // session collected (usually nothing).
                    let _ = reply.send(());
                    self.export_and_notify(&events, false).await;
                }
                Command::GetStatus(reply) => {
                    let _ = reply.send(self.status(false));
                }
            }
        }
    }

    fn status(&self, is_running: bool) -> Status {
        Status {
            is_running,
            count: self.records.len(),
        }
    }

    async fn run_session(
        &mut self,
        commands: &mut mpsc::Receiver<Command>,
        events: &mpsc::Sender<Event>,
    ) -> SessionEnd {
        info!("Scrape session started");
        let cancel = CancellationToken::new();
        let mut stalled = 0u32;

        loop {
            // A stop issued while the previous cycle was extracting is
            // honored here, before any new work begins.
            self.drain_commands(commands, &cancel);
            if cancel.is_cancelled() {
                return SessionEnd::Stopped;
            }

            let before = self.records.len();
            if let Err(e) = self.run_cycle().await {
                return SessionEnd::Failed(e);
            }

            let count = self.records.len();
            let _ = events
                .send(Event::Progress {
                    count,
                    status: "scrolling for more posts".to_string(),
                })
                .await;

            if count == before {
                stalled += 1;
                debug!(stalled, "No new posts this cycle");
                if stalled >= self.config.max_stalled_cycles {
                    info!(count, "Timeline exhausted, completing session");
                    return SessionEnd::Completed;
                }
            } else {
                debug!(count, new = count - before, "Collected new posts");
                stalled = 0;
            }

            if let Err(e) = self.timeline.scroll_to_bottom().await {
                return SessionEnd::Failed(e);
            }

            if !self.wait_between_cycles(commands, &cancel).await {
                return SessionEnd::Stopped;
            }
        }
    }

    /// One extraction pass: expand truncated unseen posts, re-snapshot,
    /// then insert every newly seen record.
    async fn run_cycle(&mut self) -> Result<()> {
        let mut html = self
            .timeline
            .snapshot()
            .await
            .context("Failed to snapshot timeline")?;

        let targets = extract::expandable_posts(&html, &self.seen);
        if !targets.is_empty() {
            self.timeline
                .expand_posts(&targets)
                .await
                .context("Failed to expand truncated posts")?;
            html = self
                .timeline
                .snapshot()
                .await
                .context("Failed to snapshot timeline after expansion")?;
        }

        for record in extract::extract_posts(&html) {
            if self.seen.insert(record.id.clone()) {
                self.records.push(record);
            }
        }

        Ok(())
    }

    /// Serve commands that arrived during extraction without blocking.
    fn drain_commands(&self, commands: &mut mpsc::Receiver<Command>, cancel: &CancellationToken) {
        while let Ok(command) = commands.try_recv() {
            match command {
                Command::Start(reply) => {
                    let _ = reply.send(Err(ControlError::AlreadyRunning));
                }
                Command::Stop(reply) => {
                    cancel.cancel();
                    let _ = reply.send(());
                }
                Command::GetStatus(reply) => {
                    let _ = reply.send(self.status(true));
                }
            }
        }
    }

    /// Suspend until the next cycle is due, still serving commands.
    /// Returns `false` when the session should end instead of continuing.
    async fn wait_between_cycles(
        &self,
        commands: &mut mpsc::Receiver<Command>,
        cancel: &CancellationToken,
    ) -> bool {
        let deadline = Instant::now() + self.config.cycle_delay;
        loop {
            tokio::select! {
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep_until(deadline) => return true,
                command = commands.recv() => match command {
                    None => return false,
                    Some(Command::Start(reply)) => {
                        let _ = reply.send(Err(ControlError::AlreadyRunning));
                    }
                    Some(Command::Stop(reply)) => {
                        cancel.cancel();
                        let _ = reply.send(());
                    }
                    Some(Command::GetStatus(reply)) => {
                        let _ = reply.send(self.status(true));
                    }
                },
            }
        }
    }

    /// Export the collected set. `completed` selects whether a successful
    /// export also announces natural completion.
    async fn export_and_notify(&self, events: &mpsc::Sender<Event>, completed: bool) {
        match export::write_csv(&self.records, &self.config.output_dir).await {
            Ok(path) => {
                info!(count = self.records.len(), path = %path.display(), "Export finished");
                if completed {
                    let _ = events
                        .send(Event::Complete {
                            count: self.records.len(),
                        })
                        .await;
                }
            }
            Err(e) => {
                warn!("Export failed: {e}");
                let _ = events
                    .send(Event::Error {
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    }
}
