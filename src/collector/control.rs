//! Command and event channels for driving the collector.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("already running")]
    AlreadyRunning,
    #[error("collector is no longer running")]
    ChannelClosed,
}

/// Commands accepted by the collector.
#[derive(Debug)]
pub enum Command {
    /// Begin a scrape session. Rejected with [`ControlError::AlreadyRunning`]
    /// when a session is in progress.
    Start(oneshot::Sender<Result<(), ControlError>>),
    /// End the current session (or trigger an export while idle).
    Stop(oneshot::Sender<()>),
    /// Report whether a session is running and the collected count.
    GetStatus(oneshot::Sender<Status>),
}

/// Snapshot of the collector's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub is_running: bool,
    pub count: usize,
}

/// Notifications emitted toward an external observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// Emitted after each scrape cycle.
    Progress { count: usize, status: String },
    /// Emitted after natural completion and a successful export.
    Complete { count: usize },
    /// Emitted on export failure or a fatal timeline condition.
    Error { error: String },
}

/// Create a command channel and a handle for sending on it.
#[must_use]
pub fn control_channel(buffer: usize) -> (ControlHandle, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(buffer);
    (ControlHandle { commands: tx }, rx)
}

/// Cloneable sender wrapping the command channel with request/reply calls.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    commands: mpsc::Sender<Command>,
}

impl ControlHandle {
    /// Ask the collector to begin a session.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::AlreadyRunning`] when a session is already in
    /// progress, or [`ControlError::ChannelClosed`] when the collector is gone.
    pub async fn start(&self) -> Result<(), ControlError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Start(tx))
            .await
            .map_err(|_| ControlError::ChannelClosed)?;
        rx.await.map_err(|_| ControlError::ChannelClosed)?
    }

    /// Ask the collector to end the current session and export.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::ChannelClosed`] when the collector is gone.
    pub async fn stop(&self) -> Result<(), ControlError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Stop(tx))
            .await
            .map_err(|_| ControlError::ChannelClosed)?;
        rx.await.map_err(|_| ControlError::ChannelClosed)
    }

    /// Fetch the collector's current status.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::ChannelClosed`] when the collector is gone.
    pub async fn status(&self) -> Result<Status, ControlError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::GetStatus(tx))
            .await
            .map_err(|_| ControlError::ChannelClosed)?;
        rx.await.map_err(|_| ControlError::ChannelClosed)
    }
}
