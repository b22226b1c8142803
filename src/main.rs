use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookmark_exporter::collector::{control_channel, Collector, ControlHandle, Event};
use bookmark_exporter::config::Config;
use bookmark_exporter::page::BrowserTimeline;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting bookmark-exporter");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(timeline_url = %config.timeline_url, output_dir = %config.output_dir.display(), "Configuration loaded");

    let timeline = BrowserTimeline::connect(&config)
        .await
        .context("Failed to open the timeline page")?;

    let (handle, commands) = control_channel(16);
    let (events_tx, events_rx) = mpsc::channel(64);

    let collector = Collector::new(timeline, (&config).into());
    let collector_task = tokio::spawn(collector.run(commands, events_tx));

    handle
        .start()
        .await
        .context("Failed to start the scrape session")?;

    observe(handle, events_rx).await;

    // Dropping the handle above closed the command channel; the collector
    // finishes its export before exiting.
    collector_task.await.context("Collector task panicked")?;

    info!("Done");
    Ok(())
}

/// Log progress until the session ends, translating Ctrl+C into a stop
/// command so the export still runs.
async fn observe(handle: ControlHandle, mut events: mpsc::Receiver<Event>) {
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!("Failed to listen for Ctrl+C: {e}");
                }
                info!("Interrupt received, stopping and exporting");
                if let Err(e) = handle.stop().await {
                    error!("Failed to stop collector: {e}");
                }
                break;
            }
            event = events.recv() => match event {
                None => break,
                Some(Event::Progress { count, status }) => {
                    info!(count, %status, "Progress");
                }
                Some(Event::Complete { count }) => {
                    info!(count, "Collection complete");
                    break;
                }
                Some(Event::Error { error }) => {
                    error!(%error, "Collector reported an error");
                    break;
                }
            },
        }
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bookmark_exporter=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
