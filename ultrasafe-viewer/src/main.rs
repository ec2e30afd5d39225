//! Ultrasafe mask viewer: entry point.
//!
//! ```text
//! ultrasafe-viewer                      Connect with defaults
//! ultrasafe-viewer --config <path>      Use custom config TOML
//! ultrasafe-viewer --endpoint <url>     Override the backend base URL
//! ultrasafe-viewer --snapshot <png>     Write composited overlays to a file
//! ultrasafe-viewer --gen-config         Dump default config and exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use image::RgbaImage;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ultrasafe_core::{PullChannel, WsConnector};

use ultrasafe_viewer::config::ViewerConfig;
use ultrasafe_viewer::status::status_line;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ultrasafe-viewer", about = "Ultrasafe live segmentation-mask viewer")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "ultrasafe-viewer.toml")]
    config: PathBuf,

    /// Backend base URL (overrides config). Example: http://127.0.0.1:8000
    #[arg(short, long)]
    endpoint: Option<String>,

    /// PNG path for composited overlay snapshots (overrides config).
    #[arg(short, long)]
    snapshot: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ViewerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ViewerConfig::load(&cli.config);
    if let Some(base) = cli.endpoint {
        config.network.base_url = base;
    }
    if let Some(path) = cli.snapshot {
        config.output.snapshot_path = path;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("ultrasafe-viewer v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Build the channel ────────────────────────────────────

    let url = config.mask_url()?;
    info!("mask endpoint: {url}");

    let connector = WsConnector::new(url.as_str()).with_connect_timeout(config.connect_timeout());
    let mut channel = PullChannel::new(connector, config.pull_config());
    let mut stats_rx = channel.stats_receiver();
    let shutdown = channel.shutdown_handle();

    // Frames are only copied out of the channel while someone listens.
    let mut snapshots = config.snapshot_writer();
    let mut frame_rx = snapshots.as_ref().map(|writer| {
        info!("writing overlay snapshots to {}", writer.path().display());
        channel.frame_receiver()
    });

    // Ctrl-C handler.
    let stop = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received; shutting down");
        stop.teardown();
    });

    // ── 2. Run the pull loop ────────────────────────────────────

    let client = tokio::spawn(async move { channel.run().await });

    // ── 3. Report status until the channel stops ────────────────

    let mut last_line = String::new();
    loop {
        tokio::select! {
            changed = stats_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let line = status_line(&stats_rx.borrow_and_update());
                if line != last_line {
                    info!("{line}");
                    last_line = line;
                }
            }
            Some(frame) = next_frame(&mut frame_rx) => {
                if let Some(writer) = snapshots.as_mut() {
                    match writer.offer(&frame) {
                        Ok(true) => debug!("snapshot written"),
                        Ok(false) => {}
                        Err(e) => warn!("failed to write snapshot: {e}"),
                    }
                }
            }
        }
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    client.await??;
    if !shutdown.is_torn_down() {
        warn!("mask channel stopped without a teardown request");
    }
    info!("shut down");

    Ok(())
}

/// Next composited frame, or `None` once snapshots are off or the
/// channel has stopped.
async fn next_frame(rx: &mut Option<watch::Receiver<Arc<RgbaImage>>>) -> Option<Arc<RgbaImage>> {
    let rx = rx.as_mut()?;
    rx.changed().await.ok()?;
    Some(rx.borrow_and_update().clone())
}
