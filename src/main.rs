//! framesink - latest-frame delivery bridge
//!
//! Receives complete RGBA8 frames from a local producer over TCP and
//! presents the most recent one at display refresh cadence. This binary
//! runs the bridge against a software surface; embedders wire in their
//! own `OutputSurface` and refresh clock instead.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use framesink_core::{Config, DEFAULT_PORT};
use framesink_present::{HeadlessSurface, OutputSurface, TimerDriver};
use framesink_server::FrameServer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// framesink - present streamed frames at display refresh cadence
#[derive(Parser, Debug)]
#[command(name = "framesink")]
#[command(version, about, long_about = None)]
struct Args {
    /// TCP port the producer connects to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Surface width in pixels
    #[arg(short = 'W', long, default_value = "1920")]
    width: u32,

    /// Surface height in pixels
    #[arg(short = 'H', long, default_value = "1080")]
    height: u32,

    /// Presentation refresh rate in Hz
    #[arg(short, long, default_value = "60")]
    fps: u32,

    /// Write the first frame of each connection to this directory as PNG
    #[arg(long)]
    snapshot_dir: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("framesink v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::new()
        .with_port(args.port)
        .with_refresh_fps(args.fps);
    if let Some(dir) = args.snapshot_dir {
        config = config.with_snapshot_dir(dir);
    }

    let driver = Arc::new(TimerDriver::new(config.refresh_interval())?);
    let server = FrameServer::new(config, driver);
    server.start()?;

    let surface = Arc::new(HeadlessSurface::new(args.width, args.height));
    server.set_output_surface(Some(surface.clone() as Arc<dyn OutputSurface>));

    info!(
        "Presenting to a {}x{} software surface at {} Hz",
        args.width, args.height, args.fps
    );
    info!("Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await.ok();
    info!("Shutting down...");

    server.set_output_surface(None);
    server.stop();

    info!(
        "Presented {} frames total. Goodbye!",
        surface.present_count()
    );
    Ok(())
}
