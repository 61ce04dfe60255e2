//! devportal-fs entry point.
//!
//! ```bash
//! devportal-fs --upper /home/pi/device-portal/templates layers templates/home
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use devportal_fs::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (RUST_LOG wins when set); stdout carries file data
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("devportal_fs=info,devportal_vfs=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    devportal_fs::run(&cli, &mut stdout).await
}
