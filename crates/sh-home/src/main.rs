//! Smart home status tool
//!
//! Loads the home from a config directory (first argument, default `.`),
//! reports anything skipped while loading and prints a JSON summary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sh_config::HomeConfig;
use sh_home::Home;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let config_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = HomeConfig::load(&config_dir)
        .with_context(|| format!("loading configuration from {}", config_dir.display()))?;

    // RUST_LOG wins over the logger section
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logger.filter_directive())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = config.data_path(&config_dir);
    info!("Loading {} from {}", config.home.name, data_dir.display());

    let (home, report) = Home::load(&data_dir, &config)
        .with_context(|| format!("loading data from {}", data_dir.display()))?;

    if !report.is_clean() {
        warn!(
            "{} line(s) rejected, {} record(s) dropped for unresolved references",
            report.rejected.len(),
            report.unresolved.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&home.summary())?);
    Ok(())
}
