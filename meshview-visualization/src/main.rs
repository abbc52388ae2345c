use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use meshview_visualization::{InteractiveViewer, ViewerConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ViewerConfig::parse();
    config.validate().context("invalid configuration")?;
    info!("Starting meshview");

    InteractiveViewer::new(config).run()?;
    Ok(())
}
