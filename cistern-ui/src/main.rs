//! Cistern UI - interactive time-series dashboard for Cistern collections.
//!
//! Queries a collection on a Cistern API server (or the built-in demo
//! backend) and renders one chart per requested metric.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use iced::application;

use cistern_common::{DashboardConfig, default_config_path, init_tracing, load_config};
use cistern_ui::app::CisternUi;
use cistern_ui::backend::{Backend, QueryClient};
use cistern_ui::location::Location;
use cistern_ui::mock::DemoBackend;

/// Interactive dashboard for Cistern collections.
#[derive(Parser, Debug)]
#[command(name = "cistern-ui")]
#[command(about = "Chart Cistern collection queries", long_about = None)]
struct Args {
    /// Path to the configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the Cistern API server, overriding the config file.
    #[arg(short, long)]
    backend: Option<String>,

    /// Serve generated data instead of querying a server.
    #[arg(long)]
    demo: bool,

    /// Initial location: a full URL or a query string such as
    /// `collection=web&query=avg(cpu)`.
    location: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load(&args)?;
    init_tracing(&config.logging).context("Failed to initialize tracing")?;

    let location = match &args.location {
        Some(raw) => Location::parse(raw).with_context(|| format!("Invalid location {raw:?}"))?,
        None => Location::default(),
    };

    let backend = if args.demo {
        Backend::Demo(DemoBackend::default())
    } else {
        let mut backend_config = config.backend.clone();
        if let Some(url) = &args.backend {
            backend_config.url = url.clone();
        }
        Backend::Http(QueryClient::new(&backend_config).context("Failed to create query client")?)
    };

    tracing::info!(
        config = ?args.config,
        backend = %backend.describe(),
        location = %location,
        "Starting cistern-ui"
    );

    let chart = config.chart.clone();
    application(
        move || CisternUi::boot(backend.clone(), chart.clone(), location.clone()),
        CisternUi::update,
        CisternUi::view,
    )
    .title(CisternUi::title)
    .theme(CisternUi::theme)
    .run()
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}

/// Load the explicit config file, else the default one if present.
fn load(args: &Args) -> Result<DashboardConfig> {
    if let Some(path) = &args.config {
        return load_config(path).with_context(|| format!("Failed to load config from {:?}", path));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        _ => Ok(DashboardConfig::default()),
    }
}
