//! Cistern Common Library
//!
//! This crate provides shared types and utilities for the Cistern dashboard:
//!
//! - [`query`] - Wire model of the collection query API (`QueryResponse`, `Row`)
//! - [`instant`] - Typed parsing and ISO-8601 formatting of instants
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod instant;
pub mod query;

// Re-export commonly used types at the crate root
pub use config::{
    BackendConfig, ChartConfig, DashboardConfig, LogFormat, LoggingConfig, default_config_path,
    load_config, parse_config,
};
pub use error::{Error, Result};
pub use instant::{ParsedInstant, format_instant};
pub use query::{
    ColumnDesc, EVENT_ID_COLUMN, GROUP_ID_COLUMN, QueryDesc, QueryResponse, Row, TIMESTAMP_COLUMN,
    TimeRange, is_synthetic_key, row_group_id, row_number, row_timestamp,
};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
