//! Cistern UI - interactive time-series dashboard for Cistern collections.
//!
//! This library exposes the core components for testing.

pub mod app;
pub mod backend;
pub mod container;
pub mod location;
pub mod message;
pub mod mock;
pub mod view;

// Re-export commonly used types
pub use app::CisternUi;
pub use container::{ChartContainer, QueryRequest};
pub use location::{History, Location};
pub use message::Message;
