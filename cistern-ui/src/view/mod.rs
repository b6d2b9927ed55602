//! View components for the Cistern dashboard.

pub mod chart;
pub mod color;
pub mod dashboard;
pub mod formatting;
pub mod query_form;
pub mod tables;
