//! Property panel aggregation: upstream adapters, field normalization, and the
//! valuation engine behind the consolidated property-panel response.

pub mod config;
pub mod error;
pub mod panel;
pub mod sources;
pub mod telemetry;
pub mod valuation;
