//! The property panel: input validation, stage orchestration over the upstream
//! gateways, subject resolution, and the HTTP router that exposes it.

pub mod coercion;
pub mod comparables;
pub mod domain;
pub mod fields;
pub mod router;
pub mod service;
pub mod subject;

#[cfg(test)]
mod tests;

pub use comparables::{CompKind, Comparable};
pub use domain::{
    AddressQuery, CompSource, PanelInputs, PanelOptions, PanelRequest, PropertyPanel,
    RentStats, RentalCompsQuery, RentalCompsReport, ResolvedAddress, SourceSummary,
};
pub use router::panel_router;
pub use service::{PanelGateways, PanelService};
pub use subject::{SubjectProperty, SubjectSource};

/// Request-level failures. Upstream degradation is not an error here; it is
/// reported through panel warnings instead.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("invalid request: {0}")]
    InvalidInput(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("{provider} request failed: {details}")]
    Upstream {
        provider: &'static str,
        status: Option<u16>,
        details: String,
    },
}
