//! Upstream adapters for the geocoder, census statistics, and the two property
//! record providers.
//!
//! Every gateway returns `Result<_, ProviderError>`; the orchestrator converts
//! failures into [`SourceOutcome`] warnings at the call site so that no single
//! upstream can abort a panel.

pub mod census;
pub mod county;
pub mod geocoding;
mod http;
pub mod outcome;
pub mod records;
pub mod sale_comps;

use async_trait::async_trait;
use serde_json::Value;

pub use census::{CensusClient, Demographics};
pub use county::CountyRecordsClient;
pub use geocoding::{AddressComponent, GeocodeResult, GeocoderClient};
pub use http::build_http_client;
pub use outcome::{SourceOutcome, SourceStatus};
pub use records::PrimaryRecordsClient;
pub use sale_comps::{SaleCompSearch, SaleCompStage, SaleCompTier};

#[async_trait]
pub trait GeocodingGateway: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, ProviderError>;
}

#[async_trait]
pub trait CensusGateway: Send + Sync {
    /// `zip` must already be a validated five-digit ZCTA.
    async fn demographics(&self, zip: &str) -> Result<Option<Demographics>, ProviderError>;
}

/// Exact-property and rental-comparable lookups shared by both record providers.
#[async_trait]
pub trait RecordsGateway: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Returns the raw provider record, or `None` when the provider has no match.
    async fn property(&self, lookup: &PropertyLookup) -> Result<Option<Value>, ProviderError>;

    /// Returns raw comparables. "No data" statuses (400/404/422) yield an empty list.
    async fn rental_comps(&self, request: &RentalCompsRequest) -> Result<Vec<Value>, ProviderError>;
}

/// Sale-comparable endpoints, used by [`SaleCompSearch`].
#[async_trait]
pub trait SaleCompsGateway: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn premium_comparables(
        &self,
        area: &SaleCompArea,
        limit: usize,
    ) -> Result<Vec<Value>, ProviderError>;

    async fn search_records(
        &self,
        area: &SaleCompArea,
        limit: usize,
    ) -> Result<Vec<Value>, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyLookup {
    pub address: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RentalCompsRequest {
    pub address: String,
    pub state: Option<String>,
    pub radius_miles: f64,
    pub limit: usize,
}

pub const MAX_RENTAL_COMPS: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleCompArea {
    pub state: String,
    pub county: String,
    pub address: Option<String>,
}

/// Failure raised by an upstream adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} is not configured")]
    NotConfigured { provider: &'static str },
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned HTTP {status}: {details}")]
    Status {
        provider: &'static str,
        status: u16,
        details: String,
    },
    #[error("{provider} rejected the request: {reason}")]
    Rejected {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider} returned a malformed payload: {details}")]
    Malformed {
        provider: &'static str,
        details: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured { provider }
            | ProviderError::Timeout { provider }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Status { provider, .. }
            | ProviderError::Rejected { provider, .. }
            | ProviderError::Malformed { provider, .. } => provider,
        }
    }

    /// Status codes the record providers use to mean "no data".
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            ProviderError::Status {
                status: 400 | 404 | 422,
                ..
            }
        )
    }

    /// Malformed payloads are internal faults rather than degradations.
    pub fn is_fault(&self) -> bool {
        matches!(self, ProviderError::Malformed { .. })
    }
}
