use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;

use super::coercion::round2;
use super::comparables::{normalize_all, positive, CompKind, Comparable};
use super::domain::{
    clamp_rental_request, AddressQuery, CompSource, PanelInputs, PanelOptions, PropertyPanel,
    RentStats, RentalCompsQuery, RentalCompsReport, ResolvedAddress, SourceSummary,
};
use super::subject::SubjectProperty;
use super::PanelError;
use crate::config::ProvidersConfig;
use crate::sources::census::normalize_zip;
use crate::sources::sale_comps::SaleCompReport;
use crate::sources::{
    CensusClient, CensusGateway, CountyRecordsClient, Demographics, GeocodeResult,
    GeocoderClient, GeocodingGateway, PrimaryRecordsClient, PropertyLookup, ProviderError,
    RecordsGateway, RentalCompsRequest, SaleCompArea, SaleCompSearch, SaleCompsGateway,
    SourceOutcome, SourceStatus,
};
use crate::valuation::{after_repair_value, estimate_value, summarize_investment};

const PRIMARY_LABEL: &str = "primary records provider";
const COUNTY_LABEL: &str = "county records provider";

/// Upstream adapters available to the panel. `None` means the adapter has no
/// credentials and its stage is skipped with a warning.
#[derive(Clone, Default)]
pub struct PanelGateways {
    pub geocoder: Option<Arc<dyn GeocodingGateway>>,
    pub census: Option<Arc<dyn CensusGateway>>,
    pub primary: Option<Arc<dyn RecordsGateway>>,
    pub county: Option<Arc<dyn RecordsGateway>>,
    pub sale_comps: Option<Arc<dyn SaleCompsGateway>>,
}

impl PanelGateways {
    /// Builds live adapters over one shared HTTP client. The census adapter is
    /// always present because the statistics service accepts keyless requests.
    pub fn from_config(config: &ProvidersConfig, http: Client) -> Self {
        let geocoder = config.geocoder.api_key.is_some().then(|| {
            Arc::new(GeocoderClient::new(http.clone(), config.geocoder.clone()))
                as Arc<dyn GeocodingGateway>
        });
        let census: Arc<dyn CensusGateway> =
            Arc::new(CensusClient::new(http.clone(), config.census.clone()));
        let primary = config.primary.is_configured().then(|| {
            Arc::new(PrimaryRecordsClient::new(http.clone(), config.primary.clone()))
                as Arc<dyn RecordsGateway>
        });
        let county = config
            .county
            .is_configured()
            .then(|| Arc::new(CountyRecordsClient::new(http, config.county.clone())));

        Self {
            geocoder,
            census: Some(census),
            primary,
            county: county
                .clone()
                .map(|client| client as Arc<dyn RecordsGateway>),
            sale_comps: county.map(|client| client as Arc<dyn SaleCompsGateway>),
        }
    }
}

/// Stateless coordinator that builds one [`PropertyPanel`] per call.
pub struct PanelService {
    gateways: PanelGateways,
}

impl PanelService {
    pub fn new(gateways: PanelGateways) -> Self {
        Self { gateways }
    }

    pub async fn build_panel(
        &self,
        query: AddressQuery,
        options: PanelOptions,
    ) -> Result<PropertyPanel, PanelError> {
        let query = query.normalized();
        if !query.is_identifiable() {
            return Err(PanelError::InvalidInput(
                "fullAddress, or both state and addressLine1, is required".to_string(),
            ));
        }
        let options = options.normalized();
        let mut warnings = Vec::new();

        let geocoding = self.geocode(query.full_address.as_deref()).await;
        tracing::debug!(status = ?geocoding.status, "geocoding stage finished");
        collect(&mut warnings, &geocoding);

        let zip = geocoding
            .value
            .as_ref()
            .and_then(|result| result.zip.as_deref());
        let demographics = self.enrich(zip).await;
        tracing::debug!(status = ?demographics.status, "census stage finished");
        collect(&mut warnings, &demographics);

        let resolved = derive_address(&query, geocoding.value.as_ref(), &mut warnings);

        let (primary, county) = tokio::join!(
            self.primary_lookup(&resolved),
            self.county_lookup(&resolved)
        );
        let primary = primary?;
        let county = county?;
        tracing::debug!(
            primary = ?primary.status,
            county = ?county.status,
            "property lookups finished"
        );
        collect(&mut warnings, &primary);
        collect(&mut warnings, &county);

        let subject = SubjectProperty::resolve(
            primary.value.as_ref(),
            county.value.as_ref(),
            options.purchase_price_override,
        );

        let sale_comps = self
            .sale_comps(&resolved, options.sale_comp_limit, subject.square_feet)
            .await?;
        collect(&mut warnings, &sale_comps);
        if let Some(report) = &sale_comps.value {
            warnings.extend(report.warnings.iter().cloned());
        }

        let comps: &[Comparable] = sale_comps
            .value
            .as_ref()
            .map(|report| report.comps.as_slice())
            .unwrap_or_default();
        let arv = after_repair_value(comps, subject.square_feet);
        let avm = estimate_value(
            comps,
            subject.square_feet,
            subject.rent_estimate_monthly,
            options.cap_rate_percent,
        );
        let investment = summarize_investment(
            subject.purchase_price,
            subject.rent_estimate_monthly,
            &options.assumptions(),
        );

        tracing::info!(
            address = resolved.full_address.as_deref().unwrap_or_default(),
            warnings = warnings.len(),
            avm = ?avm.method,
            investment_computed = investment.is_computed(),
            "property panel built"
        );

        Ok(PropertyPanel {
            sources: SourceSummary {
                geocoder: geocoding.status,
                census: demographics.status,
                primary_provider: primary.status,
                county_provider: county.status,
                sale_comps: sale_comps.status,
            },
            inputs: PanelInputs {
                query,
                resolved,
                options,
            },
            geocoding: geocoding.value,
            demographics: demographics.value,
            primary_provider_data: primary.value,
            secondary_provider_data: county.value,
            sale_comps: sale_comps.value,
            subject,
            arv,
            avm,
            investment,
            warnings,
            generated_at: Utc::now(),
        })
    }

    pub async fn rental_comps(
        &self,
        query: RentalCompsQuery,
    ) -> Result<RentalCompsReport, PanelError> {
        let address = query.address.trim().to_string();
        if address.is_empty() {
            return Err(PanelError::InvalidInput("address is required".to_string()));
        }
        let (radius_miles, limit) = clamp_rental_request(&query);

        let (gateway, label) = match query.source {
            CompSource::Primary => (self.gateways.primary.as_ref(), PRIMARY_LABEL),
            CompSource::County => (self.gateways.county.as_ref(), COUNTY_LABEL),
        };

        let mut report = RentalCompsReport {
            source: query.source,
            address: address.clone(),
            radius_miles,
            count: 0,
            comps: Vec::new(),
            rent_stats: None,
            warnings: Vec::new(),
        };

        let Some(gateway) = gateway else {
            report
                .warnings
                .push(format!("{label} not configured; no rental comps requested"));
            return Ok(report);
        };

        let request = RentalCompsRequest {
            address,
            state: query
                .state
                .as_deref()
                .map(str::trim)
                .filter(|state| !state.is_empty())
                .map(str::to_string),
            radius_miles,
            limit,
        };

        let raw = match gateway.rental_comps(&request).await {
            Ok(raw) => raw,
            Err(err) if err.is_no_data() => Vec::new(),
            Err(err) => return Err(rental_failure(err)),
        };

        let mut comps = normalize_all(&raw, CompKind::Rental);
        comps.truncate(limit);
        if comps.is_empty() {
            report.warnings.push("no rental comps found".to_string());
        }

        report.count = comps.len();
        report.rent_stats = rent_stats(&comps);
        report.comps = comps;
        tracing::info!(
            provider = gateway.provider(),
            count = report.count,
            "rental comps fetched"
        );
        Ok(report)
    }

    async fn geocode(&self, full_address: Option<&str>) -> SourceOutcome<GeocodeResult> {
        let Some(address) = full_address else {
            return SourceOutcome::skipped("geocoding skipped: fullAddress not provided");
        };
        let Some(geocoder) = &self.gateways.geocoder else {
            return SourceOutcome::skipped("geocoder not configured; geocoding skipped");
        };

        SourceOutcome::absorb(geocoder.geocode(address).await, || {
            format!("geocoder found no match for {address}")
        })
    }

    async fn enrich(&self, zip: Option<&str>) -> SourceOutcome<Demographics> {
        let Some(census) = &self.gateways.census else {
            return SourceOutcome::skipped("census service not configured; demographics skipped");
        };
        let Some(zip) = zip.and_then(normalize_zip) else {
            return SourceOutcome::skipped("demographics skipped: no five-digit ZIP from geocoding");
        };

        SourceOutcome::absorb(census.demographics(&zip).await, || {
            format!("census returned no statistics for ZIP {zip}")
        })
    }

    async fn primary_lookup(
        &self,
        resolved: &ResolvedAddress,
    ) -> Result<SourceOutcome<Value>, PanelError> {
        let Some(gateway) = &self.gateways.primary else {
            return Ok(SourceOutcome::skipped(format!(
                "{PRIMARY_LABEL} not configured; property lookup skipped"
            )));
        };
        let Some(address) = resolved.full_address.clone() else {
            return Ok(SourceOutcome::skipped(format!(
                "{PRIMARY_LABEL} lookup skipped: fullAddress not provided"
            )));
        };

        let lookup = PropertyLookup {
            address,
            ..PropertyLookup::default()
        };
        record_outcome(gateway.as_ref(), &lookup).await
    }

    async fn county_lookup(
        &self,
        resolved: &ResolvedAddress,
    ) -> Result<SourceOutcome<Value>, PanelError> {
        let Some(gateway) = &self.gateways.county else {
            return Ok(SourceOutcome::skipped(format!(
                "{COUNTY_LABEL} not configured; property lookup skipped"
            )));
        };
        let (Some(state), Some(address)) = (&resolved.state, &resolved.address_line1) else {
            return Ok(SourceOutcome::skipped(format!(
                "{COUNTY_LABEL} lookup skipped: state and addressLine1 required"
            )));
        };

        let lookup = PropertyLookup {
            address: address.clone(),
            state: Some(state.clone()),
            city: resolved.city.clone(),
            county: resolved.county.clone(),
        };
        record_outcome(gateway.as_ref(), &lookup).await
    }

    async fn sale_comps(
        &self,
        resolved: &ResolvedAddress,
        limit: usize,
        subject_sqft: Option<f64>,
    ) -> Result<SourceOutcome<SaleCompReport>, PanelError> {
        let Some(gateway) = &self.gateways.sale_comps else {
            return Ok(SourceOutcome::skipped(format!(
                "{COUNTY_LABEL} not configured; sale comps skipped"
            )));
        };
        let (Some(state), Some(county)) = (&resolved.state, &resolved.county) else {
            return Ok(SourceOutcome::skipped(
                "sale comps skipped: state and county required",
            ));
        };

        let area = SaleCompArea {
            state: state.clone(),
            county: county.clone(),
            address: resolved.address_line1.clone(),
        };
        let search = SaleCompSearch::new(gateway.as_ref(), area, limit, subject_sqft);
        let report = search.run().await.map_err(internal)?;
        tracing::debug!(tier = ?report.tier, count = report.count, "sale comp stage finished");

        let status = if report.count > 0 {
            SourceStatus::Ok
        } else {
            SourceStatus::NoData
        };
        Ok(SourceOutcome {
            value: Some(report),
            warning: None,
            status,
        })
    }
}

async fn record_outcome(
    gateway: &dyn RecordsGateway,
    lookup: &PropertyLookup,
) -> Result<SourceOutcome<Value>, PanelError> {
    match gateway.property(lookup).await {
        Err(err) if err.is_fault() => Err(internal(err)),
        result => Ok(SourceOutcome::absorb(result, || {
            format!("{} has no record for {}", gateway.provider(), lookup.address)
        })),
    }
}

fn collect<T>(warnings: &mut Vec<String>, outcome: &SourceOutcome<T>) {
    if let Some(warning) = &outcome.warning {
        warnings.push(warning.clone());
    }
}

/// Fills missing address fields from the full address and the geocoder's
/// components, recording a warning for each derivation.
fn derive_address(
    query: &AddressQuery,
    geocoding: Option<&GeocodeResult>,
    warnings: &mut Vec<String>,
) -> ResolvedAddress {
    let mut resolved = ResolvedAddress {
        full_address: query.full_address.clone(),
        state: query.state.clone(),
        address_line1: query.address_line1.clone(),
        city: query.city.clone(),
        county: query.county.clone(),
        zip: geocoding.and_then(|result| result.zip.clone()),
    };

    if resolved.address_line1.is_none() {
        let first_segment = resolved
            .full_address
            .as_deref()
            .and_then(|full| full.split(',').next())
            .map(str::trim)
            .filter(|segment| !segment.is_empty());
        if let Some(segment) = first_segment {
            warnings.push(format!("addressLine1 derived from fullAddress: {segment}"));
            resolved.address_line1 = Some(segment.to_string());
        }
    }

    let Some(geocoding) = geocoding else {
        return resolved;
    };

    let derivations = [
        ("state", &mut resolved.state, geocoding.state_code()),
        ("county", &mut resolved.county, geocoding.county()),
        ("city", &mut resolved.city, geocoding.city()),
    ];
    for (name, slot, derived) in derivations {
        if slot.is_some() {
            continue;
        }
        if let Some(value) = derived.filter(|value| !value.is_empty()) {
            warnings.push(format!("{name} derived from geocoding: {value}"));
            *slot = Some(value);
        }
    }

    resolved
}

fn internal(err: ProviderError) -> PanelError {
    tracing::error!(provider = err.provider(), error = %err, "malformed provider payload");
    PanelError::Internal(err.to_string())
}

fn rental_failure(err: ProviderError) -> PanelError {
    if err.is_fault() {
        return internal(err);
    }
    tracing::warn!(provider = err.provider(), error = %err, "rental comps request failed");

    let status = match &err {
        ProviderError::Status { status, .. } => Some(*status),
        _ => None,
    };
    let details = match &err {
        ProviderError::Status { details, .. } => details.clone(),
        other => other.to_string(),
    };
    PanelError::Upstream {
        provider: err.provider(),
        status,
        details,
    }
}

fn rent_stats(comps: &[Comparable]) -> Option<RentStats> {
    let mut rents: Vec<f64> = comps
        .iter()
        .filter_map(|comp| positive(comp.price))
        .collect();
    if rents.is_empty() {
        return None;
    }
    rents.sort_by(f64::total_cmp);

    let count = rents.len();
    let median = if count % 2 == 0 {
        (rents[count / 2 - 1] + rents[count / 2]) / 2.0
    } else {
        rents[count / 2]
    };

    Some(RentStats {
        min: rents[0],
        max: rents[count - 1],
        average: round2(rents.iter().sum::<f64>() / count as f64),
        median: round2(median),
    })
}
