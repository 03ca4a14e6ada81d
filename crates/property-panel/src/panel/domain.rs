use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sources::sale_comps::{SaleCompReport, DEFAULT_SALE_COMP_LIMIT, MAX_SALE_COMP_LIMIT};
use crate::sources::{Demographics, GeocodeResult, SourceStatus, MAX_RENTAL_COMPS};
use crate::valuation::{
    InvestmentAssumptions, InvestmentOutcome, ValuationResult, DEFAULT_CAP_RATE_PERCENT,
    DEFAULT_CLOSING_COST_PERCENT, DEFAULT_DOWN_PAYMENT_PERCENT, DEFAULT_EXPENSE_PERCENT,
    DEFAULT_INTEREST_RATE_PERCENT, DEFAULT_LOAN_YEARS, DEFAULT_VACANCY_PERCENT,
};

use super::comparables::Comparable;
use super::subject::SubjectProperty;

const MAX_LOAN_YEARS: u32 = 50;

/// Identifying fields for a panel request. Requires `fullAddress`, or both
/// `state` and `addressLine1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressQuery {
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

impl AddressQuery {
    pub fn full_address(full_address: impl Into<String>) -> Self {
        Self {
            full_address: Some(full_address.into()),
            ..Self::default()
        }
    }

    /// Trims every field and drops blanks.
    pub fn normalized(&self) -> Self {
        let clean = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Self {
            full_address: clean(&self.full_address),
            state: clean(&self.state),
            address_line1: clean(&self.address_line1),
            city: clean(&self.city),
            county: clean(&self.county),
        }
    }

    pub fn is_identifiable(&self) -> bool {
        self.full_address.is_some() || (self.state.is_some() && self.address_line1.is_some())
    }
}

fn default_cap_rate() -> f64 {
    DEFAULT_CAP_RATE_PERCENT
}

fn default_vacancy() -> f64 {
    DEFAULT_VACANCY_PERCENT
}

fn default_expense() -> f64 {
    DEFAULT_EXPENSE_PERCENT
}

fn default_down_payment() -> f64 {
    DEFAULT_DOWN_PAYMENT_PERCENT
}

fn default_interest_rate() -> f64 {
    DEFAULT_INTEREST_RATE_PERCENT
}

fn default_loan_years() -> u32 {
    DEFAULT_LOAN_YEARS
}

fn default_closing_cost() -> f64 {
    DEFAULT_CLOSING_COST_PERCENT
}

fn default_sale_comp_limit() -> usize {
    DEFAULT_SALE_COMP_LIMIT
}

/// Valuation and financing knobs for one panel request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelOptions {
    #[serde(default = "default_cap_rate")]
    pub cap_rate_percent: f64,
    #[serde(default = "default_vacancy")]
    pub vacancy_percent: f64,
    #[serde(default = "default_expense")]
    pub expense_percent: f64,
    #[serde(default = "default_down_payment")]
    pub down_payment_percent: f64,
    #[serde(default = "default_interest_rate")]
    pub interest_rate_percent: f64,
    #[serde(default = "default_loan_years")]
    pub loan_years: u32,
    #[serde(default = "default_closing_cost")]
    pub closing_cost_percent: f64,
    #[serde(default = "default_sale_comp_limit")]
    pub sale_comp_limit: usize,
    #[serde(default, rename = "purchasePrice", alias = "purchasePriceOverride")]
    pub purchase_price_override: Option<f64>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            cap_rate_percent: DEFAULT_CAP_RATE_PERCENT,
            vacancy_percent: DEFAULT_VACANCY_PERCENT,
            expense_percent: DEFAULT_EXPENSE_PERCENT,
            down_payment_percent: DEFAULT_DOWN_PAYMENT_PERCENT,
            interest_rate_percent: DEFAULT_INTEREST_RATE_PERCENT,
            loan_years: DEFAULT_LOAN_YEARS,
            closing_cost_percent: DEFAULT_CLOSING_COST_PERCENT,
            sale_comp_limit: DEFAULT_SALE_COMP_LIMIT,
            purchase_price_override: None,
        }
    }
}

impl PanelOptions {
    /// Clamps percentages to 0..=100, the term to 0..=50 years, and the sale
    /// comp limit to 1..=20. Non-finite percentages fall back to their defaults.
    pub fn normalized(&self) -> Self {
        let percent = |value: f64, default: f64| {
            if value.is_finite() {
                value.clamp(0.0, 100.0)
            } else {
                default
            }
        };

        Self {
            cap_rate_percent: percent(self.cap_rate_percent, DEFAULT_CAP_RATE_PERCENT),
            vacancy_percent: percent(self.vacancy_percent, DEFAULT_VACANCY_PERCENT),
            expense_percent: percent(self.expense_percent, DEFAULT_EXPENSE_PERCENT),
            down_payment_percent: percent(self.down_payment_percent, DEFAULT_DOWN_PAYMENT_PERCENT),
            interest_rate_percent: percent(
                self.interest_rate_percent,
                DEFAULT_INTEREST_RATE_PERCENT,
            ),
            loan_years: self.loan_years.min(MAX_LOAN_YEARS),
            closing_cost_percent: percent(self.closing_cost_percent, DEFAULT_CLOSING_COST_PERCENT),
            sale_comp_limit: self.sale_comp_limit.clamp(1, MAX_SALE_COMP_LIMIT),
            purchase_price_override: self
                .purchase_price_override
                .filter(|price| price.is_finite() && *price > 0.0),
        }
    }

    pub fn assumptions(&self) -> InvestmentAssumptions {
        InvestmentAssumptions {
            vacancy_percent: self.vacancy_percent,
            expense_percent: self.expense_percent,
            down_payment_percent: self.down_payment_percent,
            interest_rate_percent: self.interest_rate_percent,
            loan_years: self.loan_years,
            closing_cost_percent: self.closing_cost_percent,
        }
    }
}

/// JSON body accepted by the panel endpoint: address fields and options side by side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelRequest {
    #[serde(flatten)]
    pub query: AddressQuery,
    #[serde(flatten)]
    pub options: PanelOptions,
}

/// Address fields after derivation from geocoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAddress {
    pub full_address: Option<String>,
    pub state: Option<String>,
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelInputs {
    pub query: AddressQuery,
    pub resolved: ResolvedAddress,
    pub options: PanelOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub geocoder: SourceStatus,
    pub census: SourceStatus,
    pub primary_provider: SourceStatus,
    pub county_provider: SourceStatus,
    pub sale_comps: SourceStatus,
}

/// Consolidated response for one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPanel {
    pub inputs: PanelInputs,
    pub geocoding: Option<GeocodeResult>,
    pub demographics: Option<Demographics>,
    pub primary_provider_data: Option<Value>,
    pub secondary_provider_data: Option<Value>,
    pub sale_comps: Option<SaleCompReport>,
    pub subject: SubjectProperty,
    pub arv: ValuationResult,
    pub avm: ValuationResult,
    pub investment: InvestmentOutcome,
    pub sources: SourceSummary,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompSource {
    #[default]
    Primary,
    County,
}

fn default_radius() -> f64 {
    3.0
}

fn default_rental_limit() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalCompsQuery {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub source: CompSource,
    #[serde(default = "default_radius")]
    pub radius_miles: f64,
    #[serde(default = "default_rental_limit")]
    pub limit: usize,
}

impl RentalCompsQuery {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: None,
            source: CompSource::Primary,
            radius_miles: default_radius(),
            limit: default_rental_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentStats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalCompsReport {
    pub source: CompSource,
    pub address: String,
    pub radius_miles: f64,
    pub count: usize,
    pub comps: Vec<Comparable>,
    pub rent_stats: Option<RentStats>,
    pub warnings: Vec<String>,
}

pub(crate) fn clamp_rental_request(query: &RentalCompsQuery) -> (f64, usize) {
    let radius = if query.radius_miles.is_finite() {
        query.radius_miles.clamp(1.0, 10.0)
    } else {
        default_radius()
    };
    (radius, query.limit.clamp(1, MAX_RENTAL_COMPS))
}
