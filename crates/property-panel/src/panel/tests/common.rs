use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Value};

use crate::panel::{panel_router, PanelGateways, PanelService};
use crate::sources::geocoding::AddressComponent;
use crate::sources::{
    CensusGateway, Demographics, GeocodeResult, GeocodingGateway, PropertyLookup, ProviderError,
    RecordsGateway, RentalCompsRequest, SaleCompArea, SaleCompsGateway,
};

pub(super) const FULL_ADDRESS: &str = "1200 Grand Ave, Des Moines, IA 50309";

/// Canned upstream behavior for one fake call.
#[derive(Debug, Clone)]
pub(super) enum Reply<T> {
    Found(T),
    Missing,
    Status(u16),
    Timeout,
    Malformed,
}

impl<T: Clone> Reply<T> {
    fn resolve(&self, provider: &'static str) -> Result<Option<T>, ProviderError> {
        match self {
            Reply::Found(value) => Ok(Some(value.clone())),
            Reply::Missing => Ok(None),
            Reply::Status(status) => Err(ProviderError::Status {
                provider,
                status: *status,
                details: format!("upstream said {status}"),
            }),
            Reply::Timeout => Err(ProviderError::Timeout { provider }),
            Reply::Malformed => Err(ProviderError::Malformed {
                provider,
                details: "expected a JSON object".to_string(),
            }),
        }
    }
}

pub(super) struct FakeGeocoder {
    reply: Reply<GeocodeResult>,
    calls: Mutex<Vec<String>>,
}

impl FakeGeocoder {
    pub(super) fn new(reply: Reply<GeocodeResult>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl GeocodingGateway for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, ProviderError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(address.to_string());
        self.reply.resolve("geocoder")
    }
}

pub(super) struct FakeCensus {
    reply: Reply<Demographics>,
    calls: Mutex<Vec<String>>,
}

impl FakeCensus {
    pub(super) fn new(reply: Reply<Demographics>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl CensusGateway for FakeCensus {
    async fn demographics(&self, zip: &str) -> Result<Option<Demographics>, ProviderError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(zip.to_string());
        self.reply.resolve("census")
    }
}

pub(super) struct FakeRecords {
    provider: &'static str,
    property: Reply<Value>,
    rentals: Reply<Vec<Value>>,
    lookups: Mutex<Vec<PropertyLookup>>,
    rental_requests: Mutex<Vec<RentalCompsRequest>>,
}

impl FakeRecords {
    pub(super) fn new(
        provider: &'static str,
        property: Reply<Value>,
        rentals: Reply<Vec<Value>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            property,
            rentals,
            lookups: Mutex::new(Vec::new()),
            rental_requests: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn lookups(&self) -> Vec<PropertyLookup> {
        self.lookups.lock().expect("lookups mutex poisoned").clone()
    }

    pub(super) fn rental_requests(&self) -> Vec<RentalCompsRequest> {
        self.rental_requests
            .lock()
            .expect("requests mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl RecordsGateway for FakeRecords {
    fn provider(&self) -> &'static str {
        self.provider
    }

    async fn property(&self, lookup: &PropertyLookup) -> Result<Option<Value>, ProviderError> {
        self.lookups
            .lock()
            .expect("lookups mutex poisoned")
            .push(lookup.clone());
        self.property.resolve(self.provider)
    }

    async fn rental_comps(&self, request: &RentalCompsRequest) -> Result<Vec<Value>, ProviderError> {
        self.rental_requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request.clone());
        self.rentals
            .resolve(self.provider)
            .map(Option::unwrap_or_default)
    }
}

pub(super) struct FakeSales {
    premium: Reply<Vec<Value>>,
    search: Reply<Vec<Value>>,
    areas: Mutex<Vec<SaleCompArea>>,
}

impl FakeSales {
    pub(super) fn new(premium: Reply<Vec<Value>>, search: Reply<Vec<Value>>) -> Arc<Self> {
        Arc::new(Self {
            premium,
            search,
            areas: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn areas(&self) -> Vec<SaleCompArea> {
        self.areas.lock().expect("areas mutex poisoned").clone()
    }
}

#[async_trait]
impl SaleCompsGateway for FakeSales {
    fn provider(&self) -> &'static str {
        "county records provider"
    }

    async fn premium_comparables(
        &self,
        area: &SaleCompArea,
        _limit: usize,
    ) -> Result<Vec<Value>, ProviderError> {
        self.areas
            .lock()
            .expect("areas mutex poisoned")
            .push(area.clone());
        self.premium
            .resolve("county records provider")
            .map(Option::unwrap_or_default)
    }

    async fn search_records(
        &self,
        _area: &SaleCompArea,
        _limit: usize,
    ) -> Result<Vec<Value>, ProviderError> {
        self.search
            .resolve("county records provider")
            .map(Option::unwrap_or_default)
    }
}

fn component(long_name: &str, short_name: &str, kind: &str) -> AddressComponent {
    AddressComponent {
        long_name: long_name.to_string(),
        short_name: short_name.to_string(),
        types: vec![kind.to_string(), "political".to_string()],
    }
}

pub(super) fn geocode_result() -> GeocodeResult {
    GeocodeResult {
        zip: Some("50309".to_string()),
        latitude: Some(41.5868),
        longitude: Some(-93.6250),
        formatted_address: Some("1200 Grand Ave, Des Moines, IA 50309, USA".to_string()),
        raw_components: vec![
            component("1200", "1200", "street_number"),
            component("Des Moines", "Des Moines", "locality"),
            component("Polk County", "Polk County", "administrative_area_level_2"),
            component("Iowa", "IA", "administrative_area_level_1"),
            component("50309", "50309", "postal_code"),
        ],
    }
}

pub(super) fn demographics() -> Demographics {
    let table: HashMap<String, Value> = [
        ("B01003_001E", json!("8123")),
        ("B19013_001E", json!("61250")),
        ("B25001_001E", json!("100")),
        ("B25002_003E", json!("10")),
        ("B25003_002E", json!("30")),
        ("B25003_003E", json!("60")),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();
    Demographics::from_table("50309", 2022, &table)
}

/// `count` sale comps priced at $100 per square foot.
pub(super) fn priced_sales(count: usize) -> Vec<Value> {
    (0..count)
        .map(|index| {
            let sqft = 900 + index * 50;
            json!({
                "address": format!("{} Walnut St", 100 + index),
                "salePrice": sqft * 100,
                "squareFeet": sqft,
                "saleDate": "2024-04-01",
            })
        })
        .collect()
}

pub(super) fn rentals(rents: &[f64]) -> Vec<Value> {
    rents
        .iter()
        .enumerate()
        .map(|(index, rent)| {
            json!({
                "formattedAddress": format!("{} Locust St, Des Moines, IA", 300 + index),
                "price": rent,
                "squareFootage": 950,
                "bedrooms": 2,
                "distance": 0.4,
            })
        })
        .collect()
}

/// Every adapter wired to a well-behaved fake.
pub(super) struct Fixture {
    pub(super) geocoder: Arc<FakeGeocoder>,
    pub(super) census: Arc<FakeCensus>,
    pub(super) primary: Arc<FakeRecords>,
    pub(super) county: Arc<FakeRecords>,
    pub(super) sales: Arc<FakeSales>,
}

impl Fixture {
    pub(super) fn healthy() -> Self {
        Self {
            geocoder: FakeGeocoder::new(Reply::Found(geocode_result())),
            census: FakeCensus::new(Reply::Found(demographics())),
            primary: FakeRecords::new(
                "primary records provider",
                Reply::Found(json!({ "squareFootage": 1000, "rentEstimate": 2000 })),
                Reply::Found(rentals(&[1500.0, 1700.0, 1600.0, 1800.0])),
            ),
            county: FakeRecords::new(
                "county records provider",
                Reply::Found(json!({ "totalMarketValue": "$200,000", "county": "Polk" })),
                Reply::Missing,
            ),
            sales: FakeSales::new(Reply::Found(priced_sales(5)), Reply::Missing),
        }
    }

    pub(super) fn gateways(&self) -> PanelGateways {
        PanelGateways {
            geocoder: Some(self.geocoder.clone()),
            census: Some(self.census.clone()),
            primary: Some(self.primary.clone()),
            county: Some(self.county.clone()),
            sale_comps: Some(self.sales.clone()),
        }
    }

    pub(super) fn service(&self) -> PanelService {
        PanelService::new(self.gateways())
    }
}

pub(super) fn router_with_gateways(gateways: PanelGateways) -> axum::Router {
    panel_router(Arc::new(PanelService::new(gateways)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
