use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::http::{fetch_json, records_from};
use super::{
    PropertyLookup, ProviderError, RecordsGateway, RentalCompsRequest, SaleCompArea,
    SaleCompsGateway, MAX_RENTAL_COMPS,
};
use crate::config::ProviderSettings;

const PROVIDER: &str = "county records provider";
const COMPARABLE_WRAPPERS: &[&str] = &["comparables", "comps", "properties"];
const SEARCH_WRAPPERS: &[&str] = &["properties", "results", "data"];

/// Client for the county-records API. Lookups are keyed by state and street line.
pub struct CountyRecordsClient {
    http: Client,
    settings: ProviderSettings,
}

impl CountyRecordsClient {
    pub fn new(http: Client, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured { provider: PROVIDER })?;
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        Ok(self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, api_key))
    }

    async fn list(
        &self,
        request: RequestBuilder,
        wrappers: &[&str],
    ) -> Result<Vec<Value>, ProviderError> {
        match fetch_json(PROVIDER, request).await {
            Ok(payload) => Ok(records_from(payload, wrappers)),
            Err(err) if err.is_no_data() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

fn optional_params<'a>(pairs: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, &'a str)> {
    pairs
        .iter()
        .filter_map(|(key, value)| value.map(|value| (*key, value)))
        .collect()
}

#[async_trait]
impl RecordsGateway for CountyRecordsClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn property(&self, lookup: &PropertyLookup) -> Result<Option<Value>, ProviderError> {
        let Some(state) = lookup.state.as_deref() else {
            return Ok(None);
        };

        let request = self
            .get("/property/address/")?
            .query(&[("state", state), ("address", lookup.address.as_str())])
            .query(&optional_params(&[
                ("city", lookup.city.as_deref()),
                ("county", lookup.county.as_deref()),
            ]));

        match fetch_json(PROVIDER, request).await {
            Ok(payload) => Ok(unwrap_property(payload)),
            Err(err) if err.is_no_data() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn rental_comps(&self, request: &RentalCompsRequest) -> Result<Vec<Value>, ProviderError> {
        let limit = request.limit.clamp(1, MAX_RENTAL_COMPS).to_string();
        let radius = request.radius_miles.to_string();
        let builder = self
            .get("/premium/rental-comparables/")?
            .query(&[
                ("address", request.address.as_str()),
                ("radius", radius.as_str()),
                ("limit", limit.as_str()),
            ])
            .query(&optional_params(&[("state", request.state.as_deref())]));

        self.list(builder, COMPARABLE_WRAPPERS).await
    }
}

#[async_trait]
impl SaleCompsGateway for CountyRecordsClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn premium_comparables(
        &self,
        area: &SaleCompArea,
        limit: usize,
    ) -> Result<Vec<Value>, ProviderError> {
        let limit = limit.to_string();
        let builder = self
            .get("/premium/comparables/")?
            .query(&[
                ("state", area.state.as_str()),
                ("county", area.county.as_str()),
                ("limit", limit.as_str()),
            ])
            .query(&optional_params(&[("address", area.address.as_deref())]));

        self.list(builder, COMPARABLE_WRAPPERS).await
    }

    async fn search_records(
        &self,
        area: &SaleCompArea,
        limit: usize,
    ) -> Result<Vec<Value>, ProviderError> {
        let limit = limit.to_string();
        let builder = self.get("/property/search/")?.query(&[
            ("state", area.state.as_str()),
            ("county", area.county.as_str()),
            ("limit", limit.as_str()),
        ]);

        self.list(builder, SEARCH_WRAPPERS).await
    }
}

fn unwrap_property(payload: Value) -> Option<Value> {
    match payload {
        Value::Object(mut object) => match object.remove("property") {
            Some(inner @ Value::Object(_)) => Some(inner),
            Some(_) | None if object.is_empty() => None,
            Some(_) | None => Some(Value::Object(object)),
        },
        Value::Array(items) => items.into_iter().find(Value::is_object),
        _ => None,
    }
}
