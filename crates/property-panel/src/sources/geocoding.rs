use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::http::fetch_json;
use super::{GeocodingGateway, ProviderError};
use crate::config::GeocoderSettings;
use crate::panel::coercion::{to_number, to_text};

const PROVIDER: &str = "geocoder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

/// Best forward-geocoding match for one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub formatted_address: Option<String>,
    pub raw_components: Vec<AddressComponent>,
}

impl GeocodeResult {
    pub fn component(&self, kind: &str) -> Option<&AddressComponent> {
        self.raw_components
            .iter()
            .find(|component| component.types.iter().any(|t| t == kind))
    }

    pub fn city(&self) -> Option<String> {
        ["locality", "postal_town", "sublocality"]
            .iter()
            .find_map(|kind| self.component(kind))
            .map(|component| component.long_name.clone())
    }

    pub fn county(&self) -> Option<String> {
        self.component("administrative_area_level_2").map(|component| {
            let name = component.long_name.trim();
            name.strip_suffix(" County")
                .unwrap_or(name)
                .trim()
                .to_string()
        })
    }

    pub fn state_code(&self) -> Option<String> {
        self.component("administrative_area_level_1")
            .map(|component| component.short_name.clone())
    }
}

pub struct GeocoderClient {
    http: Client,
    settings: GeocoderSettings,
}

impl GeocoderClient {
    pub fn new(http: Client, settings: GeocoderSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait]
impl GeocodingGateway for GeocoderClient {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured { provider: PROVIDER })?;

        let request = self
            .http
            .get(&self.settings.base_url)
            .query(&[("address", address), ("key", api_key)]);
        let payload = fetch_json(PROVIDER, request).await?;
        parse_geocode(&payload)
    }
}

/// Reads the first result of a geocoder payload.
pub(crate) fn parse_geocode(payload: &Value) -> Result<Option<GeocodeResult>, ProviderError> {
    let status = payload
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("OK");
    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        other => {
            let message = payload
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("no details");
            return Err(ProviderError::Rejected {
                provider: PROVIDER,
                reason: format!("{other}: {message}"),
            });
        }
    }

    let Some(best) = payload
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
    else {
        return Ok(None);
    };

    let raw_components: Vec<AddressComponent> = best
        .get("address_components")
        .and_then(Value::as_array)
        .map(|components| components.iter().filter_map(parse_component).collect())
        .unwrap_or_default();

    let location = best.get("geometry").and_then(|geometry| geometry.get("location"));
    let coordinate = |axis: &str| location.and_then(|loc| loc.get(axis)).and_then(to_number);

    let zip = raw_components
        .iter()
        .find(|component| component.types.iter().any(|t| t == "postal_code"))
        .map(|component| component.long_name.clone());

    Ok(Some(GeocodeResult {
        zip,
        latitude: coordinate("lat"),
        longitude: coordinate("lng"),
        formatted_address: best.get("formatted_address").and_then(to_text),
        raw_components,
    }))
}

fn parse_component(raw: &Value) -> Option<AddressComponent> {
    let long_name = raw.get("long_name").and_then(to_text)?;
    let short_name = raw
        .get("short_name")
        .and_then(to_text)
        .unwrap_or_else(|| long_name.clone());
    let types = raw
        .get("types")
        .and_then(Value::as_array)
        .map(|types| {
            types
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Some(AddressComponent {
        long_name,
        short_name,
        types,
    })
}
