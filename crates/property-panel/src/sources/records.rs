use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http::{fetch_json, records_from};
use super::{PropertyLookup, ProviderError, RecordsGateway, RentalCompsRequest, MAX_RENTAL_COMPS};
use crate::config::ProviderSettings;

const PROVIDER: &str = "primary records provider";
const COMPARABLE_WRAPPERS: &[&str] = &["comparables", "comps", "listings"];

/// Client for the primary property-records API, authenticated with `X-Api-Key`.
pub struct PrimaryRecordsClient {
    http: Client,
    settings: ProviderSettings,
}

impl PrimaryRecordsClient {
    pub fn new(http: Client, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }

    fn get(&self, path: &str) -> Result<reqwest::RequestBuilder, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::NotConfigured { provider: PROVIDER })?;
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        Ok(self.http.get(url).header("X-Api-Key", api_key))
    }
}

#[async_trait]
impl RecordsGateway for PrimaryRecordsClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn property(&self, lookup: &PropertyLookup) -> Result<Option<Value>, ProviderError> {
        let request = self
            .get("/properties")?
            .query(&[("address", lookup.address.as_str())]);

        match fetch_json(PROVIDER, request).await {
            Ok(payload) => Ok(first_record(payload)),
            Err(err) if err.is_no_data() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn rental_comps(&self, request: &RentalCompsRequest) -> Result<Vec<Value>, ProviderError> {
        let limit = request.limit.clamp(1, MAX_RENTAL_COMPS).to_string();
        let radius = request.radius_miles.to_string();
        let request = self.get("/avm/rent/long-term")?.query(&[
            ("address", request.address.as_str()),
            ("maxRadius", radius.as_str()),
            ("compCount", limit.as_str()),
        ]);

        match fetch_json(PROVIDER, request).await {
            Ok(payload) => Ok(records_from(payload, COMPARABLE_WRAPPERS)),
            Err(err) if err.is_no_data() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

/// The property endpoint answers with a list of candidates; the first is the match.
fn first_record(payload: Value) -> Option<Value> {
    match payload {
        Value::Array(items) => items.into_iter().find(Value::is_object),
        Value::Object(object) if !object.is_empty() => Some(Value::Object(object)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_record_prefers_first_object() {
        let payload = json!([{ "id": "a" }, { "id": "b" }]);
        assert_eq!(first_record(payload), Some(json!({ "id": "a" })));
        assert_eq!(first_record(json!([])), None);
        assert_eq!(first_record(json!({})), None);
        assert_eq!(
            first_record(json!({ "squareFootage": 1200 })),
            Some(json!({ "squareFootage": 1200 }))
        );
    }

    #[tokio::test]
    async fn missing_key_is_reported_as_not_configured() {
        let client = PrimaryRecordsClient::new(
            Client::new(),
            ProviderSettings {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_string(),
            },
        );
        let error = client
            .property(&PropertyLookup {
                address: "1 Main St".to_string(),
                ..PropertyLookup::default()
            })
            .await
            .expect_err("no key configured");
        assert!(matches!(error, ProviderError::NotConfigured { .. }));
    }
}
