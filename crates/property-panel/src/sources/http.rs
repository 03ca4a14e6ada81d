use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::ProviderError;

const ERROR_BODY_LIMIT: usize = 200;

pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("property-panel/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Sends a request once and decodes a JSON body, classifying every failure.
pub(crate) async fn fetch_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|source| transport_error(provider, source))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            details: body.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| transport_error(provider, source))?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|err| ProviderError::Malformed {
        provider,
        details: err.to_string(),
    })
}

fn transport_error(provider: &'static str, source: reqwest::Error) -> ProviderError {
    if source.is_timeout() {
        ProviderError::Timeout { provider }
    } else {
        ProviderError::Transport { provider, source }
    }
}

/// Extracts a list of records from either a bare array or one of the wrapper
/// keys providers use.
pub(crate) fn records_from(payload: Value, wrappers: &[&str]) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        Value::Object(mut object) => wrappers
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
