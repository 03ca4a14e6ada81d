use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::http::fetch_json;
use super::{CensusGateway, ProviderError};
use crate::config::CensusSettings;
use crate::panel::coercion::{round2, to_number};

const PROVIDER: &str = "census";
const SOURCE_LABEL: &str = "ACS 5-year estimates";
const GEOGRAPHY: &str = "zip code tabulation area";

const POPULATION: &str = "B01003_001E";
const MEDIAN_HOUSEHOLD_INCOME: &str = "B19013_001E";
const MEDIAN_GROSS_RENT: &str = "B25064_001E";
const MEDIAN_HOME_VALUE: &str = "B25077_001E";
const TOTAL_HOUSING_UNITS: &str = "B25001_001E";
const VACANT_HOUSING_UNITS: &str = "B25002_003E";
const OWNER_OCCUPIED_UNITS: &str = "B25003_002E";
const RENTER_OCCUPIED_UNITS: &str = "B25003_003E";

const VARIABLES: [&str; 8] = [
    POPULATION,
    MEDIAN_HOUSEHOLD_INCOME,
    MEDIAN_GROSS_RENT,
    MEDIAN_HOME_VALUE,
    TOTAL_HOUSING_UNITS,
    VACANT_HOUSING_UNITS,
    OWNER_OCCUPIED_UNITS,
    RENTER_OCCUPIED_UNITS,
];

// Census annotates suppressed estimates with large negative sentinels.
const ANNOTATION_FLOOR: f64 = -100_000_000.0;

static ZIP_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Area statistics for one ZCTA. Each figure is independently optional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub zip: String,
    pub population: Option<f64>,
    pub median_household_income: Option<f64>,
    pub median_gross_rent: Option<f64>,
    pub median_home_value_proxy: Option<f64>,
    pub total_housing_units: Option<f64>,
    pub vacant_housing_units: Option<f64>,
    pub vacancy_rate_percent: Option<f64>,
    pub owner_occupied_units: Option<f64>,
    pub renter_occupied_units: Option<f64>,
    pub owner_occupied_share_percent: Option<f64>,
    pub renter_occupied_share_percent: Option<f64>,
    pub source: String,
    pub year: u16,
}

impl Demographics {
    pub(crate) fn from_table(zip: &str, year: u16, table: &HashMap<String, Value>) -> Self {
        let field = |name: &str| {
            table
                .get(name)
                .and_then(to_number)
                .filter(|value| *value > ANNOTATION_FLOOR)
        };

        let total_housing_units = field(TOTAL_HOUSING_UNITS);
        let vacant_housing_units = field(VACANT_HOUSING_UNITS);
        let owner_occupied_units = field(OWNER_OCCUPIED_UNITS);
        let renter_occupied_units = field(RENTER_OCCUPIED_UNITS);

        let vacancy_rate_percent = match (vacant_housing_units, total_housing_units) {
            (Some(vacant), Some(total)) if total > 0.0 => Some(round2(vacant / total * 100.0)),
            _ => None,
        };

        let (owner_occupied_share_percent, renter_occupied_share_percent) =
            match (owner_occupied_units, renter_occupied_units) {
                (Some(owner), Some(renter)) if owner + renter > 0.0 => {
                    let occupied = owner + renter;
                    (
                        Some(round2(owner / occupied * 100.0)),
                        Some(round2(renter / occupied * 100.0)),
                    )
                }
                _ => (None, None),
            };

        Self {
            zip: zip.to_string(),
            population: field(POPULATION),
            median_household_income: field(MEDIAN_HOUSEHOLD_INCOME),
            median_gross_rent: field(MEDIAN_GROSS_RENT),
            median_home_value_proxy: field(MEDIAN_HOME_VALUE),
            total_housing_units,
            vacant_housing_units,
            vacancy_rate_percent,
            owner_occupied_units,
            renter_occupied_units,
            owner_occupied_share_percent,
            renter_occupied_share_percent,
            source: SOURCE_LABEL.to_string(),
            year,
        }
    }
}

/// Reduces any ZIP-like input to a five-digit ZCTA, or `None` when it does not
/// start with one.
pub fn normalize_zip(raw: &str) -> Option<String> {
    let pattern = ZIP_PATTERN.get_or_init(|| Regex::new(r"^\d{5}$").expect("valid zip pattern"));
    let candidate: String = raw.trim().chars().take(5).collect();
    pattern.is_match(&candidate).then_some(candidate)
}

/// Zips the header row with the first value row.
pub(crate) fn parse_table(payload: &Value) -> Option<HashMap<String, Value>> {
    let rows = payload.as_array()?;
    let headers = rows.first()?.as_array()?;
    let values = rows.get(1)?.as_array()?;

    Some(
        headers
            .iter()
            .zip(values.iter())
            .filter_map(|(header, value)| Some((header.as_str()?.to_string(), value.clone())))
            .collect(),
    )
}

pub struct CensusClient {
    http: Client,
    settings: CensusSettings,
}

impl CensusClient {
    pub fn new(http: Client, settings: CensusSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait]
impl CensusGateway for CensusClient {
    async fn demographics(&self, zip: &str) -> Result<Option<Demographics>, ProviderError> {
        let url = format!(
            "{}/{}/acs/acs5",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.year
        );
        let get = format!("NAME,{}", VARIABLES.join(","));
        let geography = format!("{GEOGRAPHY}:{zip}");

        let mut request = self
            .http
            .get(url)
            .query(&[("get", get.as_str()), ("for", geography.as_str())]);
        if let Some(key) = self.settings.api_key.as_deref() {
            request = request.query(&[("key", key)]);
        }

        let payload = match fetch_json(PROVIDER, request).await {
            Ok(payload) => payload,
            // Census answers unknown ZCTAs with 204 or 404.
            Err(ProviderError::Status { status: 404, .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        Ok(parse_table(&payload)
            .map(|table| Demographics::from_table(zip, self.settings.year, &table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn zip_normalization_truncates_and_validates() {
        assert_eq!(normalize_zip("50309").as_deref(), Some("50309"));
        assert_eq!(normalize_zip(" 50309-1234").as_deref(), Some("50309"));
        assert_eq!(normalize_zip("5030"), None);
        assert_eq!(normalize_zip("ABCDE"), None);
        assert_eq!(normalize_zip(""), None);
    }

    #[test]
    fn vacancy_uses_total_units_and_shares_use_occupied_units() {
        let stats = Demographics::from_table(
            "50309",
            2022,
            &table(&[
                (TOTAL_HOUSING_UNITS, json!("100")),
                (VACANT_HOUSING_UNITS, json!("10")),
                (OWNER_OCCUPIED_UNITS, json!("30")),
                (RENTER_OCCUPIED_UNITS, json!("60")),
            ]),
        );

        assert_eq!(stats.vacancy_rate_percent, Some(10.0));
        assert_eq!(stats.owner_occupied_share_percent, Some(33.33));
        assert_eq!(stats.renter_occupied_share_percent, Some(66.67));
    }

    #[test]
    fn missing_fields_do_not_void_others() {
        let stats = Demographics::from_table(
            "50309",
            2022,
            &table(&[
                (POPULATION, json!("12045")),
                (MEDIAN_GROSS_RENT, json!("-666666666")),
                (MEDIAN_HOUSEHOLD_INCOME, json!("n/a")),
                (VACANT_HOUSING_UNITS, json!("10")),
            ]),
        );

        assert_eq!(stats.population, Some(12045.0));
        assert_eq!(stats.median_gross_rent, None);
        assert_eq!(stats.median_household_income, None);
        assert_eq!(stats.vacant_housing_units, Some(10.0));
        assert_eq!(stats.vacancy_rate_percent, None);
        assert_eq!(stats.owner_occupied_share_percent, None);
        assert_eq!(stats.year, 2022);
    }

    #[test]
    fn parse_table_pairs_headers_with_values() {
        let payload = json!([
            ["NAME", "B01003_001E", "zip code tabulation area"],
            ["ZCTA5 50309", "5123", "50309"]
        ]);
        let parsed = parse_table(&payload).expect("table parses");
        assert_eq!(parsed.get("B01003_001E"), Some(&json!("5123")));
        assert_eq!(parsed.get("zip code tabulation area"), Some(&json!("50309")));

        assert!(parse_table(&json!([["NAME"]])).is_none());
        assert!(parse_table(&json!({ "error": "unknown" })).is_none());
    }
}
