use serde::Serialize;
use serde_json::Value;

use super::comparables::positive;
use super::fields::{FieldRule, SUBJECT_PRICE, SUBJECT_RENT, SUBJECT_SQFT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectSource {
    PrimaryProvider,
    CountyProvider,
    CallerOverride,
}

/// Subject facts derived from whichever provider records were found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProperty {
    pub square_feet: Option<f64>,
    pub rent_estimate_monthly: Option<f64>,
    pub purchase_price: Option<f64>,
    pub square_feet_source: Option<SubjectSource>,
    pub rent_estimate_source: Option<SubjectSource>,
    pub purchase_price_source: Option<SubjectSource>,
}

impl SubjectProperty {
    /// Tries the primary record, then the county record; the caller's purchase
    /// price is the last resort for price only.
    pub fn resolve(
        primary: Option<&Value>,
        county: Option<&Value>,
        purchase_price_override: Option<f64>,
    ) -> Self {
        let (square_feet, square_feet_source) = resolve_field(&SUBJECT_SQFT, primary, county);
        let (rent_estimate_monthly, rent_estimate_source) =
            resolve_field(&SUBJECT_RENT, primary, county);
        let (mut purchase_price, mut purchase_price_source) =
            resolve_field(&SUBJECT_PRICE, primary, county);

        if purchase_price.is_none() {
            if let Some(price) = positive(purchase_price_override) {
                purchase_price = Some(price);
                purchase_price_source = Some(SubjectSource::CallerOverride);
            }
        }

        Self {
            square_feet,
            rent_estimate_monthly,
            purchase_price,
            square_feet_source,
            rent_estimate_source,
            purchase_price_source,
        }
    }
}

fn resolve_field(
    rule: &FieldRule,
    primary: Option<&Value>,
    county: Option<&Value>,
) -> (Option<f64>, Option<SubjectSource>) {
    let candidates = [
        (primary, SubjectSource::PrimaryProvider),
        (county, SubjectSource::CountyProvider),
    ];

    candidates
        .into_iter()
        .find_map(|(record, source)| {
            let value = positive(rule.number(record?))?;
            Some((Some(value), Some(source)))
        })
        .unwrap_or((None, None))
}
