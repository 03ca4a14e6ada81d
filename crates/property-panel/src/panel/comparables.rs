use serde::Serialize;
use serde_json::Value;

use super::coercion::round2;
use super::fields::{self, FieldRule};

/// Whether a comparable describes a rental listing or a closed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompKind {
    Rental,
    Sale,
}

impl CompKind {
    fn price_rule(self) -> &'static FieldRule {
        match self {
            CompKind::Rental => &fields::COMP_RENT,
            CompKind::Sale => &fields::COMP_SALE_PRICE,
        }
    }

    fn date_rule(self) -> &'static FieldRule {
        match self {
            CompKind::Rental => &fields::COMP_LAST_SEEN,
            CompKind::Sale => &fields::COMP_SOLD_DATE,
        }
    }
}

/// Provider-independent comparable. `price` is the monthly rent for rental comps
/// and the sale price for sale comps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparable {
    pub kind: CompKind,
    pub address: String,
    pub price: Option<f64>,
    pub square_feet: Option<f64>,
    pub price_per_square_foot: Option<f64>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub distance: Option<f64>,
    pub similarity_score: Option<f64>,
    pub property_type: Option<String>,
    pub last_seen_or_sold_date: Option<String>,
}

impl Comparable {
    /// Both price and square footage are present and positive.
    pub fn is_priced(&self) -> bool {
        positive(self.price).is_some() && positive(self.square_feet).is_some()
    }

    pub fn has_price_or_area(&self) -> bool {
        self.price.is_some() || self.square_feet.is_some()
    }
}

pub fn normalize_comparable(raw: &Value, kind: CompKind) -> Comparable {
    let price = kind.price_rule().number(raw);
    let square_feet = fields::COMP_SQFT.number(raw);

    Comparable {
        kind,
        address: fields::COMP_ADDRESS.text(raw).unwrap_or_default(),
        price,
        square_feet,
        price_per_square_foot: price_per_square_foot(price, square_feet),
        bedrooms: fields::COMP_BEDROOMS.number(raw),
        bathrooms: fields::COMP_BATHROOMS.number(raw),
        distance: fields::COMP_DISTANCE.number(raw),
        similarity_score: fields::COMP_SIMILARITY.number(raw),
        property_type: fields::COMP_PROPERTY_TYPE.text(raw),
        last_seen_or_sold_date: kind.date_rule().text(raw),
    }
}

pub fn normalize_all(raw: &[Value], kind: CompKind) -> Vec<Comparable> {
    raw.iter()
        .map(|item| normalize_comparable(item, kind))
        .collect()
}

fn price_per_square_foot(price: Option<f64>, square_feet: Option<f64>) -> Option<f64> {
    match (positive(price), positive(square_feet)) {
        (Some(price), Some(sqft)) => Some(round2(price / sqft)),
        _ => None,
    }
}

pub(crate) fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}
