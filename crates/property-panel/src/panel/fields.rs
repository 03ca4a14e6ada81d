//! Ranked provider-field tables.
//!
//! Each logical field maps to an ordered list of source paths. A path is either a
//! set of top-level keys or a set of keys inside one nested sub-object. Order is
//! priority: the first present, non-null, non-empty value wins.

use serde_json::Value;

use super::coercion::{to_number, to_text};

#[derive(Debug, Clone, Copy)]
pub struct FieldPath {
    pub section: Option<&'static str>,
    pub keys: &'static [&'static str],
}

const fn top(keys: &'static [&'static str]) -> FieldPath {
    FieldPath {
        section: None,
        keys,
    }
}

const fn nested(section: &'static str, keys: &'static [&'static str]) -> FieldPath {
    FieldPath {
        section: Some(section),
        keys,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub paths: &'static [FieldPath],
}

impl FieldRule {
    pub fn resolve<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        self.paths.iter().find_map(|path| {
            let scope = match path.section {
                Some(section) => record.get(section)?,
                None => record,
            };
            pick_first(scope, path.keys)
        })
    }

    pub fn number(&self, record: &Value) -> Option<f64> {
        self.resolve(record).and_then(to_number)
    }

    pub fn text(&self, record: &Value) -> Option<String> {
        self.resolve(record).and_then(to_text)
    }
}

/// Returns the first direct property of `record` named in `keys` whose value is
/// neither null nor an empty string.
pub fn pick_first<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let object = record.as_object()?;
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(raw) => !raw.is_empty(),
        _ => true,
    }
}

const ADDRESS_KEYS: &[&str] = &[
    "formattedAddress",
    "address",
    "fullAddress",
    "addressLine1",
    "streetAddress",
    "oneLine",
];

const RENT_KEYS: &[&str] = &[
    "listedRent",
    "rent",
    "price",
    "monthlyRent",
    "rentEstimate",
    "listPrice",
    "listingPrice",
    "listRent",
    "rentAmount",
];

const SALE_PRICE_KEYS: &[&str] = &[
    "salePrice",
    "lastSalePrice",
    "soldPrice",
    "closePrice",
    "transferPrice",
    "lastSaleAmount",
    "price",
];

const SQFT_KEYS: &[&str] = &[
    "squareFootage",
    "squareFeet",
    "livingArea",
    "buildingArea",
    "livingAreaSqft",
    "sqft",
    "buildingSize",
];

pub const COMP_ADDRESS: FieldRule = FieldRule {
    name: "address",
    paths: &[
        top(ADDRESS_KEYS),
        nested("property", ADDRESS_KEYS),
        nested("listing", ADDRESS_KEYS),
    ],
};

pub const COMP_RENT: FieldRule = FieldRule {
    name: "rent",
    paths: &[
        top(RENT_KEYS),
        nested("pricing", &["rent", "monthlyRent", "price", "listPrice", "amount"]),
        nested("listing", &["rent", "listedRent", "price", "listPrice"]),
        nested("avm", &["rent", "rentEstimate", "value"]),
    ],
};

pub const COMP_SALE_PRICE: FieldRule = FieldRule {
    name: "price",
    paths: &[
        top(SALE_PRICE_KEYS),
        nested("property", SALE_PRICE_KEYS),
        nested("pricing", &["salePrice", "price", "amount"]),
        nested("avm", &["value", "estimatedValue", "price"]),
    ],
};

pub const COMP_SQFT: FieldRule = FieldRule {
    name: "squareFeet",
    paths: &[
        top(SQFT_KEYS),
        nested("property", SQFT_KEYS),
        nested("features", &["squareFootage", "livingArea", "sqft"]),
        nested("listing", &["squareFootage", "squareFeet"]),
    ],
};

pub const COMP_BEDROOMS: FieldRule = FieldRule {
    name: "bedrooms",
    paths: &[
        top(&["bedrooms", "beds", "bedroomCount", "totalBedrooms"]),
        nested("property", &["bedrooms", "beds", "totalBedrooms"]),
        nested("features", &["bedrooms", "beds"]),
    ],
};

pub const COMP_BATHROOMS: FieldRule = FieldRule {
    name: "bathrooms",
    paths: &[
        top(&["bathrooms", "baths", "bathroomCount", "totalBathrooms"]),
        nested("property", &["bathrooms", "baths", "totalBathrooms"]),
        nested("features", &["bathrooms", "baths"]),
    ],
};

pub const COMP_DISTANCE: FieldRule = FieldRule {
    name: "distance",
    paths: &[top(&["distance", "distanceMiles", "distanceInMiles"])],
};

pub const COMP_SIMILARITY: FieldRule = FieldRule {
    name: "similarityScore",
    paths: &[top(&[
        "correlation",
        "similarity",
        "similarityScore",
        "score",
        "matchScore",
    ])],
};

pub const COMP_PROPERTY_TYPE: FieldRule = FieldRule {
    name: "propertyType",
    paths: &[
        top(&["propertyType", "type", "propertyUseType", "useCode"]),
        nested("property", &["propertyType", "type", "useCode"]),
        nested("features", &["propertyType"]),
    ],
};

pub const COMP_LAST_SEEN: FieldRule = FieldRule {
    name: "lastSeenDate",
    paths: &[
        top(&[
            "lastSeenDate",
            "lastSeen",
            "listedDate",
            "listingDate",
            "removedDate",
        ]),
        nested("listing", &["lastSeenDate", "listedDate"]),
    ],
};

pub const COMP_SOLD_DATE: FieldRule = FieldRule {
    name: "soldDate",
    paths: &[
        top(&[
            "saleDate",
            "lastSaleDate",
            "soldDate",
            "transferDate",
            "recordingDate",
            "closeDate",
        ]),
        nested("property", &["saleDate", "lastSaleDate", "transferDate"]),
    ],
};

pub const SUBJECT_SQFT: FieldRule = FieldRule {
    name: "squareFeet",
    paths: &[
        top(SQFT_KEYS),
        nested("property", SQFT_KEYS),
        nested("features", &["squareFootage", "livingArea", "sqft"]),
        nested("building", &["livingArea", "buildingArea", "squareFeet"]),
    ],
};

pub const SUBJECT_RENT: FieldRule = FieldRule {
    name: "rentEstimate",
    paths: &[
        top(&[
            "rentEstimate",
            "rent",
            "monthlyRent",
            "estimatedRent",
            "rentZestimate",
        ]),
        nested("avm", &["rent", "rentEstimate"]),
        nested("rental", &["rent", "estimate"]),
        nested("pricing", &["rent", "monthlyRent"]),
    ],
};

pub const SUBJECT_PRICE: FieldRule = FieldRule {
    name: "purchasePrice",
    paths: &[
        top(&[
            "price",
            "listPrice",
            "lastSalePrice",
            "salePrice",
            "totalMarketValue",
            "marketValue",
            "estimatedValue",
            "assessedValue",
            "totalAssessedValue",
        ]),
        nested("avm", &["value", "price", "estimatedValue"]),
        nested("valuation", &["marketValue", "value"]),
        nested("assessment", &["marketValue", "assessedValue"]),
    ],
};
