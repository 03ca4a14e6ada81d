use serde::Serialize;

use crate::panel::coercion::round2;
use crate::panel::comparables::{positive, Comparable};

const MEDIUM_CONFIDENCE_COMPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValuationMethod {
    #[serde(rename = "comps-ppsf")]
    CompsPricePerSqft,
    #[serde(rename = "rent-cap")]
    RentCap,
    #[serde(rename = "insufficient")]
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationResult {
    pub ok: bool,
    pub method: ValuationMethod,
    pub estimated_value: Option<f64>,
    pub comps_used: usize,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_price_per_sqft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValuationResult {
    fn insufficient(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            method: ValuationMethod::Insufficient,
            estimated_value: None,
            comps_used: 0,
            confidence: Confidence::None,
            avg_price_per_sqft: None,
            reason: Some(reason.into()),
        }
    }
}

fn comps_estimate(comps: &[Comparable], subject_sqft: f64) -> Option<ValuationResult> {
    let ratios: Vec<f64> = comps
        .iter()
        .filter_map(|comp| match (positive(comp.price), positive(comp.square_feet)) {
            (Some(price), Some(sqft)) => Some(price / sqft),
            _ => None,
        })
        .collect();
    if ratios.is_empty() {
        return None;
    }

    let avg = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let confidence = if ratios.len() >= MEDIUM_CONFIDENCE_COMPS {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    Some(ValuationResult {
        ok: true,
        method: ValuationMethod::CompsPricePerSqft,
        estimated_value: Some((avg * subject_sqft).round()),
        comps_used: ratios.len(),
        confidence,
        avg_price_per_sqft: Some(round2(avg)),
        reason: None,
    })
}

/// Market value from sale comps when possible, otherwise from rent capitalized
/// at `cap_rate_percent`.
pub fn estimate_value(
    comps: &[Comparable],
    subject_sqft: Option<f64>,
    monthly_rent: Option<f64>,
    cap_rate_percent: f64,
) -> ValuationResult {
    if let Some(result) = positive(subject_sqft).and_then(|sqft| comps_estimate(comps, sqft)) {
        return result;
    }

    match (positive(monthly_rent), positive(Some(cap_rate_percent))) {
        (Some(rent), Some(cap_rate)) => ValuationResult {
            ok: true,
            method: ValuationMethod::RentCap,
            estimated_value: Some((rent * 12.0 / (cap_rate / 100.0)).round()),
            comps_used: 0,
            confidence: Confidence::Low,
            avg_price_per_sqft: None,
            reason: None,
        },
        _ => ValuationResult::insufficient(
            "need subject square footage with priced sale comps, or a rent estimate and cap rate",
        ),
    }
}

/// After-repair value from sale comps only; rent never substitutes.
pub fn after_repair_value(comps: &[Comparable], subject_sqft: Option<f64>) -> ValuationResult {
    let Some(sqft) = positive(subject_sqft) else {
        return ValuationResult::insufficient("subject square footage unavailable");
    };

    comps_estimate(comps, sqft)
        .unwrap_or_else(|| ValuationResult::insufficient("no sale comps with price and square footage"))
}
