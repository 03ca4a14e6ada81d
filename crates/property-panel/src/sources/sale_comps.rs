//! Two-tier sale-comparable search: the premium comparables endpoint first, then
//! a broad record search filtered and ranked by square-footage proximity.

use serde::Serialize;

use super::{ProviderError, SaleCompArea, SaleCompsGateway};
use crate::panel::comparables::{normalize_all, CompKind, Comparable};

pub const DEFAULT_SALE_COMP_LIMIT: usize = 10;
pub const MAX_SALE_COMP_LIMIT: usize = 20;
const MIN_SEARCH_POOL: usize = 50;
const SEARCH_POOL_MULTIPLIER: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleCompStage {
    Unattempted,
    PremiumTried,
    FallbackTried,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleCompTier {
    Premium,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCompReport {
    pub tier: Option<SaleCompTier>,
    pub count: usize,
    pub comps: Vec<Comparable>,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

pub struct SaleCompSearch<'a> {
    gateway: &'a dyn SaleCompsGateway,
    area: SaleCompArea,
    limit: usize,
    subject_sqft: Option<f64>,
    stage: SaleCompStage,
    warnings: Vec<String>,
}

impl<'a> SaleCompSearch<'a> {
    pub fn new(
        gateway: &'a dyn SaleCompsGateway,
        area: SaleCompArea,
        limit: usize,
        subject_sqft: Option<f64>,
    ) -> Self {
        Self {
            gateway,
            area,
            limit: limit.clamp(1, MAX_SALE_COMP_LIMIT),
            subject_sqft: subject_sqft.filter(|sqft| *sqft > 0.0),
            stage: SaleCompStage::Unattempted,
            warnings: Vec::new(),
        }
    }

    pub fn stage(&self) -> SaleCompStage {
        self.stage
    }

    /// Runs both tiers as needed. Only malformed fallback payloads are returned
    /// as errors; every other failure becomes a warning on the report.
    pub async fn run(mut self) -> Result<SaleCompReport, ProviderError> {
        if let Some(comps) = self.premium_tier().await {
            return Ok(self.resolve(SaleCompTier::Premium, comps));
        }

        let comps = self.fallback_tier().await?;
        if comps.is_empty() {
            self.warnings.push(format!(
                "no sale comps found for {} County, {}",
                self.area.county, self.area.state
            ));
        }
        Ok(self.resolve(SaleCompTier::Fallback, comps))
    }

    /// Returns premium comps when at least one carries a price or an area.
    pub async fn premium_tier(&mut self) -> Option<Vec<Comparable>> {
        let result = self
            .gateway
            .premium_comparables(&self.area, self.limit)
            .await;
        self.stage = SaleCompStage::PremiumTried;

        match result {
            Ok(raw) => {
                let comps = normalize_all(&raw, CompKind::Sale);
                if comps.iter().any(Comparable::has_price_or_area) {
                    Some(comps.into_iter().take(self.limit).collect())
                } else {
                    tracing::debug!(
                        returned = comps.len(),
                        "premium sale comps unusable, falling back to record search"
                    );
                    None
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "premium sale comps failed, falling back to record search");
                self.warnings
                    .push(format!("premium sale comps unavailable: {err}"));
                None
            }
        }
    }

    pub async fn fallback_tier(&mut self) -> Result<Vec<Comparable>, ProviderError> {
        let pool = (self.limit * SEARCH_POOL_MULTIPLIER).max(MIN_SEARCH_POOL);
        let result = self.gateway.search_records(&self.area, pool).await;
        self.stage = SaleCompStage::FallbackTried;

        match result {
            Ok(raw) => {
                let priced: Vec<Comparable> = normalize_all(&raw, CompKind::Sale)
                    .into_iter()
                    .filter(Comparable::is_priced)
                    .collect();
                Ok(rank_by_area(priced, self.subject_sqft, self.limit))
            }
            Err(err) if err.is_fault() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "sale comp record search failed");
                self.warnings.push(format!("sale comp search failed: {err}"));
                Ok(Vec::new())
            }
        }
    }

    fn resolve(mut self, tier: SaleCompTier, comps: Vec<Comparable>) -> SaleCompReport {
        self.stage = SaleCompStage::Resolved;
        SaleCompReport {
            tier: Some(tier),
            count: comps.len(),
            comps,
            warnings: self.warnings,
        }
    }
}

/// Orders comps by absolute area distance from the subject (stable on ties) and
/// keeps `limit`. Without a subject area the input order is kept.
pub fn rank_by_area(
    mut comps: Vec<Comparable>,
    subject_sqft: Option<f64>,
    limit: usize,
) -> Vec<Comparable> {
    if let Some(subject) = subject_sqft.filter(|sqft| *sqft > 0.0) {
        let distance = |comp: &Comparable| {
            comp.square_feet
                .map(|sqft| (sqft - subject).abs())
                .unwrap_or(f64::INFINITY)
        };
        comps.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
    }
    comps.truncate(limit);
    comps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::comparables::normalize_comparable;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn comp(address: &str, price: f64, sqft: f64) -> Comparable {
        normalize_comparable(
            &json!({ "address": address, "salePrice": price, "squareFeet": sqft }),
            CompKind::Sale,
        )
    }

    fn area() -> SaleCompArea {
        SaleCompArea {
            state: "IA".to_string(),
            county: "Polk".to_string(),
            address: None,
        }
    }

    struct FakeSaleGateway {
        premium: Result<Vec<Value>, u16>,
        search: Result<Vec<Value>, u16>,
        search_limits: Mutex<Vec<usize>>,
    }

    impl FakeSaleGateway {
        fn new(premium: Result<Vec<Value>, u16>, search: Result<Vec<Value>, u16>) -> Self {
            Self {
                premium,
                search,
                search_limits: Mutex::new(Vec::new()),
            }
        }
    }

    fn status(code: u16) -> ProviderError {
        ProviderError::Status {
            provider: "fake",
            status: code,
            details: "boom".to_string(),
        }
    }

    #[async_trait]
    impl SaleCompsGateway for FakeSaleGateway {
        fn provider(&self) -> &'static str {
            "fake"
        }

        async fn premium_comparables(
            &self,
            _area: &SaleCompArea,
            _limit: usize,
        ) -> Result<Vec<Value>, ProviderError> {
            self.premium.clone().map_err(status)
        }

        async fn search_records(
            &self,
            _area: &SaleCompArea,
            limit: usize,
        ) -> Result<Vec<Value>, ProviderError> {
            self.search_limits.lock().expect("limits mutex").push(limit);
            self.search.clone().map_err(status)
        }
    }

    #[test]
    fn ranking_orders_by_area_distance_with_stable_ties() {
        let comps = vec![
            comp("a", 100.0, 1500.0),
            comp("b", 100.0, 1100.0),
            comp("c", 100.0, 900.0),
            comp("d", 100.0, 1000.0),
            comp("e", 100.0, 2000.0),
            comp("f", 100.0, 950.0),
            comp("g", 100.0, 1050.0),
            comp("h", 100.0, 700.0),
            comp("i", 100.0, 1300.0),
            comp("j", 100.0, 1010.0),
        ];

        let ranked = rank_by_area(comps, Some(1000.0), 6);
        let order: Vec<&str> = ranked.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(order, vec!["d", "j", "f", "g", "b", "c"]);
    }

    #[test]
    fn ranking_without_subject_keeps_order() {
        let comps = vec![comp("a", 1.0, 3000.0), comp("b", 1.0, 10.0), comp("c", 1.0, 5.0)];
        let ranked = rank_by_area(comps, None, 2);
        let order: Vec<&str> = ranked.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn premium_results_resolve_without_fallback() {
        let gateway = FakeSaleGateway::new(
            Ok(vec![json!({ "salePrice": 200000, "squareFeet": 1000 })]),
            Ok(Vec::new()),
        );
        let report = SaleCompSearch::new(&gateway, area(), 10, Some(1000.0))
            .run()
            .await
            .expect("search succeeds");

        assert_eq!(report.tier, Some(SaleCompTier::Premium));
        assert_eq!(report.count, 1);
        assert!(gateway.search_limits.lock().expect("limits").is_empty());
    }

    #[tokio::test]
    async fn unusable_premium_comps_trigger_fallback() {
        let gateway = FakeSaleGateway::new(
            Ok(vec![json!({ "address": "no data" })]),
            Ok(vec![
                json!({ "address": "far", "salePrice": 300000, "squareFeet": 2400 }),
                json!({ "address": "unpriced", "squareFeet": 1000 }),
                json!({ "address": "near", "salePrice": 210000, "squareFeet": 1050 }),
            ]),
        );
        let mut search = SaleCompSearch::new(&gateway, area(), 4, Some(1000.0));
        assert_eq!(search.stage(), SaleCompStage::Unattempted);

        assert!(search.premium_tier().await.is_none());
        assert_eq!(search.stage(), SaleCompStage::PremiumTried);

        let comps = search.fallback_tier().await.expect("fallback succeeds");
        assert_eq!(search.stage(), SaleCompStage::FallbackTried);
        let order: Vec<&str> = comps.iter().map(|c| c.address.as_str()).collect();
        assert_eq!(order, vec!["near", "far"]);
        assert_eq!(*gateway.search_limits.lock().expect("limits"), vec![50]);
    }

    #[tokio::test]
    async fn premium_errors_fall_back_with_warning() {
        let gateway = FakeSaleGateway::new(
            Err(500),
            Ok(vec![json!({ "salePrice": 250000, "squareFeet": 1250 })]),
        );
        let report = SaleCompSearch::new(&gateway, area(), 20, None)
            .run()
            .await
            .expect("search succeeds");

        assert_eq!(report.tier, Some(SaleCompTier::Fallback));
        assert_eq!(report.count, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("HTTP 500"));
        assert_eq!(*gateway.search_limits.lock().expect("limits"), vec![100]);
    }

    #[tokio::test]
    async fn failing_fallback_yields_empty_report() {
        let gateway = FakeSaleGateway::new(Ok(Vec::new()), Err(503));
        let report = SaleCompSearch::new(&gateway, area(), 10, Some(900.0))
            .run()
            .await
            .expect("degrades instead of failing");

        assert_eq!(report.count, 0);
        assert!(report.comps.is_empty());
        assert_eq!(report.warnings.len(), 2);
    }
}
