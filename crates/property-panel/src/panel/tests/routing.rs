use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::panel::router::build_panel_handler;
use crate::panel::{PanelGateways, PanelRequest, PanelService};

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request builds")
}

#[tokio::test]
async fn handler_rejects_unidentifiable_address() {
    let service = Arc::new(PanelService::new(PanelGateways::default()));

    let response = build_panel_handler(State(service), axum::Json(PanelRequest::default()))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("invalid request"));
}

#[tokio::test]
async fn panel_route_returns_degraded_panel_without_credentials() {
    let router = router_with_gateways(PanelGateways::default());

    let response = router
        .oneshot(json_request(
            "/api/v1/property-panel",
            json!({ "fullAddress": FULL_ADDRESS, "capRatePercent": 6.5 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["avm"]["method"], json!("insufficient"));
    assert_eq!(payload["arv"]["ok"], json!(false));
    assert_eq!(payload["investment"]["ok"], json!(false));
    assert_eq!(payload["inputs"]["options"]["capRatePercent"], json!(6.5));
    assert_eq!(payload["sources"]["primaryProvider"], json!("skipped"));
    assert_eq!(payload["warnings"].as_array().map(Vec::len), Some(6));
    assert!(payload.get("generatedAt").is_some());
}

#[tokio::test]
async fn panel_route_accepts_query_strings() {
    let fixture = Fixture::healthy();
    let router = router_with_gateways(fixture.gateways());

    let response = router
        .oneshot(
            Request::get("/api/v1/property-panel?fullAddress=1200%20Grand%20Ave%2C%20Des%20Moines%2C%20IA%2050309")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["subject"]["squareFeet"], json!(1000.0));
    assert_eq!(payload["saleComps"]["tier"], json!("premium"));
    assert_eq!(payload["avm"]["method"], json!("comps-ppsf"));
    assert_eq!(payload["investment"]["ok"], json!(true));
    assert_eq!(fixture.geocoder.calls(), vec![FULL_ADDRESS.to_string()]);
}

#[tokio::test]
async fn panel_route_rejects_missing_address_with_bad_request() {
    let router = router_with_gateways(Fixture::healthy().gateways());

    let response = router
        .oneshot(json_request(
            "/api/v1/property-panel",
            json!({ "state": "IA" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_provider_payload_maps_to_internal_error() {
    let mut fixture = Fixture::healthy();
    fixture.county = FakeRecords::new("county records provider", Reply::Malformed, Reply::Missing);
    let router = router_with_gateways(fixture.gateways());

    let response = router
        .oneshot(json_request(
            "/api/v1/property-panel",
            json!({ "fullAddress": FULL_ADDRESS }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn rental_comps_route_returns_empty_report_for_missing_data() {
    let mut fixture = Fixture::healthy();
    fixture.county = FakeRecords::new("county records provider", Reply::Missing, Reply::Status(422));
    let router = router_with_gateways(fixture.gateways());

    let response = router
        .oneshot(json_request(
            "/api/v1/rental-comps",
            json!({ "address": FULL_ADDRESS, "state": "IA", "source": "county" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["count"], json!(0));
    assert_eq!(payload["comps"], json!([]));
    assert_eq!(payload["warnings"], json!(["no rental comps found"]));
    assert_eq!(
        fixture.county.rental_requests()[0].state.as_deref(),
        Some("IA")
    );
}

#[tokio::test]
async fn rental_comps_route_surfaces_upstream_failures() {
    let mut fixture = Fixture::healthy();
    fixture.primary = FakeRecords::new("primary records provider", Reply::Missing, Reply::Status(502));
    let router = router_with_gateways(fixture.gateways());

    let response = router
        .oneshot(json_request(
            "/api/v1/rental-comps",
            json!({ "address": FULL_ADDRESS }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["provider"], json!("primary records provider"));
    assert_eq!(payload["providerStatus"], json!(502));
    assert_eq!(payload["details"], json!("upstream said 502"));
}
