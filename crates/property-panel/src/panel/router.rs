use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use super::domain::{
    AddressQuery, PanelOptions, PanelRequest, PropertyPanel, RentalCompsQuery, RentalCompsReport,
};
use super::service::PanelService;
use crate::error::AppError;

/// Router builder exposing the panel and rental comps endpoints.
pub fn panel_router(service: Arc<PanelService>) -> Router {
    Router::new()
        .route(
            "/api/v1/property-panel",
            get(query_panel_handler).post(build_panel_handler),
        )
        .route("/api/v1/rental-comps", post(rental_comps_handler))
        .with_state(service)
}

pub(crate) async fn build_panel_handler(
    State(service): State<Arc<PanelService>>,
    Json(request): Json<PanelRequest>,
) -> Result<Json<PropertyPanel>, AppError> {
    let panel = service.build_panel(request.query, request.options).await?;
    Ok(Json(panel))
}

/// Address fields only; options take their defaults.
pub(crate) async fn query_panel_handler(
    State(service): State<Arc<PanelService>>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<PropertyPanel>, AppError> {
    let panel = service.build_panel(query, PanelOptions::default()).await?;
    Ok(Json(panel))
}

pub(crate) async fn rental_comps_handler(
    State(service): State<Arc<PanelService>>,
    Json(query): Json<RentalCompsQuery>,
) -> Result<Json<RentalCompsReport>, AppError> {
    let report = service.rental_comps(query).await?;
    Ok(Json(report))
}
