use metrics_exporter_prometheus::PrometheusHandle;
use property_panel::config::AppConfig;
use property_panel::error::AppError;
use property_panel::panel::{PanelGateways, PanelService};
use property_panel::sources::build_http_client;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wires the live adapters over one shared HTTP client.
pub(crate) fn build_panel_service(config: &AppConfig) -> Result<Arc<PanelService>, AppError> {
    let providers = &config.providers;
    let http = build_http_client(providers.request_timeout)?;

    for (name, configured) in [
        ("geocoder", providers.geocoder.api_key.is_some()),
        ("primary records provider", providers.primary.is_configured()),
        ("county records provider", providers.county.is_configured()),
    ] {
        if !configured {
            warn!(provider = name, "no credentials configured; lookups will be skipped");
        }
    }
    info!(
        census_year = providers.census.year,
        timeout_secs = providers.request_timeout.as_secs(),
        "upstream adapters configured"
    );

    let gateways = PanelGateways::from_config(providers, http);
    Ok(Arc::new(PanelService::new(gateways)))
}
