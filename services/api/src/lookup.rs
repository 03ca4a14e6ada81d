use crate::infra::build_panel_service;
use clap::Args;
use property_panel::config::AppConfig;
use property_panel::error::AppError;
use property_panel::panel::{AddressQuery, PanelOptions};
use property_panel::telemetry;

#[derive(Args, Debug, Default)]
pub(crate) struct PanelArgs {
    /// Full one-line address, e.g. "1200 Grand Ave, Des Moines, IA 50309"
    #[arg(long)]
    pub(crate) full_address: String,
    /// Two-letter state code (derived from geocoding when omitted)
    #[arg(long)]
    pub(crate) state: Option<String>,
    /// Street line (defaults to the first segment of the full address)
    #[arg(long)]
    pub(crate) address_line1: Option<String>,
    #[arg(long)]
    pub(crate) city: Option<String>,
    #[arg(long)]
    pub(crate) county: Option<String>,
    /// Purchase price used when neither provider reports one
    #[arg(long)]
    pub(crate) purchase_price: Option<f64>,
    /// Maximum sale comps to use (1-20)
    #[arg(long)]
    pub(crate) sale_comp_limit: Option<usize>,
    /// Cap rate percentage for the income approach
    #[arg(long)]
    pub(crate) cap_rate: Option<f64>,
}

impl PanelArgs {
    fn into_request(self) -> (AddressQuery, PanelOptions) {
        let defaults = PanelOptions::default();
        let options = PanelOptions {
            cap_rate_percent: self.cap_rate.unwrap_or(defaults.cap_rate_percent),
            sale_comp_limit: self.sale_comp_limit.unwrap_or(defaults.sale_comp_limit),
            purchase_price_override: self.purchase_price,
            ..defaults
        };
        let query = AddressQuery {
            full_address: Some(self.full_address),
            state: self.state,
            address_line1: self.address_line1,
            city: self.city,
            county: self.county,
        };
        (query, options)
    }
}

pub(crate) async fn run_panel(args: PanelArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let service = build_panel_service(&config)?;
    let (query, options) = args.into_request();
    let panel = service.build_panel(query, options).await?;

    match serde_json::to_string_pretty(&panel) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("failed to render panel: {err}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_fill_unset_options_with_defaults() {
        let args = PanelArgs {
            full_address: "1200 Grand Ave, Des Moines, IA 50309".to_string(),
            cap_rate: Some(6.0),
            ..PanelArgs::default()
        };

        let (query, options) = args.into_request();
        assert_eq!(
            query.full_address.as_deref(),
            Some("1200 Grand Ave, Des Moines, IA 50309")
        );
        assert_eq!(options.cap_rate_percent, 6.0);
        assert_eq!(options.sale_comp_limit, 10);
        assert_eq!(options.vacancy_percent, 5.0);
        assert!(options.purchase_price_override.is_none());
    }
}
