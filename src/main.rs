use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use visit_pricing::calendar::{CalendarClient, CalendarConfig};
use visit_pricing::composer::PriceComposer;
use visit_pricing::config::{PricingConfig, ServiceConfig};
use visit_pricing::distance::{DistanceMatrixClient, DistanceMatrixConfig};
use visit_pricing::server;
use visit_pricing::sheets::{AddressSheet, ServiceSheet, SheetClient};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let service = ServiceConfig::from_env()?;
    let pricing = PricingConfig::from_env()?;

    // Blocking clients own a runtime of their own; build them outside tokio.
    let sheets = SheetClient::new(service.timeout_secs)?;
    let distances = DistanceMatrixClient::new(DistanceMatrixConfig {
        base_url: service.distance_api_url.clone(),
        api_key: service.maps_api_key.clone(),
        timeout_secs: service.timeout_secs,
    })?;
    let calendar = CalendarClient::new(CalendarConfig {
        base_url: service.calendar_url.clone(),
        timeout_secs: service.timeout_secs,
    })?;

    let composer = Arc::new(PriceComposer::new(
        &pricing,
        ServiceSheet::new(sheets.clone(), service.services_sheet_url.clone()),
        AddressSheet::new(sheets, service.address_sheet_url.clone()),
        distances,
        calendar,
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let addr = SocketAddr::from(([0, 0, 0, 0], service.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, base_address = %pricing.base_address, "pricing service listening");
        axum::serve(listener, server::router(composer)).await?;
        Ok::<(), anyhow::Error>(())
    })
}
