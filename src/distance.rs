//! Distance Matrix HTTP adapter for road distances between addresses.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::debug;

use crate::error::PricingError;
use crate::traits::DistanceProvider;

#[derive(Debug, Clone)]
pub struct DistanceMatrixConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for DistanceMatrixConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistanceMatrixClient {
    config: DistanceMatrixConfig,
    client: reqwest::blocking::Client,
}

impl DistanceMatrixClient {
    pub fn new(config: DistanceMatrixConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl DistanceProvider for DistanceMatrixClient {
    fn distance_km(&self, origin: &str, destination: &str) -> Result<Decimal, PricingError> {
        let url = format!(
            "{}/maps/api/distancematrix/json",
            self.config.base_url.trim_end_matches('/')
        );

        let body = self
            .client
            .get(url)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("units", "metric"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<MatrixResponse>())?;

        let km = kilometers(body)?;
        debug!(origin, destination, %km, "distance lookup");
        Ok(km)
    }
}

#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<MatrixValue>,
}

#[derive(Debug, Deserialize)]
struct MatrixValue {
    /// Meters.
    value: u64,
}

/// Distance of the first origin/destination pair, in km to 2 digits.
pub fn kilometers(response: MatrixResponse) -> Result<Decimal, PricingError> {
    if response.status != "OK" {
        let detail = response.error_message.unwrap_or_default();
        return Err(PricingError::unavailable(format!(
            "distance service answered {}: {detail}",
            response.status
        )));
    }

    let element = response
        .rows
        .into_iter()
        .next()
        .and_then(|row| row.elements.into_iter().next())
        .ok_or_else(|| PricingError::unavailable("distance service returned no elements"))?;

    match (element.status.as_str(), element.distance) {
        ("OK", Some(distance)) => Ok((Decimal::from(distance.value) / Decimal::ONE_THOUSAND)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)),
        (status, _) => Err(PricingError::unavailable(format!("no route found ({status})"))),
    }
}
