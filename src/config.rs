//! Process-wide configuration, read once at start-up.

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::location::MatchPolicy;
use crate::slot::SlotCoverage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Constants used by the classifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Origin for every distance lookup.
    pub base_address: String,
    pub fee_per_km: Decimal,
    pub far_threshold_km: Decimal,
    pub far_modifier: Decimal,
    pub local_modifier: Decimal,
    pub match_policy: MatchPolicy,
    pub slot_coverage: SlotCoverage,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_address: "Królowej Elżbiety 1A, 58-160 Świebodzice".to_string(),
            fee_per_km: dec!(2.0),
            far_threshold_km: dec!(20.0),
            far_modifier: dec!(1.1),
            local_modifier: dec!(0.9),
            match_policy: MatchPolicy::Exact,
            slot_coverage: SlotCoverage::Lenient,
        }
    }
}

impl PricingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            base_address: env::var("BASE_ADDRESS").unwrap_or(defaults.base_address),
            fee_per_km: parse_or("BASE_FEE_KM", defaults.fee_per_km)?,
            far_threshold_km: parse_or("FAR_THRESHOLD_KM", defaults.far_threshold_km)?,
            far_modifier: parse_or("FAR_MODIFIER", defaults.far_modifier)?,
            local_modifier: parse_or("LOCAL_MODIFIER", defaults.local_modifier)?,
            match_policy: parse_or("ADDRESS_MATCH", defaults.match_policy)?,
            slot_coverage: parse_or("SLOT_COVERAGE", defaults.slot_coverage)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fees and thresholds must be non-negative, modifiers positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure("BASE_FEE_KM", self.fee_per_km, !self.fee_per_km.is_sign_negative())?;
        ensure(
            "FAR_THRESHOLD_KM",
            self.far_threshold_km,
            !self.far_threshold_km.is_sign_negative(),
        )?;
        ensure("FAR_MODIFIER", self.far_modifier, self.far_modifier > Decimal::ZERO)?;
        ensure("LOCAL_MODIFIER", self.local_modifier, self.local_modifier > Decimal::ZERO)?;
        Ok(())
    }
}

/// Endpoints and credentials for the live adapters.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub maps_api_key: String,
    pub address_sheet_url: String,
    pub services_sheet_url: String,
    pub calendar_url: String,
    pub distance_api_url: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl ServiceConfig {
    /// Fails listing every missing required variable at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        let required = ["GOOGLE_MAPS_API_KEY", "ADDRESS_SHEET_URL", "SERVICES_SHEET_URL"];
        let missing: Vec<String> = required
            .iter()
            .filter(|name| env::var(name).map(|v| v.trim().is_empty()).unwrap_or(true))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            maps_api_key: required_var("GOOGLE_MAPS_API_KEY")?,
            address_sheet_url: required_var("ADDRESS_SHEET_URL")?,
            services_sheet_url: required_var("SERVICES_SHEET_URL")?,
            calendar_url: env::var("CALENDAR_SERVICE_URL")
                .unwrap_or_else(|_| "https://calendar-service-pl5m.onrender.com".to_string()),
            distance_api_url: env::var("DISTANCE_API_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com".to_string()),
            port: parse_or("PORT", 5000)?,
            timeout_secs: timeout_secs(parse_or("HTTP_TIMEOUT_SECS", 10)?)?,
        })
    }
}

fn ensure(name: &str, value: impl std::fmt::Display, ok: bool) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Outbound calls need at least a second to complete.
fn timeout_secs(value: u64) -> Result<u64, ConfigError> {
    ensure("HTTP_TIMEOUT_SECS", value, value >= 1)?;
    Ok(value)
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(vec![name.to_string()]))
}

fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => parse_value(name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
    })
}
