//! Quote requests and parsing of raw request fields.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::package::Package;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VatRate {
    #[serde(rename = "8")]
    Reduced,
    #[serde(rename = "23")]
    Standard,
}

impl std::str::FromStr for VatRate {
    type Err = PricingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().trim_end_matches('%') {
            "8" => Ok(VatRate::Reduced),
            "23" => Ok(VatRate::Standard),
            other => Err(PricingError::invalid(format!("vat must be 8 or 23, got {other:?}"))),
        }
    }
}

/// A single full-price request.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub service: String,
    pub address: String,
    pub vat: VatRate,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub package: Package,
    pub override_now: bool,
}

impl QuoteRequest {
    pub fn new(service: impl Into<String>, address: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            service: service.into(),
            address: address.into(),
            vat: VatRate::Reduced,
            date,
            time,
            package: Package::Safe,
            override_now: false,
        }
    }

    pub fn vat(mut self, vat: VatRate) -> Self {
        self.vat = vat;
        self
    }

    pub fn package(mut self, package: Package) -> Self {
        self.package = package;
        self
    }

    pub fn override_now(mut self, override_now: bool) -> Self {
        self.override_now = override_now;
        self
    }
}

/// `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate, PricingError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| PricingError::invalid(format!("date {value:?} is not YYYY-MM-DD: {err}")))
}

/// `HH:MM`
pub fn parse_time(value: &str) -> Result<NaiveTime, PricingError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|err| PricingError::invalid(format!("time {value:?} is not HH:MM: {err}")))
}

/// Only a case-insensitive `true` enables a flag.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Rejects absent or blank fields.
pub fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, PricingError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PricingError::invalid(format!("missing required parameter {name:?}"))),
    }
}
