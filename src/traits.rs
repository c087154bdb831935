//! Collaborator interfaces consumed by the pricing core.
//!
//! The spreadsheet, distance and calendar adapters implement them for live
//! use; tests implement them with in-memory fakes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

/// Base price entry for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePrice {
    pub service: String,
    pub netto: Decimal,
    pub brutto_8: Decimal,
    pub brutto_23: Decimal,
    /// Free-form duration text from the price list.
    pub duration: Option<String>,
}

/// Supplies the curated list of flat-rate local addresses.
pub trait LocalAddressSource {
    /// Normalized address strings, in catalog order.
    fn local_addresses(&self) -> Result<Vec<String>, PricingError>;

    /// Distinct street names on the list, sorted.
    fn street_names(&self) -> Result<Vec<String>, PricingError>;
}

/// Road distance between two free-text addresses.
pub trait DistanceProvider {
    fn distance_km(&self, origin: &str, destination: &str) -> Result<Decimal, PricingError>;
}

/// Number of already-booked events on a given day.
///
/// Callers treat a failure as an idle day.
pub trait CalendarLoadProvider {
    fn load_for(&self, date: NaiveDate) -> Result<u32, PricingError>;
}

/// Base price list lookup.
pub trait BasePriceProvider {
    /// Fails with `NotFound` when the service is not on the list.
    fn base_price(&self, service: &str) -> Result<BasePrice, PricingError>;

    /// Distinct service names in list order.
    fn service_names(&self) -> Result<Vec<String>, PricingError>;
}

impl<T: LocalAddressSource + ?Sized> LocalAddressSource for &T {
    fn local_addresses(&self) -> Result<Vec<String>, PricingError> {
        (**self).local_addresses()
    }

    fn street_names(&self) -> Result<Vec<String>, PricingError> {
        (**self).street_names()
    }
}

impl<T: DistanceProvider + ?Sized> DistanceProvider for &T {
    fn distance_km(&self, origin: &str, destination: &str) -> Result<Decimal, PricingError> {
        (**self).distance_km(origin, destination)
    }
}

impl<T: CalendarLoadProvider + ?Sized> CalendarLoadProvider for &T {
    fn load_for(&self, date: NaiveDate) -> Result<u32, PricingError> {
        (**self).load_for(date)
    }
}

impl<T: BasePriceProvider + ?Sized> BasePriceProvider for &T {
    fn base_price(&self, service: &str) -> Result<BasePrice, PricingError> {
        (**self).base_price(service)
    }

    fn service_names(&self) -> Result<Vec<String>, PricingError> {
        (**self).service_names()
    }
}
