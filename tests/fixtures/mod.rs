//! Test fixtures for visit-pricing.
//!
//! Provides in-memory collaborators with sensible defaults:
//! - a price list with the "pomiary" service (netto 150, brutto 162 / 184.50)
//! - a local address list around Świebodzice
//! - distance and calendar fakes that can be switched offline

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use visit_pricing::composer::PriceComposer;
use visit_pricing::config::PricingConfig;
use visit_pricing::error::PricingError;
use visit_pricing::location::normalize_address;
use visit_pricing::traits::{BasePrice, BasePriceProvider, CalendarLoadProvider, DistanceProvider, LocalAddressSource};

pub const LOCAL_ADDRESS: &str = "Lipowa 7, Swiebodzice";
pub const NEAR_ADDRESS: &str = "Rynek 9, Strzegom";
pub const FAR_ADDRESS: &str = "Rynek 1, Walbrzych";

pub type TestComposer = PriceComposer<PriceList, AddressList, Distances, Calendar>;

// ============================================================================
// Collaborators
// ============================================================================

pub struct PriceList {
    prices: Vec<BasePrice>,
    offline: bool,
    pub calls: AtomicUsize,
}

impl PriceList {
    pub fn standard() -> Self {
        Self {
            prices: vec![
                BasePrice {
                    service: "Pomiary".to_string(),
                    netto: dec!(150),
                    brutto_8: dec!(162),
                    brutto_23: dec!(184.50),
                    duration: Some("1h".to_string()),
                },
                BasePrice {
                    service: "Przegląd".to_string(),
                    netto: dec!(300),
                    brutto_8: dec!(324),
                    brutto_23: dec!(369),
                    duration: None,
                },
            ],
            offline: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl BasePriceProvider for PriceList {
    fn base_price(&self, service: &str) -> Result<BasePrice, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(PricingError::unavailable("price sheet offline"));
        }
        self.prices
            .iter()
            .find(|price| price.service.to_lowercase() == service.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| PricingError::NotFound(format!("service {service:?}")))
    }

    fn service_names(&self) -> Result<Vec<String>, PricingError> {
        Ok(self.prices.iter().map(|price| price.service.clone()).collect())
    }
}

pub struct AddressList {
    entries: Vec<String>,
    offline: bool,
}

impl AddressList {
    pub fn standard() -> Self {
        Self {
            entries: vec![
                "główna 1, świebodzice".to_string(),
                "główna 1, 58-160 świebodzice".to_string(),
                "lipowa 7, swiebodzice".to_string(),
                "lipowa 7, 58-160 swiebodzice".to_string(),
            ],
            offline: false,
        }
    }
}

impl LocalAddressSource for AddressList {
    fn local_addresses(&self) -> Result<Vec<String>, PricingError> {
        if self.offline {
            return Err(PricingError::unavailable("address sheet offline"));
        }
        Ok(self.entries.clone())
    }

    fn street_names(&self) -> Result<Vec<String>, PricingError> {
        Ok(vec!["Główna".to_string(), "Lipowa".to_string()])
    }
}

/// Distances keyed by normalized destination; unknown destinations have no route.
pub struct Distances {
    by_destination: HashMap<String, Decimal>,
    pub calls: AtomicUsize,
}

impl DistanceProvider for Distances {
    fn distance_km(&self, _origin: &str, destination: &str) -> Result<Decimal, PricingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.by_destination
            .get(&normalize_address(destination))
            .copied()
            .ok_or_else(|| PricingError::unavailable(format!("no route to {destination:?}")))
    }
}

/// Fixed booking count; `None` means the calendar is unreachable.
pub struct Calendar {
    load: Option<u32>,
}

impl CalendarLoadProvider for Calendar {
    fn load_for(&self, _date: NaiveDate) -> Result<u32, PricingError> {
        self.load
            .ok_or_else(|| PricingError::unavailable("calendar offline"))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for a composer over in-memory collaborators.
pub struct Backend {
    config: PricingConfig,
    prices: PriceList,
    addresses: AddressList,
    distances: HashMap<String, Decimal>,
    load: Option<u32>,
}

impl Backend {
    pub fn new() -> Self {
        Self {
            config: PricingConfig::default(),
            prices: PriceList::standard(),
            addresses: AddressList::standard(),
            distances: HashMap::from([
                (normalize_address(NEAR_ADDRESS), dec!(14.2)),
                (normalize_address(FAR_ADDRESS), dec!(25)),
            ]),
            load: Some(0),
        }
    }

    pub fn config(mut self, config: PricingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn load(mut self, load: u32) -> Self {
        self.load = Some(load);
        self
    }

    pub fn calendar_offline(mut self) -> Self {
        self.load = None;
        self
    }

    pub fn prices_offline(mut self) -> Self {
        self.prices.offline = true;
        self
    }

    pub fn addresses_offline(mut self) -> Self {
        self.addresses.offline = true;
        self
    }

    pub fn without_routes(mut self) -> Self {
        self.distances.clear();
        self
    }

    pub fn build(self) -> TestComposer {
        PriceComposer::new(
            &self.config,
            self.prices,
            self.addresses,
            Distances {
                by_destination: self.distances,
                calls: AtomicUsize::new(0),
            },
            Calendar { load: self.load },
        )
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Monday, 2024-03-11.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
}

pub fn in_days(days: u64) -> NaiveDate {
    today().checked_add_days(chrono::Days::new(days)).unwrap()
}

pub fn at(value: &str) -> chrono::NaiveTime {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").unwrap()
}
