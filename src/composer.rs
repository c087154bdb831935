//! Price composition pipeline.
//!
//! Stages run in a fixed order: base price, location, urgency, slot,
//! package. Each stage feeds its classification into the next where
//! relevant, and a failure at any stage aborts the whole quote.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PricingConfig;
use crate::error::{PricingError, Stage};
use crate::location::{AddressClassifier, LocationResult};
use crate::package::PackageModifier;
use crate::request::{QuoteRequest, VatRate};
use crate::slot::{SlotAdjustment, SlotQuery, SlotResolver, SlotResult, standard_rules};
use crate::traits::{BasePrice, BasePriceProvider, CalendarLoadProvider, DistanceProvider, LocalAddressSource};
use crate::urgency::{self, UrgencyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Base,
    Multiply,
    Add,
}

/// Running price after one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStep {
    pub stage: Stage,
    pub operation: Operation,
    pub operand: Decimal,
    pub running_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub service: String,
    pub base: BasePrice,
    pub vat: VatRate,
    pub location: LocationResult,
    pub when: UrgencyResult,
    pub slot: SlotResult,
    pub package: PackageModifier,
    pub steps: Vec<PriceStep>,
    pub final_price: Decimal,
}

#[derive(Debug, Default)]
struct Ledger {
    price: Decimal,
    steps: Vec<PriceStep>,
}

impl Ledger {
    fn record(&mut self, stage: Stage, operation: Operation, operand: Decimal) -> Result<(), PricingError> {
        let price = match operation {
            Operation::Base => Some(operand),
            Operation::Multiply => self.price.checked_mul(operand),
            Operation::Add => self.price.checked_add(operand),
        };
        self.price = price.ok_or_else(|| {
            PricingError::at(stage)(PricingError::unavailable(format!(
                "price {} overflows applying {operand}",
                self.price
            )))
        })?;
        self.steps.push(PriceStep {
            stage,
            operation,
            operand,
            running_price: self.price,
        });
        Ok(())
    }
}

pub struct PriceComposer<P, A, D, C> {
    prices: P,
    addresses: A,
    distances: D,
    calendar: C,
    locations: AddressClassifier,
    slots: SlotResolver,
}

impl<P, A, D, C> PriceComposer<P, A, D, C>
where
    P: BasePriceProvider,
    A: LocalAddressSource,
    D: DistanceProvider,
    C: CalendarLoadProvider,
{
    pub fn new(config: &PricingConfig, prices: P, addresses: A, distances: D, calendar: C) -> Self {
        Self {
            prices,
            addresses,
            distances,
            calendar,
            locations: AddressClassifier::new(config),
            slots: SlotResolver::new(standard_rules(), config.slot_coverage),
        }
    }

    /// Replaces the slot table.
    pub fn with_slots(mut self, slots: SlotResolver) -> Self {
        self.slots = slots;
        self
    }

    pub fn prices(&self) -> &P {
        &self.prices
    }

    pub fn addresses(&self) -> &A {
        &self.addresses
    }

    pub fn distances(&self) -> &D {
        &self.distances
    }

    pub fn classify_location(&self, address: &str) -> Result<LocationResult, PricingError> {
        self.locations.classify(address, &self.addresses, &self.distances)
    }

    pub fn classify_urgency(&self, date: NaiveDate, today: NaiveDate) -> Result<UrgencyResult, PricingError> {
        urgency::classify(date, today)
    }

    /// Resolves the slot, fetching the day's load first.
    pub fn resolve_slot(&self, query: &SlotQuery) -> Result<SlotResult, PricingError> {
        let load = self.load_or_idle(query.date);
        self.slots.resolve(query, load)
    }

    /// An unavailable calendar counts as an idle day.
    fn load_or_idle(&self, date: NaiveDate) -> u32 {
        match self.calendar.load_for(date) {
            Ok(load) => load,
            Err(err) => {
                warn!(%date, error = %err, "calendar load unavailable, assuming idle day");
                0
            }
        }
    }

    pub fn compose(&self, request: &QuoteRequest, today: NaiveDate) -> Result<PriceBreakdown, PricingError> {
        let service = request.service.trim();
        if service.is_empty() {
            return Err(PricingError::invalid("service is empty"));
        }
        if request.address.trim().is_empty() {
            return Err(PricingError::invalid("address is empty"));
        }

        info!(
            service,
            address = %request.address,
            date = %request.date,
            time = %request.time.format("%H:%M"),
            vat = ?request.vat,
            package = ?request.package,
            override_now = request.override_now,
            "composing quote"
        );

        let base = self.prices.base_price(service).map_err(|err| match err {
            not_found @ PricingError::NotFound(_) => not_found,
            other => PricingError::at(Stage::BasePrice)(other),
        })?;
        let gross = match request.vat {
            VatRate::Reduced => base.brutto_8,
            VatRate::Standard => base.brutto_23,
        };

        let mut ledger = Ledger::default();
        ledger.record(Stage::BasePrice, Operation::Base, gross)?;
        debug!(%gross, "base price");

        let location = self
            .classify_location(&request.address)
            .map_err(PricingError::at(Stage::Location))?;
        ledger.record(Stage::Location, Operation::Multiply, location.modifier)?;
        debug!(location_type = location.location_type.as_str(), modifier = %location.modifier, "location applied");

        let when = self
            .classify_urgency(request.date, today)
            .map_err(PricingError::at(Stage::Urgency))?;
        ledger.record(Stage::Urgency, Operation::Multiply, when.modifier)?;
        debug!(tier = ?when.tier, modifier = %when.modifier, "urgency applied");

        let slot = self
            .resolve_slot(&SlotQuery {
                date: request.date,
                time: request.time,
                urgency: when.tier,
                location: location.location_type,
                override_now: request.override_now,
            })
            .map_err(PricingError::at(Stage::Slot))?;
        match slot.adjustment {
            SlotAdjustment::Multiplier(modifier) => ledger.record(Stage::Slot, Operation::Multiply, modifier)?,
            SlotAdjustment::Surcharge(amount) => ledger.record(Stage::Slot, Operation::Add, amount)?,
        }
        debug!(slot = %slot.slot, adjustment = ?slot.adjustment, "slot applied");

        let package = PackageModifier::from(request.package);
        ledger.record(Stage::Package, Operation::Multiply, package.modifier)?;
        debug!(package = %package.name, modifier = %package.modifier, "package applied");

        let final_price = ledger
            .price
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        info!(service, %final_price, "quote composed");

        Ok(PriceBreakdown {
            service: base.service.clone(),
            base,
            vat: request.vat,
            location,
            when,
            slot,
            package,
            steps: ledger.steps,
            final_price,
        })
    }
}
