//! Time-slot rules and their price adjustments.
//!
//! The slot table is an ordered list of declarative rules. The first rule
//! whose weekday, window and location all match wins; adding a slot means
//! adding a rule, not a branch.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PricingError;
use crate::load;
use crate::location::LocationType;
use crate::urgency::UrgencyTier;

pub const NOW_SLOT: &str = "NOW";
pub const UNKNOWN_SLOT: &str = "UNKNOWN";

const WORKDAYS: [Weekday; 5] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];
const WEEKEND: [Weekday; 2] = [Weekday::Sat, Weekday::Sun];
const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// What to do with a slot that no rule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCoverage {
    /// Price the gap at parity and log a warning.
    Lenient,
    /// Reject the request.
    Strict,
}

impl std::str::FromStr for SlotCoverage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "lenient" => Ok(SlotCoverage::Lenient),
            "strict" => Ok(SlotCoverage::Strict),
            other => Err(format!("unknown slot coverage {other:?}")),
        }
    }
}

/// How a matched rule prices the slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotPricing {
    Fixed(Decimal),
    /// Scales with the day's load between `floor` and `ceiling`.
    Dynamic { floor: Decimal, ceiling: Decimal },
    /// Flat amount per weekday; days not listed add nothing.
    Surcharge(Vec<(Weekday, Decimal)>),
}

impl SlotPricing {
    fn adjustment(&self, weekday: Weekday, load: u32) -> SlotAdjustment {
        match self {
            SlotPricing::Fixed(modifier) => SlotAdjustment::Multiplier(*modifier),
            SlotPricing::Dynamic { floor, ceiling } => {
                SlotAdjustment::Multiplier(load::interpolate(load, *floor, *ceiling))
            }
            SlotPricing::Surcharge(amounts) => {
                let amount = amounts
                    .iter()
                    .find(|(day, _)| *day == weekday)
                    .map(|(_, amount)| *amount)
                    .unwrap_or(Decimal::ZERO);
                SlotAdjustment::Surcharge(amount)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotRule {
    pub name: String,
    pub weekdays: Vec<Weekday>,
    /// Half-open window `[start, end)`.
    pub window: (NaiveTime, NaiveTime),
    pub locations: Vec<LocationType>,
    pub pricing: SlotPricing,
}

impl SlotRule {
    pub fn new(
        name: &str,
        weekdays: &[Weekday],
        window: (NaiveTime, NaiveTime),
        locations: &[LocationType],
        pricing: SlotPricing,
    ) -> Self {
        Self {
            name: name.to_string(),
            weekdays: weekdays.to_vec(),
            window,
            locations: locations.to_vec(),
            pricing,
        }
    }

    pub fn matches(&self, weekday: Weekday, time: NaiveTime, location: LocationType) -> bool {
        self.weekdays.contains(&weekday)
            && self.locations.contains(&location)
            && self.window.0 <= time
            && time < self.window.1
    }
}

/// Either a multiplier or a flat amount, never both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SlotAdjustment {
    Multiplier(Decimal),
    Surcharge(Decimal),
}

impl SlotAdjustment {
    /// `None` on overflow.
    pub fn apply(&self, price: Decimal) -> Option<Decimal> {
        match self {
            SlotAdjustment::Multiplier(modifier) => price.checked_mul(*modifier),
            SlotAdjustment::Surcharge(amount) => price.checked_add(*amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotResult {
    pub slot: String,
    #[serde(rename = "modifier")]
    pub adjustment: SlotAdjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub urgency: UrgencyTier,
    pub location: LocationType,
    /// Forces the NOW slot.
    pub override_now: bool,
}

#[derive(Debug, Clone)]
pub struct SlotResolver {
    now: SlotPricing,
    rules: Vec<SlotRule>,
    coverage: SlotCoverage,
}

impl Default for SlotResolver {
    fn default() -> Self {
        Self::new(standard_rules(), SlotCoverage::Lenient)
    }
}

impl SlotResolver {
    pub fn new(rules: Vec<SlotRule>, coverage: SlotCoverage) -> Self {
        Self {
            now: SlotPricing::Dynamic {
                floor: dec!(1.5),
                ceiling: dec!(3.0),
            },
            rules,
            coverage,
        }
    }

    pub fn rules(&self) -> &[SlotRule] {
        &self.rules
    }

    pub fn resolve(&self, query: &SlotQuery, load: u32) -> Result<SlotResult, PricingError> {
        let weekday = query.date.weekday();

        if query.override_now || query.urgency == UrgencyTier::Immediate {
            return Ok(SlotResult {
                slot: NOW_SLOT.to_string(),
                adjustment: self.now.adjustment(weekday, load),
            });
        }

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.matches(weekday, query.time, query.location))
        {
            return Ok(SlotResult {
                slot: rule.name.clone(),
                adjustment: rule.pricing.adjustment(weekday, load),
            });
        }

        match self.coverage {
            SlotCoverage::Lenient => {
                warn!(
                    date = %query.date,
                    time = %query.time.format("%H:%M"),
                    location = query.location.as_str(),
                    "no slot covers visit, pricing at parity"
                );
                Ok(SlotResult {
                    slot: UNKNOWN_SLOT.to_string(),
                    adjustment: SlotAdjustment::Multiplier(Decimal::ONE),
                })
            }
            SlotCoverage::Strict => Err(PricingError::invalid(format!(
                "no slot covers {:?} {} at {} ({})",
                weekday,
                query.date,
                query.time.format("%H:%M"),
                query.location.as_str()
            ))),
        }
    }
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// The business's slot table, in priority order.
pub fn standard_rules() -> Vec<SlotRule> {
    use LocationType::*;

    vec![
        SlotRule::new("A", &WORKDAYS, (at(8), at(14)), &[LocalList], SlotPricing::Fixed(dec!(0.9))),
        SlotRule::new("B", &WORKDAYS, (at(14), at(18)), &LocationType::ALL, SlotPricing::Fixed(dec!(1.0))),
        SlotRule::new(
            "C",
            &WORKDAYS,
            (at(8), at(18)),
            &[DistanceLocal, DistanceFar],
            SlotPricing::Dynamic {
                floor: dec!(0.85),
                ceiling: dec!(1.2),
            },
        ),
        SlotRule::new("D", &ALL_DAYS, (at(18), at(22)), &LocationType::ALL, SlotPricing::Fixed(dec!(1.5))),
        SlotRule::new(
            "E",
            &WEEKEND,
            (at(7), at(11)),
            &[LocalList, DistanceLocal],
            SlotPricing::Surcharge(vec![(Weekday::Sat, dec!(50)), (Weekday::Sun, dec!(60))]),
        ),
    ]
}
