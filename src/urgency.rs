//! Urgency tiers derived from days until the visit.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyTier {
    Immediate,
    Urgent,
    Standard,
    Planned,
}

impl UrgencyTier {
    /// Multiplier for the tier; non-increasing from `Immediate` to `Planned`.
    pub fn modifier(&self) -> Decimal {
        match self {
            UrgencyTier::Immediate => dec!(1.5),
            UrgencyTier::Urgent => dec!(1.25),
            UrgencyTier::Standard => dec!(1.0),
            UrgencyTier::Planned => dec!(0.9),
        }
    }

    pub fn for_days(delta_days: i64) -> Option<UrgencyTier> {
        match delta_days {
            i64::MIN..=-1 => None,
            0..=1 => Some(UrgencyTier::Immediate),
            2..=6 => Some(UrgencyTier::Urgent),
            7..=14 => Some(UrgencyTier::Standard),
            _ => Some(UrgencyTier::Planned),
        }
    }
}

impl std::str::FromStr for UrgencyTier {
    type Err = PricingError;

    /// Accepts the tier names and the Polish labels used by booking forms.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "IMMEDIATE" | "NATYCHMIASTOWA" => Ok(UrgencyTier::Immediate),
            "URGENT" | "PILNA" => Ok(UrgencyTier::Urgent),
            "STANDARD" => Ok(UrgencyTier::Standard),
            "PLANNED" | "PLANOWA" => Ok(UrgencyTier::Planned),
            other => Err(PricingError::invalid(format!("unknown urgency {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UrgencyResult {
    #[serde(rename = "type")]
    pub tier: UrgencyTier,
    pub modifier: Decimal,
}

pub fn classify(target_date: NaiveDate, today: NaiveDate) -> Result<UrgencyResult, PricingError> {
    let delta = (target_date - today).num_days();
    let tier = UrgencyTier::for_days(delta).ok_or_else(|| {
        PricingError::invalid(format!("date {target_date} is in the past (today is {today})"))
    })?;

    Ok(UrgencyResult {
        tier,
        modifier: tier.modifier(),
    })
}
