//! Service packages and their multipliers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Package {
    Safe,
    Comfort,
    Priority,
    All,
}

impl Package {
    /// Unknown codes fall back to `Safe`.
    pub fn from_code(code: &str) -> Package {
        match code.trim().to_lowercase().as_str() {
            "comfort" => Package::Comfort,
            "priority" => Package::Priority,
            "all" => Package::All,
            _ => Package::Safe,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Package::Safe => "Pakiet Safe",
            Package::Comfort => "Pakiet Comfort",
            Package::Priority => "Pakiet Priority",
            Package::All => "Pakiet All Inclusive",
        }
    }

    pub fn modifier(&self) -> Decimal {
        match self {
            Package::Safe => dec!(1.0),
            Package::Comfort => dec!(1.25),
            Package::Priority => dec!(1.5),
            Package::All => dec!(2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageModifier {
    pub code: Package,
    pub name: String,
    pub modifier: Decimal,
}

impl From<Package> for PackageModifier {
    fn from(code: Package) -> Self {
        Self {
            code,
            name: code.name().to_string(),
            modifier: code.modifier(),
        }
    }
}
