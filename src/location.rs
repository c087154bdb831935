//! Address classification: local list membership, else distance buckets.

use rayon::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PricingConfig;
use crate::error::PricingError;
use crate::traits::{DistanceProvider, LocalAddressSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    LocalList,
    DistanceLocal,
    DistanceFar,
}

impl LocationType {
    pub const ALL: [LocationType; 3] = [
        LocationType::LocalList,
        LocationType::DistanceLocal,
        LocationType::DistanceFar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::LocalList => "local_list",
            LocationType::DistanceLocal => "distance_local",
            LocationType::DistanceFar => "distance_far",
        }
    }
}

impl std::str::FromStr for LocationType {
    type Err = PricingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "local_list" => Ok(LocationType::LocalList),
            "distance_local" => Ok(LocationType::DistanceLocal),
            "distance_far" => Ok(LocationType::DistanceFar),
            other => Err(PricingError::invalid(format!("unknown location type {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    pub location_type: LocationType,
    pub modifier: Decimal,
    pub distance_km: Decimal,
    /// Per-km travel fee, reported alongside the modifier.
    pub extra_fee: Decimal,
}

/// How an address is compared against the local catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Normalized equality only.
    Exact,
    /// Equality first, then any catalog entry contained in the address.
    Contains,
}

impl std::str::FromStr for MatchPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "contains" => Ok(MatchPolicy::Contains),
            other => Err(format!("unknown match policy {other:?}")),
        }
    }
}

/// Trim, lowercase and collapse inner whitespace.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct AddressClassifier {
    base_address: String,
    fee_per_km: Decimal,
    far_threshold_km: Decimal,
    far_modifier: Decimal,
    local_modifier: Decimal,
    policy: MatchPolicy,
}

impl AddressClassifier {
    pub fn new(config: &PricingConfig) -> Self {
        Self {
            base_address: config.base_address.clone(),
            fee_per_km: config.fee_per_km,
            far_threshold_km: config.far_threshold_km,
            far_modifier: config.far_modifier,
            local_modifier: config.local_modifier,
            policy: config.match_policy,
        }
    }

    pub fn classify<A, D>(
        &self,
        address: &str,
        addresses: &A,
        distances: &D,
    ) -> Result<LocationResult, PricingError>
    where
        A: LocalAddressSource + ?Sized,
        D: DistanceProvider + ?Sized,
    {
        let normalized = normalize_address(address);
        if normalized.is_empty() {
            return Err(PricingError::invalid("address is empty"));
        }

        let catalog = addresses.local_addresses()?;
        if let Some(entry) = self.find_local(&normalized, &catalog) {
            info!(address = %normalized, matched = %entry, "address on local list");
            return Ok(LocationResult {
                location_type: LocationType::LocalList,
                modifier: self.local_modifier,
                distance_km: Decimal::ZERO,
                extra_fee: Decimal::ZERO,
            });
        }

        debug!(address = %normalized, catalog_size = catalog.len(), "address not on local list");
        let distance_km = distances.distance_km(&self.base_address, &normalized)?;
        if distance_km.is_sign_negative() {
            return Err(PricingError::unavailable(format!(
                "distance lookup returned negative distance {distance_km}"
            )));
        }

        let (location_type, modifier) = if distance_km <= self.far_threshold_km {
            (LocationType::DistanceLocal, Decimal::ONE)
        } else {
            (LocationType::DistanceFar, self.far_modifier)
        };
        let extra_fee = distance_km
            .checked_mul(self.fee_per_km)
            .ok_or_else(|| PricingError::unavailable(format!("travel fee for {distance_km} km overflows")))?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        info!(
            address = %normalized,
            location_type = location_type.as_str(),
            %distance_km,
            %extra_fee,
            "address classified by distance"
        );

        Ok(LocationResult {
            location_type,
            modifier,
            distance_km,
            extra_fee,
        })
    }

    /// First catalog entry (in catalog order) matching the normalized address.
    /// Catalog entries arrive normalized from the address source.
    fn find_local<'c>(&self, normalized: &str, catalog: &'c [String]) -> Option<&'c String> {
        let exact = catalog.par_iter().find_first(|entry| entry.as_str() == normalized);

        match (exact, self.policy) {
            (Some(entry), _) => Some(entry),
            (None, MatchPolicy::Exact) => None,
            (None, MatchPolicy::Contains) => catalog
                .par_iter()
                .find_first(|entry| !entry.is_empty() && normalized.contains(entry.as_str())),
        }
    }
}
