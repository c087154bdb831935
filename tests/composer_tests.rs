//! End-to-end composition tests
//!
//! Full quotes over in-memory collaborators: pipeline order, rounding,
//! fail-fast stages and the fail-open calendar.

mod fixtures;

use std::sync::atomic::Ordering;

use chrono::Weekday;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use fixtures::{Backend, FAR_ADDRESS, LOCAL_ADDRESS, NEAR_ADDRESS, at, in_days, today};
use visit_pricing::composer::Operation;
use visit_pricing::config::PricingConfig;
use visit_pricing::error::{PricingError, Stage};
use visit_pricing::location::{LocationType, MatchPolicy};
use visit_pricing::package::Package;
use visit_pricing::request::{QuoteRequest, VatRate};
use visit_pricing::slot::{
    NOW_SLOT, SlotAdjustment, SlotCoverage, SlotPricing, SlotResolver, SlotRule, UNKNOWN_SLOT, standard_rules,
};
use visit_pricing::urgency::UrgencyTier;

fn pomiary(address: &str, days: u64, time: &str) -> QuoteRequest {
    QuoteRequest::new("pomiary", address, in_days(days), at(time))
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn local_standard_morning_quote() {
    let composer = Backend::new().build();
    let quote = composer.compose(&pomiary(LOCAL_ADDRESS, 10, "10:00"), today()).unwrap();

    assert_eq!(quote.service, "Pomiary");
    assert_eq!(quote.location.location_type, LocationType::LocalList);
    assert_eq!(quote.location.modifier, dec!(0.9));
    assert_eq!(quote.when.tier, UrgencyTier::Standard);
    assert_eq!(quote.when.modifier, dec!(1.0));
    assert_eq!(quote.slot.slot, "A");
    assert_eq!(quote.slot.adjustment, SlotAdjustment::Multiplier(dec!(0.9)));
    assert_eq!(quote.package.modifier, dec!(1.0));
    assert_eq!(quote.final_price, dec!(131.22));
}

#[test]
fn far_override_quote_stays_within_load_bounds() {
    // 162 * 1.1 * 1.5 * [1.5, 3.0] * 1.25
    let lowest = dec!(501.19);
    let highest = dec!(1002.38);

    for load in 0..=25 {
        let composer = Backend::new().load(load).build();
        let request = pomiary(FAR_ADDRESS, 1, "19:00")
            .package(Package::Comfort)
            .override_now(true);
        let quote = composer.compose(&request, today()).unwrap();

        assert_eq!(quote.when.modifier, dec!(1.5));
        assert_eq!(quote.location.modifier, dec!(1.1));
        assert_eq!(quote.location.location_type, LocationType::DistanceFar);
        assert_eq!(quote.slot.slot, NOW_SLOT);
        assert_eq!(quote.package.modifier, dec!(1.25));
        assert!(
            quote.final_price >= lowest && quote.final_price <= highest,
            "load {load} priced at {}",
            quote.final_price
        );
    }
}

#[test]
fn override_quote_exact_values() {
    let request = pomiary(FAR_ADDRESS, 1, "19:00")
        .package(Package::Comfort)
        .override_now(true);

    let idle = Backend::new().load(0).build().compose(&request, today()).unwrap();
    assert_eq!(idle.final_price, dec!(501.19));

    let half = Backend::new().load(10).build().compose(&request, today()).unwrap();
    assert_eq!(half.slot.adjustment, SlotAdjustment::Multiplier(dec!(2.25)));
    assert_eq!(half.final_price, dec!(751.78));
}

// ============================================================================
// Pipeline behavior
// ============================================================================

#[test]
fn steps_record_every_stage_in_order() {
    let composer = Backend::new().build();
    let quote = composer.compose(&pomiary(LOCAL_ADDRESS, 10, "10:00"), today()).unwrap();

    let stages: Vec<Stage> = quote.steps.iter().map(|step| step.stage).collect();
    assert_eq!(
        stages,
        vec![Stage::BasePrice, Stage::Location, Stage::Urgency, Stage::Slot, Stage::Package]
    );
    assert_eq!(quote.steps[0].operation, Operation::Base);
    assert_eq!(quote.steps[0].running_price, dec!(162));
    assert_eq!(quote.steps[1].running_price, dec!(145.8));
    assert_eq!(quote.steps[4].running_price, dec!(131.22));
}

#[test]
fn vat_23_uses_higher_gross_and_rounds_half_up() {
    let composer = Backend::new().build();
    let request = pomiary(LOCAL_ADDRESS, 10, "10:00").vat(VatRate::Standard);
    let quote = composer.compose(&request, today()).unwrap();

    // 184.50 * 0.9 * 0.9 = 149.445
    assert_eq!(quote.final_price, dec!(149.45));
}

#[test]
fn weekend_morning_adds_flat_surcharge() {
    // 2024-03-23 is a Saturday, 12 days out.
    let composer = Backend::new().build();
    let request = pomiary(LOCAL_ADDRESS, 12, "08:00").package(Package::Priority);
    let quote = composer.compose(&request, today()).unwrap();

    assert_eq!(quote.slot.slot, "E");
    assert_eq!(quote.slot.adjustment, SlotAdjustment::Surcharge(dec!(50)));
    assert_eq!(quote.steps[3].operation, Operation::Add);
    // (162 * 0.9 + 50) * 1.5
    assert_eq!(quote.final_price, dec!(293.7));
}

#[test]
fn sunday_surcharge_is_higher() {
    let composer = Backend::new().build();
    let quote = composer.compose(&pomiary(NEAR_ADDRESS, 13, "09:30"), today()).unwrap();

    assert_eq!(quote.location.location_type, LocationType::DistanceLocal);
    assert_eq!(quote.slot.adjustment, SlotAdjustment::Surcharge(dec!(60)));
    assert_eq!(quote.final_price, dec!(222));
}

#[test]
fn weekday_distance_slot_scales_with_load() {
    let composer = Backend::new().load(10).build();
    let quote = composer.compose(&pomiary(FAR_ADDRESS, 10, "10:00"), today()).unwrap();

    assert_eq!(quote.slot.slot, "C");
    // 0.85 + 0.35 * 0.5 = 1.025, rounded to 1.03
    assert_eq!(quote.slot.adjustment, SlotAdjustment::Multiplier(dec!(1.03)));
    assert_eq!(quote.location.extra_fee, dec!(50));
    // 162 * 1.1 * 1.03
    assert_eq!(quote.final_price, dec!(183.55));
}

#[test]
fn unknown_package_falls_back_to_safe() {
    let composer = Backend::new().build();
    let request = pomiary(LOCAL_ADDRESS, 10, "10:00").package(Package::from_code("platinum"));
    let quote = composer.compose(&request, today()).unwrap();

    assert_eq!(quote.package.code, Package::Safe);
    assert_eq!(quote.final_price, dec!(131.22));
}

#[test]
fn planned_visit_is_discounted() {
    let composer = Backend::new().build();
    let quote = composer.compose(&pomiary(LOCAL_ADDRESS, 30, "15:00"), today()).unwrap();

    assert_eq!(quote.when.tier, UrgencyTier::Planned);
    assert_eq!(quote.slot.slot, "B");
    // 162 * 0.9 * 0.9 * 1.0
    assert_eq!(quote.final_price, dec!(131.22));
}

#[test]
fn uncovered_slot_is_priced_at_parity() {
    let composer = Backend::new().build();
    let quote = composer.compose(&pomiary(LOCAL_ADDRESS, 10, "06:00"), today()).unwrap();

    assert_eq!(quote.slot.slot, UNKNOWN_SLOT);
    assert_eq!(quote.slot.adjustment, SlotAdjustment::Multiplier(Decimal::ONE));
    assert_eq!(quote.final_price, dec!(145.8));
}

#[test]
fn extra_slot_rule_covers_early_morning() {
    let mut rules = standard_rules();
    rules.push(SlotRule::new(
        "EARLY",
        &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        (at("06:00"), at("08:00")),
        &LocationType::ALL,
        SlotPricing::Fixed(dec!(1.1)),
    ));
    let composer = Backend::new()
        .build()
        .with_slots(SlotResolver::new(rules, SlotCoverage::Strict));

    let quote = composer.compose(&pomiary(LOCAL_ADDRESS, 10, "06:30"), today()).unwrap();
    assert_eq!(quote.slot.slot, "EARLY");
    // 162 * 0.9 * 1.0 * 1.1
    assert_eq!(quote.final_price, dec!(160.38));
}

#[test]
fn strict_coverage_aborts_at_slot_stage() {
    let config = PricingConfig {
        slot_coverage: SlotCoverage::Strict,
        ..PricingConfig::default()
    };
    let composer = Backend::new().config(config).build();
    let err = composer
        .compose(&pomiary(LOCAL_ADDRESS, 10, "06:00"), today())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Slot));
    assert!(matches!(err.root_cause(), PricingError::InvalidInput(_)));
}

#[test]
fn containment_policy_matches_longer_address() {
    let config = PricingConfig {
        match_policy: MatchPolicy::Contains,
        ..PricingConfig::default()
    };
    let composer = Backend::new().config(config).without_routes().build();
    let quote = composer
        .compose(&pomiary("Lipowa 7, Swiebodzice, Polska", 10, "10:00"), today())
        .unwrap();

    assert_eq!(quote.location.location_type, LocationType::LocalList);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn unknown_service_fails_before_any_modifier() {
    let composer = Backend::new().build();
    let request = QuoteRequest::new("malowanie", FAR_ADDRESS, in_days(10), at("10:00"));
    let err = composer.compose(&request, today()).unwrap_err();

    assert!(matches!(err, PricingError::NotFound(_)));
    assert_eq!(composer.distances().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn blank_fields_are_invalid_input() {
    let composer = Backend::new().build();

    let err = composer
        .compose(&QuoteRequest::new(" ", LOCAL_ADDRESS, in_days(3), at("10:00")), today())
        .unwrap_err();
    assert!(matches!(err, PricingError::InvalidInput(_)));

    let err = composer
        .compose(&QuoteRequest::new("pomiary", "", in_days(3), at("10:00")), today())
        .unwrap_err();
    assert!(matches!(err, PricingError::InvalidInput(_)));
    assert_eq!(composer.prices().calls.load(Ordering::SeqCst), 0);
}

#[test]
fn price_sheet_outage_is_dependency_failure() {
    let composer = Backend::new().prices_offline().build();
    let err = composer
        .compose(&pomiary(LOCAL_ADDRESS, 10, "10:00"), today())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::BasePrice));
    assert!(matches!(err.root_cause(), PricingError::LookupUnavailable(_)));
}

#[test]
fn missing_route_aborts_without_price() {
    let composer = Backend::new().without_routes().build();
    let err = composer
        .compose(&pomiary(FAR_ADDRESS, 10, "10:00"), today())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Location));
    assert!(matches!(err.root_cause(), PricingError::LookupUnavailable(_)));
}

#[test]
fn oversized_amounts_fail_instead_of_panicking() {
    let huge_fee = Backend::new()
        .config(PricingConfig {
            fee_per_km: Decimal::MAX,
            ..PricingConfig::default()
        })
        .build();
    let err = huge_fee
        .compose(&pomiary(FAR_ADDRESS, 10, "10:00"), today())
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Location));
    assert!(matches!(err.root_cause(), PricingError::LookupUnavailable(_)));

    let huge_modifier = Backend::new()
        .config(PricingConfig {
            far_modifier: Decimal::MAX,
            ..PricingConfig::default()
        })
        .build();
    let err = huge_modifier
        .compose(&pomiary(FAR_ADDRESS, 10, "10:00"), today())
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Location));
    assert!(err.to_string().contains("overflows"));
}

#[test]
fn address_sheet_outage_aborts() {
    let composer = Backend::new().addresses_offline().build();
    let err = composer
        .compose(&pomiary(LOCAL_ADDRESS, 10, "10:00"), today())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Location));
}

#[test]
fn past_date_fails_at_urgency_stage() {
    let composer = Backend::new().build();
    let yesterday = today().pred_opt().unwrap();
    let request = QuoteRequest::new("pomiary", LOCAL_ADDRESS, yesterday, at("10:00"));
    let err = composer.compose(&request, today()).unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Urgency));
    assert!(matches!(err.root_cause(), PricingError::InvalidInput(_)));
}

#[test]
fn calendar_outage_prices_as_idle_day() {
    let composer = Backend::new().calendar_offline().build();
    let quote = composer.compose(&pomiary(FAR_ADDRESS, 10, "10:00"), today()).unwrap();

    assert_eq!(quote.slot.slot, "C");
    assert_eq!(quote.slot.adjustment, SlotAdjustment::Multiplier(dec!(0.85)));
}
