//! Load-sensitive multiplier between a floor and a ceiling.

use rust_decimal::{Decimal, RoundingStrategy};

/// Bookings at which a day counts as fully loaded.
pub const SATURATION_POINT: u32 = 20;

/// Linear interpolation from `floor` (idle day) to `ceiling` (saturated day).
pub fn interpolate(load: u32, floor: Decimal, ceiling: Decimal) -> Decimal {
    interpolate_with(load, floor, ceiling, SATURATION_POINT)
}

pub fn interpolate_with(load: u32, floor: Decimal, ceiling: Decimal, saturation_point: u32) -> Decimal {
    if load == 0 {
        return floor;
    }
    if load >= saturation_point {
        return ceiling;
    }

    let share = Decimal::from(load) / Decimal::from(saturation_point);
    (floor + (ceiling - floor) * share).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
