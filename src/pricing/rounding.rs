//! Numeric helpers shared by every quote: duration snapping and cent rounding.
//!
//! Amounts are carried as [`Decimal`] cents at [`CENTS_SCALE`] decimal places
//! until the final rounding step. Midpoints always round away from zero, which
//! for the non-negative amounts of a quote is plain half-up.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{DurationSteps, RoundingMode, RoundingRule};

/// Sub-cent precision kept between pricing steps (1/1000 of a cent).
pub const CENTS_SCALE: u32 = 3;

pub fn normalize_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_to_cent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an integral cent amount, saturating at the `i64` bounds.
pub fn whole_cents(value: Decimal) -> i64 {
    round_to_cent(value).to_i64().unwrap_or(if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Snaps a requested duration onto the engine's grid.
///
/// The value is first bounded into `[min, max]`. With a positive step it then
/// moves to the closer of the two surrounding grid points `min + k * step`;
/// ties go to the upper point. When the upper point would lie beyond `max`
/// the lower point is used, so the result is always on the grid. A grid whose
/// `max` is below its `min` collapses to `min`.
pub fn clamp_duration(requested: u32, steps: &DurationSteps) -> u32 {
    let min = steps.min;
    let max = steps.max.max(min);
    let bounded = requested.clamp(min, max);
    if steps.step == 0 {
        return bounded;
    }

    let remainder = (bounded - min) % steps.step;
    if remainder == 0 {
        return bounded;
    }

    let lower = bounded - remainder;
    match lower.checked_add(steps.step).filter(|upper| *upper <= max) {
        Some(upper) if upper - bounded <= bounded - lower => upper,
        _ => lower,
    }
}

/// Rounds a cent amount onto the rule's increment grid and returns whole cents.
///
/// Without a rule, or with a non-positive increment, the amount is rounded to
/// the nearest cent.
pub fn apply_rounding(value_cents: Decimal, rule: Option<&RoundingRule>) -> i64 {
    let rounded = match rule {
        Some(rule) if rule.increment_cents > Decimal::ZERO => {
            let units = value_cents / rule.increment_cents;
            let units = match rule.mode {
                RoundingMode::Nearest => round_to_cent(units),
                RoundingMode::Up => units.ceil(),
                RoundingMode::Down => units.floor(),
            };
            units * rule.increment_cents
        }
        _ => value_cents,
    };
    whole_cents(rounded)
}
