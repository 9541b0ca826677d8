use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::rounding::normalize_cents;
use super::snapshot::AddonLine;
use crate::models::EnginePricingDefinition;

/// Requested state of an add-on: a flag, a number where zero means off, or
/// `null`.
///
/// The value only switches the add-on on; the price comes from the engine's rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddonValue {
    Flag(bool),
    Quantity(Decimal),
    Off,
}

impl AddonValue {
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Flag(enabled) => *enabled,
            Self::Quantity(quantity) => !quantity.is_zero(),
            Self::Off => false,
        }
    }
}

impl From<bool> for AddonValue {
    fn from(enabled: bool) -> Self {
        Self::Flag(enabled)
    }
}

impl From<Decimal> for AddonValue {
    fn from(quantity: Decimal) -> Self {
        Self::Quantity(quantity)
    }
}

impl From<u32> for AddonValue {
    fn from(quantity: u32) -> Self {
        Self::Quantity(Decimal::from(quantity))
    }
}

/// Prices one add-on over the billed duration.
///
/// Returns `None` when the add-on is off, when the engine has no rule for
/// `key`, or when the rule works out to exactly zero cents.
pub fn addon_amount(
    key: &str,
    requested: Option<&AddonValue>,
    definition: &EnginePricingDefinition,
    effective_duration_sec: u32,
) -> Option<AddonLine> {
    if !requested.is_some_and(AddonValue::is_enabled) {
        return None;
    }
    let rule = definition.addons.get(key)?;

    let per_second = rule.per_second_cents.unwrap_or_default();
    let flat = rule.flat_cents.unwrap_or_default();
    let amount_cents = normalize_cents(per_second * Decimal::from(effective_duration_sec) + flat);
    if amount_cents.is_zero() {
        return None;
    }

    Some(AddonLine {
        addon_type: key.to_string(),
        amount_cents,
    })
}
