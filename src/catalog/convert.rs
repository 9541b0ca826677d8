//! Catalog entry to [`EnginePricingDefinition`].

use std::collections::{BTreeMap, HashMap};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::engine::{CatalogEngine, InputField, LegacyPricing, PricingDetails, RateTable};
use crate::config::PricingSettings;
use crate::models::{AddonRule, DEFAULT_RESOLUTION_KEY, DurationSteps, EnginePricingDefinition};
use crate::pricing::rounding::round_to_cent;

const DURATION_FIELDS: [&str; 2] = ["duration_seconds", "duration"];
const METADATA_SOURCE: &str = "catalog";
const UNIT_MULTIPLIER_TOLERANCE: Decimal = dec!(0.000001);

struct BaseRate {
    cents: Decimal,
    currency: String,
    /// Per-resolution cent rates the multipliers are derived from.
    by_resolution: Option<Vec<(String, Decimal)>>,
}

fn to_cents(units: Decimal) -> Decimal {
    units * Decimal::ONE_HUNDRED
}

fn legacy_rates_in_cents(pricing: Option<&LegacyPricing>) -> Option<Vec<(String, Decimal)>> {
    pricing?.by_resolution.as_ref().map(|rates| {
        rates
            .iter()
            .map(|(resolution, units)| (resolution.clone(), to_cents(*units)))
            .collect()
    })
}

/// Base rate from `pricingDetails.perSecondCents`, else the legacy block.
fn resolve_base_rate(engine: &CatalogEngine, settings: &PricingSettings) -> Option<BaseRate> {
    let details = engine.pricing_details.as_ref();
    let legacy = engine.pricing.as_ref();
    let currency = details
        .and_then(|d| d.currency.clone())
        .or_else(|| legacy.and_then(|p| p.currency.clone()))
        .unwrap_or_else(|| settings.default_currency.clone());

    if let Some(rates) = details.and_then(|d| d.per_second_cents.as_ref()) {
        let first_resolution = rates
            .by_resolution
            .as_ref()
            .and_then(|pairs| pairs.first())
            .map(|(_, cents)| *cents);
        if let Some(cents) = rates.default.or(first_resolution) {
            return Some(BaseRate {
                cents,
                currency,
                by_resolution: rates.by_resolution.clone(),
            });
        }
    }

    let legacy = legacy?;
    if let Some(base) = legacy.base.filter(|base| *base > Decimal::ZERO) {
        return Some(BaseRate {
            cents: to_cents(base),
            currency,
            by_resolution: legacy_rates_in_cents(Some(legacy)),
        });
    }

    let by_resolution = legacy_rates_in_cents(Some(legacy))?;
    let cents = by_resolution.first()?.1;
    Some(BaseRate {
        cents,
        currency,
        by_resolution: Some(by_resolution),
    })
}

fn floor_seconds(value: f64) -> u32 {
    if value.is_finite() {
        value.floor().clamp(0.0, u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Reads a default such as `8`, `8.4` or `"8s"` as whole seconds.
fn parse_default_seconds(value: &serde_json::Value) -> Option<u32> {
    let seconds = match value {
        serde_json::Value::Number(number) => number.as_f64()?,
        serde_json::Value::String(label) => {
            let numeric: String = label
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            numeric.parse::<f64>().ok().filter(|seconds| *seconds > 0.0)?
        }
        _ => return None,
    };
    Decimal::from_f64(seconds)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}

fn duration_field(engine: &CatalogEngine) -> Option<&InputField> {
    let schema = engine.input_schema.as_ref()?;
    DURATION_FIELDS.iter().find_map(|id| schema.field(id))
}

/// Duration grid from the schema's duration field, falling back to the
/// engine's declared maximum, then the platform default.
pub fn resolve_duration_steps(engine: &CatalogEngine, settings: &PricingSettings) -> DurationSteps {
    let field = duration_field(engine);
    let min = field.and_then(|f| f.min).map_or(1, floor_seconds).max(1);
    let max = field
        .and_then(|f| f.max)
        .or_else(|| engine.pricing_details.as_ref().and_then(|d| d.max_duration_sec))
        .or(engine.max_duration_sec)
        .map_or(settings.default_max_duration_sec, floor_seconds)
        .max(min);
    let step = field.and_then(|f| f.step).map_or(1, floor_seconds).max(1);

    let steps = DurationSteps::new(min, max, step);
    match field.and_then(|f| f.default.as_ref()).and_then(parse_default_seconds) {
        Some(default) => steps.with_default(default),
        None => steps,
    }
}

/// Multiplier of each resolution against the base rate. A `"default"` entry
/// at 1x is added unless some resolution already prices at the base rate.
fn resolution_multipliers(
    base_cents: Decimal,
    by_resolution: Option<&[(String, Decimal)]>,
) -> HashMap<String, Decimal> {
    let mut multipliers: HashMap<String, Decimal> = by_resolution
        .unwrap_or_default()
        .iter()
        .map(|(resolution, cents)| (resolution.clone(), *cents / base_cents))
        .collect();

    let has_unit = multipliers
        .values()
        .any(|multiplier| (*multiplier - Decimal::ONE).abs() < UNIT_MULTIPLIER_TOLERANCE);
    if !has_unit {
        multipliers.insert(DEFAULT_RESOLUTION_KEY.into(), Decimal::ONE);
    }
    multipliers
}

fn resolve_addons(engine: &CatalogEngine) -> BTreeMap<String, AddonRule> {
    if let Some(addons) = engine.pricing_details.as_ref().and_then(|d| d.addons.as_ref()) {
        return addons.clone();
    }
    let Some(legacy) = engine.pricing.as_ref().and_then(|p| p.addons.as_ref()) else {
        return BTreeMap::new();
    };
    legacy
        .iter()
        .filter_map(|(key, addon)| {
            let addon = (*addon)?;
            Some((
                key.clone(),
                AddonRule {
                    per_second_cents: addon.per_second.map(|units| round_to_cent(to_cents(units))),
                    flat_cents: addon.flat.map(|units| round_to_cent(to_cents(units))),
                },
            ))
        })
        .collect()
}

/// Converts one catalog entry, or `None` when it has no positive base rate.
pub fn build_pricing_definition(
    engine: &CatalogEngine,
    settings: &PricingSettings,
) -> Option<EnginePricingDefinition> {
    if engine.id.trim().is_empty() {
        return None;
    }
    let base = resolve_base_rate(engine, settings).filter(|base| base.cents > Decimal::ZERO)?;

    let mut metadata = engine.metadata.clone();
    metadata
        .entry("source".into())
        .or_insert_with(|| serde_json::Value::String(METADATA_SOURCE.into()));

    Some(EnginePricingDefinition {
        engine_id: engine.id.clone(),
        label: engine.label.clone(),
        version: engine.version.clone(),
        currency: base.currency,
        base_unit_price_cents: base.cents,
        duration_steps: resolve_duration_steps(engine, settings),
        resolution_multipliers: resolution_multipliers(base.cents, base.by_resolution.as_deref()),
        member_tier_discounts: settings.member_discounts,
        min_charge_cents: None,
        rounding: Some(settings.rounding()),
        tax_policy_hint: Some(settings.tax_policy_hint.clone()),
        addons: resolve_addons(engine),
        platform_fee_pct: engine.platform_fee_pct.unwrap_or(settings.platform_fee_pct),
        platform_fee_flat_cents: Decimal::ZERO,
        availability: engine.availability.clone(),
        metadata,
    })
}

fn cents_to_units(table: &RateTable) -> (Option<Decimal>, Option<Vec<(String, Decimal)>>) {
    let base = table.default.map(|cents| cents / Decimal::ONE_HUNDRED);
    let by_resolution = table.by_resolution.as_ref().map(|rates| {
        rates
            .iter()
            .map(|(resolution, cents)| (resolution.clone(), cents / Decimal::ONE_HUNDRED))
            .collect()
    });
    (base, by_resolution)
}

/// Replaces the entry's `pricingDetails` and re-derives its legacy block
/// from it. Without an override the entry is returned unchanged.
pub fn apply_pricing_override(
    mut engine: CatalogEngine,
    details: Option<PricingDetails>,
) -> CatalogEngine {
    let Some(details) = details else {
        return engine;
    };
    let (base, by_resolution) = details
        .per_second_cents
        .as_ref()
        .map(cents_to_units)
        .unwrap_or_default();

    engine.pricing = Some(LegacyPricing {
        unit: Some("sec".into()),
        base,
        by_resolution,
        currency: details.currency.clone(),
        addons: None,
    });
    engine.pricing_details = Some(details);
    engine
}
