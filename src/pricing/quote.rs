//! The quote computation: a pure function of one definition and one request.
//!
//! Revenue split: a member discount is charged against the platform margin
//! first. The vendor share only shrinks once the discount exceeds the margin.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::addons::addon_amount;
use super::rounding::{
    apply_rounding, clamp_duration, normalize_cents, round_to_cent, whole_cents,
};
use super::snapshot::{
    AddonLine, BaseLine, DiscountLine, MarginLine, PricingInput, PricingQuote, PricingSnapshot,
    QuoteMeta,
};
use crate::models::EnginePricingDefinition;

const BASE_UNIT: &str = "sec";

/// Prices `input` against `definition`.
///
/// Never fails: durations are snapped onto the grid, unknown tiers price as
/// `member` and unknown add-ons are ignored. A resolution without a
/// multiplier prices at 1x; callers that must reject it check
/// [`EnginePricingDefinition::supports_resolution`] first.
pub fn compute_snapshot(
    definition: &EnginePricingDefinition,
    input: &PricingInput,
) -> PricingSnapshot {
    let member_tier = input.resolved_tier();
    let duration = clamp_duration(input.duration_sec, &definition.duration_steps);
    let resolution_multiplier = definition
        .resolution_multiplier(&input.resolution)
        .unwrap_or(Decimal::ONE);
    let base_rate_cents = normalize_cents(definition.base_unit_price_cents * resolution_multiplier);

    let mut base_amount_cents = normalize_cents(base_rate_cents * Decimal::from(duration));
    if let Some(min_charge) = definition.min_charge_cents
        && base_amount_cents < min_charge
    {
        base_amount_cents = min_charge;
    }

    let addons: Vec<AddonLine> = definition
        .addons
        .keys()
        .filter_map(|key| addon_amount(key, input.addons.get(key), definition, duration))
        .collect();
    let addons_total: Decimal = addons.iter().map(|line| line.amount_cents).sum();
    let subtotal_before_margin = normalize_cents(base_amount_cents + addons_total);

    let fee_pct = definition.platform_fee_pct;
    let fee_flat = definition.platform_fee_flat_cents;
    let margin_from_pct = if fee_pct > Decimal::ZERO {
        round_to_cent(subtotal_before_margin * fee_pct)
    } else {
        Decimal::ZERO
    };
    let margin_amount = normalize_cents(margin_from_pct + fee_flat).max(Decimal::ZERO);
    let subtotal_before_discount = normalize_cents(subtotal_before_margin + margin_amount);

    let discount_pct = definition.discount_for(member_tier);
    let discount_amount = if discount_pct > Decimal::ZERO {
        round_to_cent(subtotal_before_discount * discount_pct)
    } else {
        Decimal::ZERO
    };

    let rounding = definition.rounding.as_ref();
    let total_cents = apply_rounding(subtotal_before_discount - discount_amount, rounding).max(0);
    // Unrounded so the line items add up; never below an `Up`-rounded total.
    let subtotal_before_discount_cents = whole_cents(subtotal_before_discount).max(total_cents);

    let discount_applied_to_margin = margin_amount.min(discount_amount);
    let platform_fee_cents =
        whole_cents(margin_amount - discount_applied_to_margin).clamp(0, total_cents);
    let vendor_share_cents = total_cents - platform_fee_cents;

    let discount = (!discount_amount.is_zero()).then(|| DiscountLine {
        amount_cents: discount_amount,
        percent_applied: discount_pct,
        tier: member_tier,
    });

    tracing::debug!(
        engine_id = %definition.engine_id,
        resolution = %input.resolution,
        duration,
        tier = %member_tier,
        total_cents,
        platform_fee_cents,
        vendor_share_cents,
        "pricing quote computed"
    );

    PricingSnapshot {
        currency: definition.currency.clone(),
        total_cents,
        subtotal_before_discount_cents,
        base: BaseLine {
            seconds: duration,
            rate: base_rate_cents / Decimal::ONE_HUNDRED,
            unit: BASE_UNIT.into(),
            amount_cents: base_amount_cents,
        },
        addons,
        margin: MarginLine {
            amount_cents: margin_amount,
            percent_applied: fee_pct,
            flat_cents: fee_flat,
            rule_id: None,
        },
        discount,
        membership_tier: member_tier,
        platform_fee_cents,
        vendor_share_cents,
        vendor_account_id: None,
        meta: QuoteMeta {
            tax_policy_hint: definition.tax_policy_hint.clone(),
            resolution_multiplier,
            rounding: definition.rounding,
            duration_steps: definition.duration_steps,
            availability: definition.availability.clone(),
            base_unit_price_cents: definition.base_unit_price_cents,
            rule_id: None,
            rule_currency: None,
            engine_label: definition.label.clone(),
            engine_version: definition.version.clone(),
        },
    }
}

pub fn compute_quote(
    definition: Arc<EnginePricingDefinition>,
    input: &PricingInput,
) -> PricingQuote {
    let snapshot = compute_snapshot(&definition, input);
    PricingQuote {
        engine_id: definition.engine_id.clone(),
        resolution: input.resolution.clone(),
        member_tier: snapshot.membership_tier,
        effective_duration_sec: snapshot.base.seconds,
        snapshot,
        definition,
    }
}
