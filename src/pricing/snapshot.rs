//! Request and result value objects.
//!
//! [`PricingSnapshot`] is persisted verbatim next to orders as the record of
//! what was charged; its serialized field names are a stable schema.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::addons::AddonValue;
use crate::models::{DurationSteps, EngineId, EnginePricingDefinition, MemberTier, RoundingRule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    pub engine_id: EngineId,
    pub duration_sec: u32,
    pub resolution: String,
    /// Raw tier name; unrecognised values price as [`MemberTier::Member`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_tier: Option<String>,
    #[serde(default)]
    pub addons: HashMap<String, AddonValue>,
}

impl PricingInput {
    pub fn new(
        engine_id: impl Into<EngineId>,
        duration_sec: u32,
        resolution: impl Into<String>,
    ) -> Self {
        Self {
            engine_id: engine_id.into(),
            duration_sec,
            resolution: resolution.into(),
            member_tier: None,
            addons: HashMap::new(),
        }
    }

    pub fn member_tier(mut self, tier: impl Into<String>) -> Self {
        self.member_tier = Some(tier.into());
        self
    }

    pub fn tier(self, tier: MemberTier) -> Self {
        self.member_tier(tier.as_str())
    }

    pub fn addon(mut self, key: impl Into<String>, value: impl Into<AddonValue>) -> Self {
        self.addons.insert(key.into(), value.into());
        self
    }

    pub fn resolved_tier(&self) -> MemberTier {
        MemberTier::resolve(self.member_tier.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseLine {
    /// Billed duration after snapping onto the engine grid.
    pub seconds: u32,
    /// Per-second rate in currency units.
    pub rate: Decimal,
    pub unit: String,
    pub amount_cents: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonLine {
    #[serde(rename = "type")]
    pub addon_type: String,
    pub amount_cents: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginLine {
    pub amount_cents: Decimal,
    pub percent_applied: Decimal,
    pub flat_cents: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountLine {
    pub amount_cents: Decimal,
    pub percent_applied: Decimal,
    pub tier: MemberTier,
}

/// Inputs echoed back for audit; never used to recompute a charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_policy_hint: Option<String>,
    pub resolution_multiplier: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding: Option<RoundingRule>,
    pub duration_steps: DurationSteps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    pub base_unit_price_cents: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSnapshot {
    pub currency: String,
    pub total_cents: i64,
    pub subtotal_before_discount_cents: i64,
    pub base: BaseLine,
    pub addons: Vec<AddonLine>,
    pub margin: MarginLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountLine>,
    pub membership_tier: MemberTier,
    pub platform_fee_cents: i64,
    pub vendor_share_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_account_id: Option<String>,
    pub meta: QuoteMeta,
}

impl PricingSnapshot {
    pub fn addons_total_cents(&self) -> Decimal {
        self.addons.iter().map(|line| line.amount_cents).sum()
    }

    pub fn discount_cents(&self) -> Decimal {
        self.discount
            .as_ref()
            .map(|discount| discount.amount_cents)
            .unwrap_or_default()
    }

    /// True when the platform fee and vendor share add up to the total.
    pub fn is_balanced(&self) -> bool {
        self.platform_fee_cents >= 0
            && self.vendor_share_cents >= 0
            && self.platform_fee_cents + self.vendor_share_cents == self.total_cents
    }
}

/// A snapshot plus the context it was computed from.
#[derive(Debug, Clone)]
pub struct PricingQuote {
    pub engine_id: EngineId,
    pub resolution: String,
    pub member_tier: MemberTier,
    pub snapshot: PricingSnapshot,
    pub definition: Arc<EnginePricingDefinition>,
    pub effective_duration_sec: u32,
}

impl PricingQuote {
    pub fn total_cents(&self) -> i64 {
        self.snapshot.total_cents
    }

    pub fn into_snapshot(self) -> PricingSnapshot {
        self.snapshot
    }
}
