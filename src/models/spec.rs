use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tier::MemberTier;

pub type EngineId = String;

/// Multiplier key used when a request names a resolution the engine does not list.
pub const DEFAULT_RESOLUTION_KEY: &str = "default";

/// Legal duration grid of an engine, in whole seconds.
///
/// A `step` of zero means the range is continuous: any value in `[min, max]`
/// is billable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationSteps {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<u32>,
}

impl DurationSteps {
    pub const fn new(min: u32, max: u32, step: u32) -> Self {
        Self {
            min,
            max,
            step,
            default: None,
        }
    }

    pub fn with_default(mut self, default: u32) -> Self {
        self.default = Some(default);
        self
    }

    pub fn clamp(&self, requested: u32) -> u32 {
        crate::pricing::clamp_duration(requested, self)
    }

    /// Every billable duration on the grid, ascending.
    pub fn choices(&self) -> Vec<u32> {
        if self.min > self.max {
            return vec![self.min];
        }
        let step = self.step.max(1) as usize;
        (self.min..=self.max).step_by(step).collect()
    }

    /// The duration a caller should preselect: the declared default snapped
    /// onto the grid, or the minimum.
    pub fn preferred(&self) -> u32 {
        self.clamp(self.default.unwrap_or(self.min))
    }
}

impl Default for DurationSteps {
    fn default() -> Self {
        Self::new(1, 30, 1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    #[default]
    Nearest,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundingRule {
    pub mode: RoundingMode,
    pub increment_cents: Decimal,
}

impl RoundingRule {
    pub fn new(mode: RoundingMode, increment_cents: Decimal) -> Self {
        Self {
            mode,
            increment_cents,
        }
    }

    pub fn nearest_cent() -> Self {
        Self::new(RoundingMode::Nearest, Decimal::ONE)
    }
}

/// Linear surcharge (or credit, when negative) for one optional feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_second_cents: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_cents: Option<Decimal>,
}

impl AddonRule {
    pub fn per_second(cents: Decimal) -> Self {
        Self {
            per_second_cents: Some(cents),
            flat_cents: None,
        }
    }

    pub fn flat(cents: Decimal) -> Self {
        Self {
            per_second_cents: None,
            flat_cents: Some(cents),
        }
    }

    pub fn with_flat(mut self, cents: Decimal) -> Self {
        self.flat_cents = Some(cents);
        self
    }
}

/// Discount fraction in `[0, 1)` granted to each member tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDiscounts {
    #[serde(default)]
    pub member: Decimal,
    #[serde(default)]
    pub plus: Decimal,
    #[serde(default)]
    pub pro: Decimal,
}

impl TierDiscounts {
    pub fn new(member: Decimal, plus: Decimal, pro: Decimal) -> Self {
        Self { member, plus, pro }
    }

    pub fn get(&self, tier: MemberTier) -> Decimal {
        match tier {
            MemberTier::Member => self.member,
            MemberTier::Plus => self.plus,
            MemberTier::Pro => self.pro,
        }
    }

    pub fn set(&mut self, tier: MemberTier, fraction: Decimal) {
        match tier {
            MemberTier::Member => self.member = fraction,
            MemberTier::Plus => self.plus = fraction,
            MemberTier::Pro => self.pro = fraction,
        }
    }
}

/// Immutable price shape of a single engine.
///
/// Produced once by the catalog step (or [`DefinitionBuilder`]) and shared
/// read-only by every quote afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnginePricingDefinition {
    pub engine_id: EngineId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub currency: String,
    pub base_unit_price_cents: Decimal,
    pub duration_steps: DurationSteps,
    pub resolution_multipliers: HashMap<String, Decimal>,
    #[serde(default)]
    pub member_tier_discounts: TierDiscounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_charge_cents: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding: Option<RoundingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_policy_hint: Option<String>,
    #[serde(default)]
    pub addons: BTreeMap<String, AddonRule>,
    #[serde(default)]
    pub platform_fee_pct: Decimal,
    #[serde(default)]
    pub platform_fee_flat_cents: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EnginePricingDefinition {
    pub fn builder(
        engine_id: impl Into<EngineId>,
        base_unit_price_cents: Decimal,
    ) -> DefinitionBuilder {
        DefinitionBuilder::new(engine_id, base_unit_price_cents)
    }

    /// Exact multiplier for `resolution`, falling back to the `"default"` entry.
    pub fn resolution_multiplier(&self, resolution: &str) -> Option<Decimal> {
        self.resolution_multipliers
            .get(resolution)
            .or_else(|| self.resolution_multipliers.get(DEFAULT_RESOLUTION_KEY))
            .copied()
    }

    pub fn supports_resolution(&self, resolution: &str) -> bool {
        self.resolution_multiplier(resolution).is_some()
    }

    /// Named resolutions, excluding the fallback key, sorted for display.
    pub fn resolutions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .resolution_multipliers
            .keys()
            .map(String::as_str)
            .filter(|key| *key != DEFAULT_RESOLUTION_KEY)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn discount_for(&self, tier: MemberTier) -> Decimal {
        self.member_tier_discounts.get(tier)
    }
}

/// Builds an [`EnginePricingDefinition`] from primitive fields.
#[derive(Debug, Clone)]
pub struct DefinitionBuilder {
    definition: EnginePricingDefinition,
}

impl DefinitionBuilder {
    pub fn new(engine_id: impl Into<EngineId>, base_unit_price_cents: Decimal) -> Self {
        Self {
            definition: EnginePricingDefinition {
                engine_id: engine_id.into(),
                label: None,
                version: None,
                currency: "USD".into(),
                base_unit_price_cents,
                duration_steps: DurationSteps::default(),
                resolution_multipliers: HashMap::new(),
                member_tier_discounts: TierDiscounts::default(),
                min_charge_cents: None,
                rounding: None,
                tax_policy_hint: None,
                addons: BTreeMap::new(),
                platform_fee_pct: Decimal::ZERO,
                platform_fee_flat_cents: Decimal::ZERO,
                availability: None,
                metadata: HashMap::new(),
            },
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.definition.label = Some(label.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.definition.version = Some(version.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.definition.currency = currency.into();
        self
    }

    pub fn durations(mut self, steps: DurationSteps) -> Self {
        self.definition.duration_steps = steps;
        self
    }

    pub fn resolution(mut self, resolution: impl Into<String>, multiplier: Decimal) -> Self {
        self.definition
            .resolution_multipliers
            .insert(resolution.into(), multiplier);
        self
    }

    pub fn discount(mut self, tier: MemberTier, fraction: Decimal) -> Self {
        self.definition.member_tier_discounts.set(tier, fraction);
        self
    }

    pub fn discounts(mut self, discounts: TierDiscounts) -> Self {
        self.definition.member_tier_discounts = discounts;
        self
    }

    pub fn min_charge_cents(mut self, cents: Decimal) -> Self {
        self.definition.min_charge_cents = Some(cents);
        self
    }

    pub fn rounding(mut self, rule: RoundingRule) -> Self {
        self.definition.rounding = Some(rule);
        self
    }

    pub fn tax_policy_hint(mut self, hint: impl Into<String>) -> Self {
        self.definition.tax_policy_hint = Some(hint.into());
        self
    }

    pub fn addon(mut self, key: impl Into<String>, rule: AddonRule) -> Self {
        self.definition.addons.insert(key.into(), rule);
        self
    }

    pub fn platform_fee(mut self, pct: Decimal, flat_cents: Decimal) -> Self {
        self.definition.platform_fee_pct = pct;
        self.definition.platform_fee_flat_cents = flat_cents;
        self
    }

    pub fn availability(mut self, availability: impl Into<String>) -> Self {
        self.definition.availability = Some(availability.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.definition.metadata.insert(key.into(), value);
        self
    }

    /// Finishes the definition. When no resolution was named, the engine
    /// prices every resolution at the base rate through a `"default"` entry.
    pub fn build(mut self) -> EnginePricingDefinition {
        if self.definition.resolution_multipliers.is_empty() {
            self.definition
                .resolution_multipliers
                .insert(DEFAULT_RESOLUTION_KEY.into(), Decimal::ONE);
        }
        self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_inserts_default_multiplier() {
        let definition = EnginePricingDefinition::builder("veo-3", dec!(40)).build();
        assert_eq!(definition.resolution_multiplier("1080p"), Some(dec!(1)));
        assert!(definition.resolutions().is_empty());
    }

    #[test]
    fn test_resolution_fallback() {
        let definition = EnginePricingDefinition::builder("veo-3", dec!(40))
            .resolution("720p", dec!(1))
            .resolution("1080p", dec!(1.5))
            .build();

        assert_eq!(definition.resolution_multiplier("1080p"), Some(dec!(1.5)));
        assert_eq!(definition.resolution_multiplier("4k"), None);
        assert!(!definition.supports_resolution("4k"));
        assert_eq!(definition.resolutions(), vec!["1080p", "720p"]);
    }

    #[test]
    fn test_tier_discounts() {
        let mut discounts = TierDiscounts::new(dec!(0), dec!(0.05), dec!(0.1));
        assert_eq!(discounts.get(MemberTier::Pro), dec!(0.1));
        discounts.set(MemberTier::Member, dec!(0.02));
        assert_eq!(discounts.get(MemberTier::Member), dec!(0.02));
    }

    #[test]
    fn test_duration_choices() {
        let steps = DurationSteps::new(4, 8, 2);
        assert_eq!(steps.choices(), vec![4, 6, 8]);
        assert_eq!(steps.preferred(), 4);
        assert_eq!(steps.with_default(7).preferred(), 8);
        assert_eq!(DurationSteps::new(3, 5, 0).choices(), vec![3, 4, 5]);
    }

    #[test]
    fn test_definition_serializes_camel_case() {
        let definition = EnginePricingDefinition::builder("veo-3", dec!(40))
            .addon("audio", AddonRule::per_second(dec!(5)))
            .rounding(RoundingRule::nearest_cent())
            .build();
        let json = serde_json::to_value(&definition).unwrap();

        assert_eq!(json["engineId"], "veo-3");
        assert_eq!(json["durationSteps"]["step"], 1);
        assert_eq!(json["rounding"]["mode"], "nearest");
        assert!(json["addons"]["audio"]["perSecondCents"].is_number());
    }
}
