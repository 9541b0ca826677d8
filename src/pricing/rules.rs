//! Margin rules layered over catalog definitions.
//!
//! A rule overrides an engine's platform fee and can synthesize per-second
//! surcharges for the `audio` and `upscale4k` add-ons when the engine itself
//! does not price them.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::rounding::round_to_cent;
use crate::models::{AddonRule, EnginePricingDefinition};

pub const AUDIO_ADDON: &str = "audio";
pub const UPSCALE_ADDON: &str = "upscale4k";
pub const DEFAULT_RULE_ID: &str = "default";

const VENDOR_ACCOUNT_KEY: &str = "vendorAccountId";
const RULE_ID_KEY: &str = "ruleId";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default)]
    pub margin_percent: Decimal,
    #[serde(default)]
    pub margin_flat_cents: Decimal,
    #[serde(default)]
    pub surcharge_audio_percent: Decimal,
    #[serde(default)]
    pub surcharge_upscale_percent: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_account_id: Option<String>,
}

impl Default for PricingRule {
    fn default() -> Self {
        Self {
            id: DEFAULT_RULE_ID.into(),
            engine_id: None,
            resolution: None,
            margin_percent: dec!(0.2),
            margin_flat_cents: Decimal::ZERO,
            surcharge_audio_percent: dec!(0.2),
            surcharge_upscale_percent: dec!(0.5),
            currency: "USD".into(),
            vendor_account_id: None,
        }
    }
}

impl PricingRule {
    /// A rule with a generated id and the default surcharges.
    pub fn scoped(engine_id: Option<&str>, resolution: Option<&str>) -> Self {
        Self {
            id: generate_rule_id(engine_id, resolution),
            engine_id: engine_id.map(str::to_string),
            resolution: resolution.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn margin(mut self, percent: Decimal, flat_cents: Decimal) -> Self {
        self.margin_percent = percent;
        self.margin_flat_cents = flat_cents;
        self
    }

    pub fn surcharges(mut self, audio_percent: Decimal, upscale_percent: Decimal) -> Self {
        self.surcharge_audio_percent = audio_percent;
        self.surcharge_upscale_percent = upscale_percent;
        self
    }

    pub fn vendor_account(mut self, account_id: impl Into<String>) -> Self {
        self.vendor_account_id = Some(account_id.into());
        self
    }

    fn is_global(&self) -> bool {
        self.engine_id.is_none() && self.resolution.is_none()
    }

    /// Vendor account for payouts: the rule's own, else the engine's metadata.
    pub fn vendor_account_for(&self, definition: &EnginePricingDefinition) -> Option<String> {
        self.vendor_account_id.clone().or_else(|| {
            definition
                .metadata
                .get(VENDOR_ACCOUNT_KEY)
                .and_then(|value| value.as_str())
                .map(str::to_string)
        })
    }

    /// Copy of `definition` with this rule's margin and surcharges applied.
    pub fn apply(&self, definition: &EnginePricingDefinition) -> EnginePricingDefinition {
        let mut augmented = definition.clone();
        augmented.platform_fee_pct = self.margin_percent;
        augmented.platform_fee_flat_cents = self.margin_flat_cents;
        augmented
            .metadata
            .insert(RULE_ID_KEY.into(), serde_json::Value::String(self.id.clone()));
        if let Some(vendor) = self.vendor_account_for(definition) {
            augmented
                .metadata
                .insert(VENDOR_ACCOUNT_KEY.into(), serde_json::Value::String(vendor));
        }

        for (key, percent) in [
            (AUDIO_ADDON, self.surcharge_audio_percent),
            (UPSCALE_ADDON, self.surcharge_upscale_percent),
        ] {
            if augmented.addons.contains_key(key) || percent <= Decimal::ZERO {
                continue;
            }
            let per_second = round_to_cent(augmented.base_unit_price_cents * percent);
            if per_second > Decimal::ZERO {
                augmented
                    .addons
                    .insert(key.to_string(), AddonRule::per_second(per_second));
            }
        }
        augmented
    }
}

/// Ordered rule list with a fallback rule.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<PricingRule>,
    fallback: PricingRule,
}

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = PricingRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            fallback: PricingRule::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: PricingRule) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn push(&mut self, rule: PricingRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[PricingRule] {
        &self.rules
    }

    /// Most specific rule first: engine and resolution, engine only, global,
    /// then the fallback. Within a level the earliest rule wins.
    pub fn select(&self, engine_id: &str, resolution: &str) -> &PricingRule {
        let for_engine = |rule: &&PricingRule| rule.engine_id.as_deref() == Some(engine_id);

        self.rules
            .iter()
            .filter(for_engine)
            .find(|rule| rule.resolution.as_deref() == Some(resolution))
            .or_else(|| {
                self.rules
                    .iter()
                    .filter(for_engine)
                    .find(|rule| rule.resolution.is_none())
            })
            .or_else(|| self.rules.iter().find(|rule| rule.is_global()))
            .unwrap_or(&self.fallback)
    }
}

fn rule_id_part_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9_-]+").expect("valid rule id regex"))
}

fn rule_id_part(value: &str) -> String {
    rule_id_part_regex()
        .replace_all(&value.to_lowercase(), "-")
        .into_owned()
}

/// `default`, `rule-<engine>` or `rule-<engine>-<resolution>`.
pub fn generate_rule_id(engine_id: Option<&str>, resolution: Option<&str>) -> String {
    let engine = engine_id.map(str::trim).filter(|value| !value.is_empty());
    let resolution = resolution.map(str::trim).filter(|value| !value.is_empty());

    match (engine, resolution) {
        (None, _) => DEFAULT_RULE_ID.to_string(),
        (Some(engine), None) => format!("rule-{}", rule_id_part(engine)),
        (Some(engine), Some(resolution)) => {
            format!("rule-{}-{}", rule_id_part(engine), rule_id_part(resolution))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::new([
            PricingRule::scoped(None, None).margin(dec!(0.25), dec!(0)),
            PricingRule::scoped(Some("veo-3"), None).margin(dec!(0.3), dec!(0)),
            PricingRule::scoped(Some("veo-3"), Some("1080p")).margin(dec!(0.35), dec!(10)),
        ])
    }

    #[test]
    fn test_select_most_specific() {
        let rules = rules();
        assert_eq!(rules.select("veo-3", "1080p").id, "rule-veo-3-1080p");
        assert_eq!(rules.select("veo-3", "720p").id, "rule-veo-3");
        assert_eq!(rules.select("kling", "720p").id, "default");
        assert_eq!(rules.select("kling", "720p").margin_percent, dec!(0.25));
    }

    #[test]
    fn test_select_fallback_when_empty() {
        let rules = RuleSet::default();
        let rule = rules.select("veo-3", "720p");
        assert_eq!(rule.id, DEFAULT_RULE_ID);
        assert_eq!(rule.margin_percent, dec!(0.2));
    }

    #[test]
    fn test_generate_rule_id() {
        assert_eq!(generate_rule_id(None, Some("720p")), "default");
        assert_eq!(generate_rule_id(Some("  "), None), "default");
        assert_eq!(generate_rule_id(Some("Veo 3 Fast"), None), "rule-veo-3-fast");
        assert_eq!(generate_rule_id(Some("kling_v2"), Some("4K UHD")), "rule-kling_v2-4k-uhd");
    }

    #[test]
    fn test_apply_synthesizes_surcharges() {
        let definition = EnginePricingDefinition::builder("veo-3", dec!(40))
            .addon(UPSCALE_ADDON, AddonRule::flat(dec!(100)))
            .build();
        let augmented = PricingRule::default().vendor_account("acct_42").apply(&definition);

        assert_eq!(augmented.platform_fee_pct, dec!(0.2));
        assert_eq!(
            augmented.addons[AUDIO_ADDON],
            AddonRule::per_second(dec!(8))
        );
        assert_eq!(augmented.addons[UPSCALE_ADDON], AddonRule::flat(dec!(100)));
        assert_eq!(augmented.metadata[RULE_ID_KEY], "default");
        assert_eq!(augmented.metadata[VENDOR_ACCOUNT_KEY], "acct_42");
    }

    #[test]
    fn test_vendor_account_falls_back_to_engine() {
        let definition = EnginePricingDefinition::builder("veo-3", dec!(40))
            .metadata(VENDOR_ACCOUNT_KEY, serde_json::json!("acct_engine"))
            .build();
        assert_eq!(
            PricingRule::default().vendor_account_for(&definition).as_deref(),
            Some("acct_engine")
        );
    }

    #[test]
    fn test_zero_surcharge_is_not_added() {
        let definition = EnginePricingDefinition::builder("veo-3", dec!(1)).build();
        let augmented = PricingRule::default()
            .surcharges(dec!(0), dec!(0.1))
            .apply(&definition);
        // round(1 * 0.1) rounds to zero cents.
        assert!(augmented.addons.is_empty());
    }
}
