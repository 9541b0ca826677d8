//! Platform-wide pricing defaults applied when converting catalog entries.
//!
//! Every field is read from `pricing.<field>` and falls back to its default
//! when no provider has the key.

use std::path::PathBuf;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::env::EnvConfigProvider;
use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigError, ConfigResult};
use crate::models::{AliasPolicy, RoundingMode, RoundingRule, TierDiscounts};

pub const SETTINGS_PREFIX: &str = "pricing";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub default_currency: String,
    pub platform_fee_pct: Decimal,
    pub member_discounts: TierDiscounts,
    pub rounding_increment_cents: Decimal,
    pub tax_policy_hint: String,
    /// Upper bound of the duration grid when a catalog entry declares none.
    pub default_max_duration_sec: u32,
    pub alias_policy: AliasPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_currency: "USD".into(),
            platform_fee_pct: dec!(0.2),
            member_discounts: TierDiscounts::new(dec!(0), dec!(0.05), dec!(0.1)),
            rounding_increment_cents: Decimal::ONE,
            tax_policy_hint: "standard".into(),
            default_max_duration_sec: 30,
            alias_policy: AliasPolicy::Reject,
            catalog_path: None,
        }
    }
}

fn key(field: &str) -> String {
    format!("{}.{}", SETTINGS_PREFIX, field)
}

impl PricingSettings {
    /// Reads every field from `provider`, then validates the result.
    pub async fn load<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        let defaults = Self::default();
        let settings = Self {
            default_currency: provider
                .get_or(&key("default_currency"), defaults.default_currency)
                .await?,
            platform_fee_pct: provider
                .get_or(&key("platform_fee_pct"), defaults.platform_fee_pct)
                .await?,
            member_discounts: provider
                .get_or(&key("member_discounts"), defaults.member_discounts)
                .await?,
            rounding_increment_cents: provider
                .get_or(&key("rounding_increment_cents"), defaults.rounding_increment_cents)
                .await?,
            tax_policy_hint: provider
                .get_or(&key("tax_policy_hint"), defaults.tax_policy_hint)
                .await?,
            default_max_duration_sec: provider
                .get_or(&key("default_max_duration_sec"), defaults.default_max_duration_sec)
                .await?,
            alias_policy: provider
                .get_or(&key("alias_policy"), defaults.alias_policy)
                .await?,
            catalog_path: provider.get(&key("catalog_path")).await?,
        };
        settings.validate()?;

        tracing::debug!(
            provider = provider.name(),
            currency = %settings.default_currency,
            platform_fee_pct = %settings.platform_fee_pct,
            alias_policy = ?settings.alias_policy,
            "pricing settings loaded"
        );
        Ok(settings)
    }

    /// Settings from `ENGINE_PRICING_*` variables.
    pub async fn from_env() -> ConfigResult<Self> {
        Self::load(&EnvConfigProvider::pricing()).await
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_currency.trim().is_empty() {
            return Err(ConfigError::invalid(key("default_currency"), "must not be empty"));
        }
        if self.platform_fee_pct < Decimal::ZERO || self.platform_fee_pct > Decimal::ONE {
            return Err(ConfigError::invalid(
                key("platform_fee_pct"),
                format!("{} is outside [0, 1]", self.platform_fee_pct),
            ));
        }
        for (tier, fraction) in [
            ("member", self.member_discounts.member),
            ("plus", self.member_discounts.plus),
            ("pro", self.member_discounts.pro),
        ] {
            if fraction < Decimal::ZERO || fraction >= Decimal::ONE {
                return Err(ConfigError::invalid(
                    key("member_discounts"),
                    format!("{} discount {} is outside [0, 1)", tier, fraction),
                ));
            }
        }
        if self.rounding_increment_cents <= Decimal::ZERO {
            return Err(ConfigError::invalid(
                key("rounding_increment_cents"),
                "must be positive",
            ));
        }
        if self.default_max_duration_sec == 0 {
            return Err(ConfigError::invalid(
                key("default_max_duration_sec"),
                "must be at least 1 second",
            ));
        }
        Ok(())
    }

    pub fn rounding(&self) -> RoundingRule {
        RoundingRule::new(RoundingMode::Nearest, self.rounding_increment_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigProvider;

    #[tokio::test]
    async fn test_load_defaults_from_empty_provider() {
        let settings = PricingSettings::load(&MemoryConfigProvider::new()).await.unwrap();
        assert_eq!(settings, PricingSettings::default());
        assert_eq!(settings.rounding(), RoundingRule::nearest_cent());
    }

    #[tokio::test]
    async fn test_load_overrides() {
        let provider = MemoryConfigProvider::new()
            .value("pricing.default_currency", "EUR")
            .value("pricing.platform_fee_pct", "0.3")
            .value("pricing.member_discounts", r#"{"plus": 0.1, "pro": 0.15}"#)
            .value("pricing.alias_policy", "first_wins")
            .value("pricing.catalog_path", "fixtures/engines.json");
        let settings = PricingSettings::load(&provider).await.unwrap();

        assert_eq!(settings.default_currency, "EUR");
        assert_eq!(settings.platform_fee_pct, dec!(0.3));
        assert_eq!(settings.member_discounts, TierDiscounts::new(dec!(0), dec!(0.1), dec!(0.15)));
        assert_eq!(settings.alias_policy, AliasPolicy::FirstWins);
        assert_eq!(settings.catalog_path, Some(PathBuf::from("fixtures/engines.json")));
        assert_eq!(settings.default_max_duration_sec, 30);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_values() {
        let provider = MemoryConfigProvider::new().value("pricing.platform_fee_pct", "1.5");
        let err = PricingSettings::load(&provider).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "pricing.platform_fee_pct"
        ));

        let provider = MemoryConfigProvider::new().value("pricing.alias_policy", "last_wins");
        assert!(PricingSettings::load(&provider).await.is_err());
    }

    #[test]
    fn test_validate_discounts() {
        let mut settings = PricingSettings::default();
        settings.member_discounts.pro = Decimal::ONE;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_serde_defaults() {
        let settings: PricingSettings =
            serde_json::from_str(r#"{"default_currency": "GBP"}"#).unwrap();
        assert_eq!(settings.default_currency, "GBP");
        assert_eq!(settings.platform_fee_pct, dec!(0.2));
    }
}
