//! Catalog and Settings Tests
//!
//! Loading the engine catalog fixture, layering pricing settings from
//! several providers, and pricing with margin rules.
//!
//! Run: cargo nextest run --test catalog_settings_tests

use std::path::PathBuf;

use engine_pricing::config::{EnvConfigProvider, MemoryConfigProvider};
use engine_pricing::prelude::*;
use rust_decimal_macros::dec;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/engines.json")
}

async fn fixture_kernel(settings: &PricingSettings) -> PricingKernel {
    Catalog::load(fixture())
        .await
        .unwrap()
        .kernel(settings)
        .unwrap()
}

// =============================================================================
// Catalog
// =============================================================================

mod catalog_tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_definitions() {
        let catalog = Catalog::load(fixture()).await.unwrap();
        let definitions = catalog.definitions(&PricingSettings::default());

        let ids: Vec<&str> = definitions.iter().map(|d| d.engine_id.as_str()).collect();
        assert_eq!(ids, vec!["veo-3", "kling25Turbo"]);

        let veo = &definitions[0];
        assert_eq!(veo.duration_steps, DurationSteps::new(4, 8, 4).with_default(8));
        assert_eq!(veo.platform_fee_pct, dec!(0.25));
        assert_eq!(veo.label.as_deref(), Some("Veo 3"));

        let kling = &definitions[1];
        assert_eq!(kling.base_unit_price_cents, dec!(35));
        assert_eq!(kling.resolution_multiplier("1080p"), Some(dec!(1.4)));
        assert_eq!(kling.addons["audio"], AddonRule::per_second(dec!(5)));
        assert_eq!(kling.duration_steps.preferred(), 5);
    }

    #[tokio::test]
    async fn test_fixture_quotes() {
        let kernel = fixture_kernel(&PricingSettings::default()).await;

        let input = PricingInput::new("kling-25turbo", 8, "1080p")
            .member_tier("plus")
            .addon("audio", true);
        let quote = kernel.quote(&input).unwrap();
        let snapshot = &quote.snapshot;

        // 8s snaps to the closer 10s; 49c/s * 10 + 50 audio.
        assert_eq!(quote.engine_id, "kling25Turbo");
        assert_eq!(snapshot.base.seconds, 10);
        assert_eq!(snapshot.base.amount_cents, dec!(490));
        // margin round(540 * 0.2) = 108, discount round(648 * 0.05) = 32.
        assert_eq!(snapshot.total_cents, 616);
        assert_eq!(snapshot.platform_fee_cents, 76);
        assert_eq!(snapshot.vendor_share_cents, 540);
        assert_eq!(snapshot.meta.tax_policy_hint.as_deref(), Some("standard"));

        assert!(matches!(
            kernel.quote(&PricingInput::new("pikaFree", 5, "720p")),
            Err(Error::UnknownEngine { .. })
        ));
    }

    #[tokio::test]
    async fn test_quote_with_rules_on_fixture() {
        let kernel = fixture_kernel(&PricingSettings::default()).await;
        let rules = RuleSet::new([
            PricingRule::scoped(Some("veo-3"), None).margin(dec!(0.3), dec!(0)),
            PricingRule::scoped(Some("veo-3"), Some("1080p"))
                .margin(dec!(0.1), dec!(20))
                .vendor_account("acct_override"),
        ]);

        let quote = kernel
            .quote_with_rules(&PricingInput::new("veo-3", 8, "720p"), &rules)
            .unwrap();
        assert_eq!(quote.snapshot.margin.percent_applied, dec!(0.3));
        assert_eq!(quote.snapshot.margin.rule_id.as_deref(), Some("rule-veo-3"));
        assert_eq!(quote.snapshot.vendor_account_id.as_deref(), Some("acct_google"));
        // 400 base, 30% margin.
        assert_eq!(quote.snapshot.total_cents, 520);

        let quote = kernel
            .quote_with_rules(&PricingInput::new("veo-3", 8, "1080p"), &rules)
            .unwrap();
        assert_eq!(quote.snapshot.meta.rule_id.as_deref(), Some("rule-veo-3-1080p"));
        assert_eq!(quote.snapshot.vendor_account_id.as_deref(), Some("acct_override"));
        // 600 base, round(60) + 20 margin.
        assert_eq!(quote.snapshot.total_cents, 680);
        assert!(quote.snapshot.is_balanced());
    }

    #[tokio::test]
    async fn test_rules_synthesize_missing_surcharges() {
        let kernel = fixture_kernel(&PricingSettings::default()).await;
        let input = PricingInput::new("kling25Turbo", 5, "720p")
            .addon("audio", true)
            .addon("upscale4k", true);

        let plain = kernel.quote(&input).unwrap();
        assert_eq!(plain.snapshot.addons.len(), 1);

        let ruled = kernel.quote_with_rules(&input, &RuleSet::default()).unwrap();
        let types: Vec<&str> = ruled
            .snapshot
            .addons
            .iter()
            .map(|line| line.addon_type.as_str())
            .collect();
        assert_eq!(types, vec!["audio", "upscale4k"]);
        // Engine audio rule wins; upscale is round(35 * 0.5) = 18c/s over 5s.
        assert_eq!(ruled.snapshot.addons[0].amount_cents, dec!(25));
        assert_eq!(ruled.snapshot.addons[1].amount_cents, dec!(90));
        assert_eq!(ruled.snapshot.margin.rule_id.as_deref(), Some("default"));
    }
}

// =============================================================================
// Settings
// =============================================================================

mod settings_tests {
    use super::*;

    #[tokio::test]
    async fn test_layered_settings_drive_catalog() {
        let config = ConfigBuilder::new()
            .memory(
                MemoryConfigProvider::named("overrides")
                    .value("pricing.platform_fee_pct", "0.1")
                    .value("pricing.member_discounts", r#"{"plus": 0.2}"#),
            )
            .memory(
                MemoryConfigProvider::named("defaults")
                    .value("pricing.platform_fee_pct", "0.4")
                    .value("pricing.rounding_increment_cents", "5"),
            )
            .build();
        let settings = PricingSettings::load(&config).await.unwrap();
        assert_eq!(settings.platform_fee_pct, dec!(0.1));
        assert_eq!(settings.rounding_increment_cents, dec!(5));

        let kernel = fixture_kernel(&settings).await;
        let input = PricingInput::new("kling25Turbo", 5, "720p").tier(MemberTier::Plus);
        let snapshot = kernel.quote(&input).unwrap().snapshot;

        // 175 base, margin round(17.5) = 18, 193 before discount,
        // discount round(38.6) = 39, 154 snaps to 155.
        assert_eq!(snapshot.subtotal_before_discount_cents, 193);
        assert_eq!(snapshot.total_cents, 155);
        assert_eq!(snapshot.total_cents % 5, 0);
        assert_eq!(snapshot.platform_fee_cents, 0);
        assert_eq!(snapshot.vendor_share_cents, 155);
    }

    #[tokio::test]
    async fn test_settings_from_prefixed_env() {
        let prefix = "ENGINE_PRICING_ITEST_";
        // SAFETY: Test-only environment setup with variables unique to this test
        unsafe {
            std::env::set_var("ENGINE_PRICING_ITEST_PRICING_DEFAULT_CURRENCY", "EUR");
            std::env::set_var("ENGINE_PRICING_ITEST_PRICING_ALIAS_POLICY", "first_wins");
        }

        let config = ConfigBuilder::new().env_with_prefix(prefix).build();
        let settings = PricingSettings::load(&config).await.unwrap();

        unsafe {
            std::env::remove_var("ENGINE_PRICING_ITEST_PRICING_DEFAULT_CURRENCY");
            std::env::remove_var("ENGINE_PRICING_ITEST_PRICING_ALIAS_POLICY");
        }

        assert_eq!(settings.default_currency, "EUR");
        assert_eq!(settings.alias_policy, AliasPolicy::FirstWins);
        assert_eq!(settings.platform_fee_pct, dec!(0.2));
    }

    #[tokio::test]
    async fn test_invalid_settings_surface_as_config_errors() {
        let config = ConfigBuilder::new()
            .memory(MemoryConfigProvider::new().value("pricing.default_max_duration_sec", "0"))
            .provider(Box::new(EnvConfigProvider::prefixed("ENGINE_PRICING_ITEST_UNSET_")))
            .build();

        let err: Error = PricingSettings::load(&config).await.unwrap_err().into();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("default_max_duration_sec"));
    }
}
