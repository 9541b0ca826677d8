//! Read-only configuration from environment variables.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

/// Prefix for pricing settings, e.g. `ENGINE_PRICING_PRICING_PLATFORM_FEE_PCT`.
pub const ENV_PREFIX: &str = "ENGINE_PRICING_";

/// Maps `a.b_c` to `PREFIX_A_B_C`.
///
/// Setting environment variables is not thread-safe, so writes are refused.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Provider reading [`ENV_PREFIX`] variables.
    pub fn pricing() -> Self {
        Self::prefixed(ENV_PREFIX)
    }

    fn env_key(&self, key: &str) -> String {
        let name = key.to_uppercase().replace('.', "_");
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name,
        }
    }

    /// Inverse of [`Self::env_key`] for two-level keys: only the first `_`
    /// after the prefix becomes a `.`.
    fn key_from_env(&self, env_name: &str) -> Option<String> {
        let name = match &self.prefix {
            Some(prefix) => env_name.strip_prefix(prefix.as_str())?,
            None => env_name,
        };
        Some(name.to_lowercase().replacen('_', ".", 1))
    }

    fn read_only() -> ConfigError {
        ConfigError::Provider {
            message: "environment variables are read-only at runtime".into(),
        }
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    async fn set_raw(&self, _key: &str, _value: &str) -> ConfigResult<()> {
        Err(Self::read_only())
    }

    async fn delete(&self, _key: &str) -> ConfigResult<bool> {
        Err(Self::read_only())
    }

    /// Keys nested deeper than `section.field` do not round-trip.
    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let env_prefix = self.env_key(prefix);
        Ok(std::env::vars()
            .filter(|(name, _)| name.starts_with(&env_prefix))
            .filter_map(|(name, _)| self.key_from_env(&name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_conversion() {
        let provider = EnvConfigProvider::new();
        assert_eq!(provider.env_key("pricing.platform_fee_pct"), "PRICING_PLATFORM_FEE_PCT");

        let provider = EnvConfigProvider::pricing();
        assert_eq!(
            provider.env_key("pricing.alias_policy"),
            "ENGINE_PRICING_PRICING_ALIAS_POLICY"
        );
        assert_eq!(
            provider.key_from_env("ENGINE_PRICING_PRICING_CURRENCY").as_deref(),
            Some("pricing.currency")
        );
        assert_eq!(
            provider.key_from_env("ENGINE_PRICING_PRICING_PLATFORM_FEE_PCT").as_deref(),
            Some("pricing.platform_fee_pct")
        );
        assert_eq!(provider.key_from_env("HOME"), None);
    }

    #[tokio::test]
    async fn test_env_provider_get() {
        let provider = EnvConfigProvider::prefixed("ENGINE_PRICING_TEST_GET_");

        // SAFETY: Test-only environment setup with a variable unique to this test
        unsafe { std::env::set_var("ENGINE_PRICING_TEST_GET_PRICING_CURRENCY", "EUR") };
        let value = provider.get_raw("pricing.currency").await.unwrap();
        assert_eq!(value.as_deref(), Some("EUR"));
        unsafe { std::env::remove_var("ENGINE_PRICING_TEST_GET_PRICING_CURRENCY") };
    }

    #[tokio::test]
    async fn test_env_provider_list_keys_match_settings_keys() {
        let provider = EnvConfigProvider::prefixed("ENGINE_PRICING_TEST_LIST_");

        // SAFETY: Test-only environment setup with a variable unique to this test
        unsafe { std::env::set_var("ENGINE_PRICING_TEST_LIST_PRICING_PLATFORM_FEE_PCT", "0.3") };
        let keys = provider.list_keys("pricing").await.unwrap();
        let value = provider.get_raw("pricing.platform_fee_pct").await.unwrap();
        unsafe { std::env::remove_var("ENGINE_PRICING_TEST_LIST_PRICING_PLATFORM_FEE_PCT") };

        assert_eq!(keys, vec!["pricing.platform_fee_pct".to_string()]);
        assert_eq!(value.as_deref(), Some("0.3"));
    }

    #[tokio::test]
    async fn test_env_provider_read_only() {
        let provider = EnvConfigProvider::pricing();
        assert!(provider.set_raw("pricing.currency", "EUR").await.is_err());
        assert!(provider.delete("pricing.currency").await.is_err());
    }

    #[tokio::test]
    async fn test_env_provider_not_found() {
        let provider = EnvConfigProvider::prefixed("ENGINE_PRICING_NONEXISTENT_");
        assert_eq!(provider.get_raw("some.key").await.unwrap(), None);
    }
}
