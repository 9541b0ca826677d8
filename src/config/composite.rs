//! Chains providers; earlier providers shadow later ones.

use std::collections::BTreeSet;

use super::ConfigResult;
use super::provider::ConfigProvider;

#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider with lower priority than those already added.
    pub fn provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for CompositeConfigProvider {
    fn name(&self) -> &str {
        "composite"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        for provider in &self.providers {
            if let Some(value) = provider.get_raw(key).await? {
                tracing::trace!(key, provider = provider.name(), "config value resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Writes go to the highest-priority provider only.
    async fn set_raw(&self, key: &str, value: &str) -> ConfigResult<()> {
        match self.providers.first() {
            Some(provider) => provider.set_raw(key, value).await,
            None => Ok(()),
        }
    }

    async fn delete(&self, key: &str) -> ConfigResult<bool> {
        let mut deleted = false;
        for provider in &self.providers {
            deleted |= provider.delete(key).await?;
        }
        Ok(deleted)
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let mut keys = BTreeSet::new();
        for provider in &self.providers {
            keys.extend(provider.list_keys(prefix).await?);
        }
        Ok(keys.into_iter().collect())
    }
}

impl std::fmt::Debug for CompositeConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeConfigProvider")
            .field("provider_names", &self.provider_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::memory::MemoryConfigProvider;

    fn layered() -> CompositeConfigProvider {
        CompositeConfigProvider::new()
            .provider(Box::new(
                MemoryConfigProvider::named("overrides").value("pricing.currency", "EUR"),
            ))
            .provider(Box::new(
                MemoryConfigProvider::named("defaults")
                    .value("pricing.currency", "USD")
                    .value("pricing.platform_fee_pct", "0.2"),
            ))
    }

    #[tokio::test]
    async fn test_composite_provider_priority() {
        let composite = layered();
        assert_eq!(
            composite.get_raw("pricing.currency").await.unwrap().as_deref(),
            Some("EUR")
        );
        assert_eq!(
            composite.get_raw("pricing.platform_fee_pct").await.unwrap().as_deref(),
            Some("0.2")
        );
    }

    #[tokio::test]
    async fn test_composite_provider_list_keys_deduplicated() {
        let keys = layered().list_keys("pricing.").await.unwrap();
        assert_eq!(keys, vec!["pricing.currency", "pricing.platform_fee_pct"]);
    }

    #[tokio::test]
    async fn test_composite_provider_set_and_delete() {
        let composite = layered();
        composite.set_raw("pricing.tax_policy_hint", "vat").await.unwrap();
        assert_eq!(
            composite.get_raw("pricing.tax_policy_hint").await.unwrap().as_deref(),
            Some("vat")
        );

        assert!(composite.delete("pricing.currency").await.unwrap());
        assert_eq!(composite.get_raw("pricing.currency").await.unwrap(), None);
    }

    #[test]
    fn test_composite_provider_names() {
        let composite = layered();
        assert_eq!(composite.provider_count(), 2);
        assert_eq!(composite.provider_names(), vec!["overrides", "defaults"]);
    }
}
