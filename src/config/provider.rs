use serde::{Serialize, de::DeserializeOwned};

use super::{ConfigError, ConfigResult};

/// A key/value source of configuration. Keys are dotted paths such as
/// `pricing.platform_fee_pct`; values are raw strings, usually JSON.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: &str) -> ConfigResult<()>;

    async fn delete(&self, key: &str) -> ConfigResult<bool>;

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>>;
}

/// Parses a raw value as JSON, or as a bare string when it is not JSON.
///
/// Environment variables carry `reject` rather than `"reject"`, so both
/// spellings decode to the same value.
pub fn decode_raw<T: DeserializeOwned>(key: &str, raw: &str) -> ConfigResult<T> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.to_string())))
        .map_err(|e| ConfigError::invalid(key, e))
}

/// Typed access on top of [`ConfigProvider`].
pub trait ConfigProviderExt: ConfigProvider {
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            match self.get_raw(key).await? {
                Some(raw) => decode_raw(key, &raw).map(Some),
                None => Ok(None),
            }
        }
    }

    /// Typed value, or `default` when no provider has the key.
    fn get_or<T: DeserializeOwned + Send>(
        &self,
        key: &str,
        default: T,
    ) -> impl std::future::Future<Output = ConfigResult<T>> + Send
    where
        Self: Sync,
    {
        async move { Ok(self.get(key).await?.unwrap_or(default)) }
    }

    fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> impl std::future::Future<Output = ConfigResult<()>> + Send
    where
        Self: Sync,
    {
        async move {
            let raw = serde_json::to_string(value)?;
            self.set_raw(key, &raw).await
        }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AliasPolicy;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_raw_accepts_bare_strings() {
        let quoted: AliasPolicy = decode_raw("k", "\"reject\"").unwrap();
        let bare: AliasPolicy = decode_raw("k", "reject").unwrap();
        assert_eq!(quoted, AliasPolicy::Reject);
        assert_eq!(bare, AliasPolicy::Reject);
    }

    #[test]
    fn test_decode_raw_numbers() {
        let pct: Decimal = decode_raw("k", "0.25").unwrap();
        assert_eq!(pct, dec!(0.25));
        let max: u32 = decode_raw("k", "45").unwrap();
        assert_eq!(max, 45);
    }

    #[test]
    fn test_decode_raw_invalid() {
        let err = decode_raw::<u32>("pricing.default_max_duration_sec", "forever").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, .. } if key == "pricing.default_max_duration_sec"
        ));
    }
}
