//! JSON settings file, read with dotted-path lookups.
//!
//! `{"pricing": {"platform_fee_pct": 0.25}}` answers `pricing.platform_fee_pct`.
//! A missing file behaves like an empty document.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

pub struct FileConfigProvider {
    path: PathBuf,
    data: RwLock<Option<serde_json::Value>>,
}

impl FileConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> ConfigResult<serde_json::Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(serde_json::Value::Object(Default::default()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-reads the file, replacing the cached document.
    pub async fn reload(&self) -> ConfigResult<()> {
        let document = self.read().await?;
        *self.data.write().await = Some(document);
        Ok(())
    }

    async fn document(&self) -> ConfigResult<serde_json::Value> {
        if let Some(document) = self.data.read().await.as_ref() {
            return Ok(document.clone());
        }
        self.reload().await?;
        Ok(self.data.read().await.clone().unwrap_or_default())
    }

    fn read_only(&self) -> ConfigError {
        ConfigError::Provider {
            message: format!("{} is read-only", self.path.display()),
        }
    }
}

fn lookup<'a>(document: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    key.split('.')
        .try_fold(document, |current, part| current.get(part))
}

fn collect_keys(value: &serde_json::Value, path: String, keys: &mut Vec<String>) {
    match value.as_object() {
        Some(map) => {
            for (name, child) in map {
                let child_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", path, name)
                };
                collect_keys(child, child_path, keys);
            }
        }
        None => keys.push(path),
    }
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        let document = self.document().await?;
        Ok(lookup(&document, key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    async fn set_raw(&self, _key: &str, _value: &str) -> ConfigResult<()> {
        Err(self.read_only())
    }

    async fn delete(&self, _key: &str) -> ConfigResult<bool> {
        Err(self.read_only())
    }

    /// Leaf keys only, sorted.
    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let document = self.document().await?;
        let mut keys = Vec::new();
        collect_keys(&document, String::new(), &mut keys);
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .finish()
    }
}
