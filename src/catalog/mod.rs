//! Engine catalog: the JSON document listing every engine and its raw
//! pricing, converted into [`EnginePricingDefinition`]s.
//!
//! ```rust
//! use engine_pricing::{Catalog, PricingSettings};
//!
//! let catalog = Catalog::from_json(r#"{"engines": [
//!     {"id": "veo-3", "pricingDetails": {"perSecondCents": {"default": 50}}}
//! ]}"#)?;
//! let definitions = catalog.definitions(&PricingSettings::default());
//! assert_eq!(definitions[0].engine_id, "veo-3");
//! # Ok::<(), engine_pricing::Error>(())
//! ```

mod convert;
mod engine;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use convert::{apply_pricing_override, build_pricing_definition, resolve_duration_steps};
pub use engine::{
    CatalogEngine, InputField, InputSchema, LegacyAddon, LegacyPricing, PricingDetails, RateTable,
};

use crate::config::PricingSettings;
use crate::models::EnginePricingDefinition;
use crate::pricing::PricingKernel;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub engines: Vec<CatalogEngine>,
}

impl Catalog {
    pub fn new(engines: Vec<CatalogEngine>) -> Self {
        Self { engines }
    }

    /// Parses `{"engines": [...]}` or a bare array of entries.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        let engines = match document {
            serde_json::Value::Array(items) => serde_json::Value::Array(items),
            serde_json::Value::Object(mut map) => map
                .remove("engines")
                .filter(serde_json::Value::is_array)
                .ok_or_else(|| Error::Catalog("expected an `engines` array".into()))?,
            other => {
                return Err(Error::Catalog(format!(
                    "expected an object or array, found {}",
                    json_kind(&other)
                )));
            }
        };
        Ok(Self::new(serde_json::from_value(engines)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            engines = catalog.engines.len(),
            "engine catalog loaded"
        );
        Ok(catalog)
    }

    pub fn engine(&self, id: &str) -> Option<&CatalogEngine> {
        self.engines.iter().find(|engine| engine.id == id)
    }

    /// Applies stored pricing overrides keyed by engine id.
    pub fn with_overrides(mut self, mut overrides: HashMap<String, PricingDetails>) -> Self {
        self.engines = self
            .engines
            .into_iter()
            .map(|engine| {
                let details = overrides.remove(&engine.id);
                apply_pricing_override(engine, details)
            })
            .collect();
        self
    }

    /// Converts every priceable entry; the rest are skipped with a debug log.
    pub fn definitions(&self, settings: &PricingSettings) -> Vec<EnginePricingDefinition> {
        self.engines
            .iter()
            .filter_map(|engine| {
                let definition = build_pricing_definition(engine, settings);
                if definition.is_none() {
                    tracing::debug!(
                        engine_id = %engine.id,
                        "catalog engine has no usable price, skipping"
                    );
                }
                definition
            })
            .collect()
    }

    /// Kernel over this catalog, registering under the configured alias policy.
    pub fn kernel(&self, settings: &PricingSettings) -> Result<PricingKernel> {
        PricingKernel::builder()
            .alias_policy(settings.alias_policy)
            .definitions(self.definitions(settings))
            .build()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
