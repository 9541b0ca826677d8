use std::sync::Arc;

use super::quote::compute_quote;
use super::rules::RuleSet;
use super::snapshot::{PricingInput, PricingQuote};
use crate::models::{AliasPolicy, DurationSteps, EnginePricingDefinition, EngineRegistry};
use crate::{Error, Result};

/// Quote entry point over a registry that is frozen at construction.
///
/// Cloning is cheap and clones share the same registry, so one kernel can be
/// handed to any number of threads or tasks.
#[derive(Debug, Clone, Default)]
pub struct PricingKernel {
    registry: Arc<EngineRegistry>,
}

impl PricingKernel {
    /// Builds a kernel where the first engine to claim an alias keeps it and
    /// later claims are logged. Use [`PricingKernel::builder`] to refuse them.
    pub fn new(definitions: impl IntoIterator<Item = EnginePricingDefinition>) -> Self {
        let mut registry = EngineRegistry::new();
        for definition in definitions {
            registry.register_first_wins(definition);
        }
        Self::from_registry(registry)
    }

    pub fn builder() -> KernelBuilder {
        KernelBuilder::default()
    }

    pub fn from_registry(registry: EngineRegistry) -> Self {
        tracing::debug!(engines = registry.len(), "pricing kernel ready");
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn list_definitions(&self) -> Vec<Arc<EnginePricingDefinition>> {
        self.registry.all().cloned().collect()
    }

    pub fn get_definition(&self, alias_or_id: &str) -> Option<Arc<EnginePricingDefinition>> {
        self.registry.get(alias_or_id).cloned()
    }

    pub fn get_durations(&self, alias_or_id: &str) -> Option<DurationSteps> {
        self.registry
            .get(alias_or_id)
            .map(|definition| definition.duration_steps)
    }

    fn resolve(&self, engine_id: &str) -> Result<&Arc<EnginePricingDefinition>> {
        self.registry
            .get(engine_id)
            .ok_or_else(|| Error::UnknownEngine {
                engine_id: engine_id.to_string(),
            })
    }

    fn ensure_resolution(definition: &EnginePricingDefinition, resolution: &str) -> Result<()> {
        if definition.supports_resolution(resolution) {
            Ok(())
        } else {
            Err(Error::UnsupportedResolution {
                engine_id: definition.engine_id.clone(),
                resolution: resolution.to_string(),
            })
        }
    }

    pub fn quote(&self, input: &PricingInput) -> Result<PricingQuote> {
        let definition = self.resolve(&input.engine_id)?;
        Self::ensure_resolution(definition, &input.resolution)?;
        Ok(compute_quote(Arc::clone(definition), input))
    }

    /// Quotes with the margin rule selected for the engine and resolution.
    ///
    /// The snapshot records the rule id and the vendor account that receives
    /// the vendor share.
    pub fn quote_with_rules(&self, input: &PricingInput, rules: &RuleSet) -> Result<PricingQuote> {
        let definition = self.resolve(&input.engine_id)?;
        Self::ensure_resolution(definition, &input.resolution)?;

        let rule = rules.select(&definition.engine_id, &input.resolution);
        let vendor_account_id = rule.vendor_account_for(definition);
        let mut quote = compute_quote(Arc::new(rule.apply(definition)), input);

        let snapshot = &mut quote.snapshot;
        snapshot.margin.rule_id = Some(rule.id.clone());
        snapshot.meta.rule_id = Some(rule.id.clone());
        snapshot.meta.rule_currency = Some(rule.currency.clone());
        snapshot.vendor_account_id = vendor_account_id;
        Ok(quote)
    }
}

#[derive(Debug, Default)]
pub struct KernelBuilder {
    definitions: Vec<EnginePricingDefinition>,
    alias_policy: AliasPolicy,
}

impl KernelBuilder {
    pub fn definition(mut self, definition: EnginePricingDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn definitions(
        mut self,
        definitions: impl IntoIterator<Item = EnginePricingDefinition>,
    ) -> Self {
        self.definitions.extend(definitions);
        self
    }

    pub fn alias_policy(mut self, policy: AliasPolicy) -> Self {
        self.alias_policy = policy;
        self
    }

    pub fn build(self) -> Result<PricingKernel> {
        let mut registry = EngineRegistry::with_policy(self.alias_policy);
        for definition in self.definitions {
            registry.register(definition)?;
        }
        Ok(PricingKernel::from_registry(registry))
    }
}
