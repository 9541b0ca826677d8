use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::alias::alias_variants;
use super::spec::{EngineId, EnginePricingDefinition};
use crate::{Error, Result};

/// What to do when a new engine's id or alias is already taken by another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasPolicy {
    /// Keep the earlier registration and log the shadowed alias.
    FirstWins,
    /// Refuse the registration.
    #[default]
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCollision {
    pub alias: String,
    pub existing: EngineId,
    pub incoming: EngineId,
}

/// Engine definitions keyed by canonical id and every alias spelling.
#[derive(Debug, Default, Clone)]
pub struct EngineRegistry {
    definitions: Vec<Arc<EnginePricingDefinition>>,
    aliases: HashMap<String, usize>,
    policy: AliasPolicy,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AliasPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> AliasPolicy {
        self.policy
    }

    /// Aliases of `definition` already owned by a different registration.
    pub fn collisions(&self, definition: &EnginePricingDefinition) -> Vec<AliasCollision> {
        alias_variants(&definition.engine_id)
            .into_iter()
            .filter_map(|alias| {
                let index = *self.aliases.get(&alias)?;
                Some(AliasCollision {
                    alias,
                    existing: self.definitions[index].engine_id.clone(),
                    incoming: definition.engine_id.clone(),
                })
            })
            .collect()
    }

    /// Registers under the registry's [`AliasPolicy`].
    pub fn register(&mut self, definition: EnginePricingDefinition) -> Result<()> {
        if self.policy == AliasPolicy::Reject
            && let Some(collision) = self.collisions(&definition).into_iter().next()
        {
            return Err(Error::AliasCollision {
                alias: collision.alias,
                existing: collision.existing,
                incoming: collision.incoming,
            });
        }
        self.register_first_wins(definition);
        Ok(())
    }

    /// Registers keeping any alias that an earlier engine already claimed.
    pub fn register_first_wins(&mut self, definition: EnginePricingDefinition) {
        let index = self.definitions.len();
        let variants = alias_variants(&definition.engine_id);

        for alias in variants {
            if let Some(&owner) = self.aliases.get(&alias) {
                tracing::warn!(
                    alias = %alias,
                    existing = %self.definitions[owner].engine_id,
                    incoming = %definition.engine_id,
                    "engine alias already registered, keeping existing"
                );
                continue;
            }
            self.aliases.insert(alias, index);
        }

        tracing::debug!(engine_id = %definition.engine_id, "engine pricing registered");
        self.definitions.push(Arc::new(definition));
    }

    pub fn get(&self, alias_or_id: &str) -> Option<&Arc<EnginePricingDefinition>> {
        let index = *self.aliases.get(alias_or_id)?;
        self.definitions.get(index)
    }

    pub fn contains(&self, alias_or_id: &str) -> bool {
        self.aliases.contains_key(alias_or_id)
    }

    /// Spellings that resolve to the engine registered as `engine_id`, sorted.
    pub fn aliases_for(&self, engine_id: &str) -> Vec<&str> {
        let Some(&index) = self.aliases.get(engine_id) else {
            return Vec::new();
        };
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, owner)| **owner == index)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    /// Definitions in registration order.
    pub fn all(&self) -> impl Iterator<Item = &Arc<EnginePricingDefinition>> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
