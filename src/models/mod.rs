//! Engine pricing definitions and the alias-aware engine registry.

mod alias;
mod registry;
mod spec;
mod tier;

pub use alias::{alias_variants, camel_to_kebab, digits_to_kebab};
pub use registry::{AliasCollision, AliasPolicy, EngineRegistry};
pub use spec::{
    AddonRule, DEFAULT_RESOLUTION_KEY, DefinitionBuilder, DurationSteps, EngineId,
    EnginePricingDefinition, RoundingMode, RoundingRule, TierDiscounts,
};
pub use tier::MemberTier;
