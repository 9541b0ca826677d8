//! Prelude module for convenient imports.
//!
//! ```rust
//! use engine_pricing::prelude::*;
//! ```

pub use crate::Error;
pub use crate::Result;

// Definitions
pub use crate::models::{
    AddonRule, AliasPolicy, DurationSteps, EnginePricingDefinition, EngineRegistry, MemberTier,
    RoundingMode, RoundingRule, TierDiscounts,
};

// Quotes
pub use crate::pricing::{
    AddonValue, PricingInput, PricingKernel, PricingQuote, PricingRule, PricingSnapshot, RuleSet,
};

// Catalog and settings
pub use crate::catalog::{Catalog, CatalogEngine};
pub use crate::config::{ConfigBuilder, ConfigProviderExt, PricingSettings};
