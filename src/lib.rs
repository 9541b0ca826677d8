//! # engine-pricing
//!
//! Deterministic price quotes for pay-per-second generation engines.
//!
//! A quote combines a billed duration snapped onto the engine's grid, a
//! resolution multiplier, optional add-ons, a platform margin and a member
//! discount into a [`PricingSnapshot`] whose platform fee and vendor share
//! always add up to the total.
//!
//! ## Quick Start
//!
//! ```rust
//! use engine_pricing::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let kernel = PricingKernel::new([EnginePricingDefinition::builder("veo-3", dec!(50))
//!     .durations(DurationSteps::new(4, 8, 4))
//!     .resolution("720p", dec!(1))
//!     .resolution("1080p", dec!(1.5))
//!     .addon("audio", AddonRule::per_second(dec!(10)))
//!     .platform_fee(dec!(0.2), dec!(0))
//!     .build()]);
//!
//! let input = PricingInput::new("veo-3", 7, "1080p").addon("audio", true);
//! let quote = kernel.quote(&input)?;
//! assert_eq!(quote.effective_duration_sec, 8);
//! assert_eq!(quote.snapshot.total_cents, 816);
//! # Ok::<(), engine_pricing::Error>(())
//! ```
//!
//! ## From a catalog
//!
//! ```rust,no_run
//! use engine_pricing::{Catalog, PricingKernel, PricingSettings};
//!
//! # async fn example() -> engine_pricing::Result<()> {
//! let settings = PricingSettings::default();
//! let catalog = Catalog::load("fixtures/engines.json").await?;
//! let kernel = PricingKernel::builder()
//!     .alias_policy(settings.alias_policy)
//!     .definitions(catalog.definitions(&settings))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod catalog;
pub mod config;
pub mod models;
pub mod prelude;
pub mod pricing;

pub use catalog::{
    Catalog, CatalogEngine, PricingDetails, apply_pricing_override, build_pricing_definition,
};
pub use config::{ConfigBuilder, ConfigProvider, ConfigProviderExt, PricingSettings};
pub use models::{
    AddonRule, AliasPolicy, DurationSteps, EngineId, EnginePricingDefinition, EngineRegistry,
    MemberTier, RoundingMode, RoundingRule, TierDiscounts, alias_variants,
};
pub use pricing::{
    AddonValue, KernelBuilder, PricingInput, PricingKernel, PricingQuote, PricingRule,
    PricingSnapshot, RuleSet,
};

/// Error type for engine-pricing operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No engine is registered under the requested id or alias.
    #[error("Unknown engine: {engine_id}")]
    UnknownEngine { engine_id: String },

    /// The engine has no multiplier for the resolution and no `default` entry.
    #[error("Engine {engine_id} does not support resolution {resolution}")]
    UnsupportedResolution {
        engine_id: String,
        resolution: String,
    },

    /// Registration refused because an alias already belongs to another engine.
    #[error("Alias '{alias}' of {incoming} is already registered by {existing}")]
    AliasCollision {
        alias: String,
        existing: String,
        incoming: String,
    },

    /// Catalog document is malformed.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller asked for something the registry cannot price
    BadRequest,
    /// Catalog, settings or registration problems
    Configuration,
    /// IO and serialization failures
    Internal,
}

impl Error {
    pub fn unknown_engine(engine_id: impl Into<String>) -> Self {
        Error::UnknownEngine {
            engine_id: engine_id.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownEngine { .. } | Error::UnsupportedResolution { .. } => {
                ErrorCategory::BadRequest
            }
            Error::AliasCollision { .. } | Error::Catalog(_) | Error::Config(_) => {
                ErrorCategory::Configuration
            }
            Error::Json(_) | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_bad_request(&self) -> bool {
        self.category() == ErrorCategory::BadRequest
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Pricing is a pure computation; repeating a failed call fails the same way.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound { key } => {
                Error::Config(format!("Key not found: {}", key))
            }
            config::ConfigError::InvalidValue { key, message } => {
                Error::Config(format!("Invalid value for {}: {}", key, message))
            }
            config::ConfigError::Serialization(e) => Error::Json(e),
            config::ConfigError::Io(e) => Error::Io(e),
            config::ConfigError::Env(e) => Error::Config(e.to_string()),
            config::ConfigError::Provider { message } => Error::Config(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
