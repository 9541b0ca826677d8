//! Quote computation: rounding, add-ons, margin, member discount and the
//! platform/vendor split.
//!
//! ```rust
//! use engine_pricing::models::{DurationSteps, EnginePricingDefinition};
//! use engine_pricing::pricing::{PricingInput, PricingKernel};
//! use rust_decimal_macros::dec;
//!
//! let kernel = PricingKernel::new([EnginePricingDefinition::builder("kling-2-5-turbo", dec!(40))
//!     .durations(DurationSteps::new(4, 8, 2))
//!     .platform_fee(dec!(0.2), dec!(0))
//!     .build()]);
//!
//! let quote = kernel.quote(&PricingInput::new("kling-2-5-turbo", 8, "720p"))?;
//! assert_eq!(quote.snapshot.total_cents, 384);
//! # Ok::<(), engine_pricing::Error>(())
//! ```

mod addons;
mod kernel;
mod quote;
pub mod rounding;
pub mod rules;
mod snapshot;

pub use addons::{AddonValue, addon_amount};
pub use kernel::{KernelBuilder, PricingKernel};
pub use quote::{compute_quote, compute_snapshot};
pub use rounding::{CENTS_SCALE, apply_rounding, clamp_duration, normalize_cents};
pub use rules::{PricingRule, RuleSet, generate_rule_id};
pub use snapshot::{
    AddonLine, BaseLine, DiscountLine, MarginLine, PricingInput, PricingQuote, PricingSnapshot,
    QuoteMeta,
};
