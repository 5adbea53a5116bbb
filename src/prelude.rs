//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use shadow_switch::prelude::*;
//!
//! let ctx = ExecutionContext::for_mode(ResolutionMode::Old);
//! assert_eq!(ctx.select(&VariantSite::unassigned(), -1, 0), -1);
//! ```

pub use crate::context::{ExecutionContext, Resolver};
pub use crate::differential::{
    VariantOutcome, assert_variants_agree, assert_variants_diverge, run_variants,
};
pub use crate::guard::{guard_false, guard_style, guard_true};
pub use crate::mode::{GuardStyle, ResolutionMode};
pub use crate::selector::{MutantId, MutationHooks, RecordingHooks, SiteId, SiteRange};
pub use crate::site::{Resolve, VariantSite};
pub use crate::variant;
pub use crate::{SwitchConfig, SwitchError};
