//! # shadow-switch
//!
//! `shadow-switch` embeds an old and a new value at one source location and
//! resolves to exactly one of them according to a per-build policy. It backs
//! three workflows:
//! - differential regression testing (`old` vs `new` builds of the same program)
//! - shadow symbolic execution, where an engine intercepts [`klee_change`] and
//!   explores both values in one run
//! - single-mutant selection for mutation campaigns
//!
//! Modules:
//! - `mode`: [`ResolutionMode`], [`GuardStyle`] and the compile-time [`BUILD`] profile
//! - `site`: [`VariantSite`] and the sealed [`Resolve`] strategies
//! - `selector`: mutant ids, site ranges and [`MutationHooks`]
//! - `env_switch` / `oracle`: the DUAL fallback and its interception boundary
//! - `context` / `config`: [`ExecutionContext`] built from a [`SwitchConfig`]
//! - `registry`: generation-time id bookkeeping and manifests
//! - `differential`: old/new and per-mutant comparisons

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod differential;
pub mod env_switch;
pub mod error;
pub mod fixture;
pub mod guard;
pub mod mode;
pub mod oracle;
pub mod prelude;
pub mod registry;
pub mod selector;
pub mod site;

pub use config::SwitchConfig;
pub use context::{ExecutionContext, Resolver, current, install, select};
pub use env_switch::{DEFAULT_OLD_VERSION_FLAG, EnvSwitch, FlagSource, ProcessEnv, StaticFlags};
pub use error::{Result, SwitchError};
pub use guard::{guard_false, guard_style, guard_true};
pub use mode::{BUILD, BuildProfile, GuardStyle, ResolutionMode};
pub use oracle::{
    ChangeOracle, InterceptableOracle, configure_fallback_flag, fallback_flag, klee_change,
    oracle_hits,
};
pub use registry::{SiteRecord, SiteRegistry};
pub use selector::{
    EntryPointHits, HookEvent, InterceptableHooks, MutantId, MutantSelector, MutationHooks,
    NoopHooks, RecordingHooks, SiteId, SiteRange, TracingHooks, entry_point_hits,
};
pub use site::{DualResolver, NewResolver, OldResolver, Resolve, VariantSite};
