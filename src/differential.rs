//! Differential and mutant-campaign helpers built on explicit contexts.
//!
//! # Example
//!
//! ```rust
//! use shadow_switch::VariantSite;
//! use shadow_switch::differential::run_variants;
//!
//! const SEED: VariantSite = VariantSite::unassigned();
//! let outcome = run_variants(|ctx| ctx.select(&SEED, -1, 0) + 6);
//! assert_eq!((outcome.old, outcome.new), (5, 6));
//! assert!(outcome.diverged());
//! ```

use std::fmt::Debug;

use crate::context::{ExecutionContext, Resolver};
use crate::mode::{GuardStyle, ResolutionMode};
use crate::selector::{InterceptableHooks, MutantId};

/// Results of the same computation under the old and the new variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOutcome<T> {
    /// Result under OLD.
    pub old: T,
    /// Result under NEW.
    pub new: T,
}

impl<T: PartialEq> VariantOutcome<T> {
    /// Whether the two variants disagree.
    pub fn diverged(&self) -> bool {
        self.old != self.new
    }
}

/// Evaluate `f` under OLD then under NEW.
pub fn run_variants<T, F>(f: F) -> VariantOutcome<T>
where
    F: Fn(&ExecutionContext) -> T,
{
    let old = f(&ExecutionContext::for_mode(ResolutionMode::Old));
    let new = f(&ExecutionContext::for_mode(ResolutionMode::New));
    VariantOutcome { old, new }
}

/// Assert that the old and new variant produce the same result.
pub fn assert_variants_agree<T, F>(f: F)
where
    T: PartialEq + Debug,
    F: Fn(&ExecutionContext) -> T,
{
    let outcome = run_variants(f);
    assert_eq!(
        outcome.old, outcome.new,
        "old and new variants disagree: old={:?}, new={:?}",
        outcome.old, outcome.new
    );
}

/// Assert that the old and new variant produce different results.
pub fn assert_variants_diverge<T, F>(f: F)
where
    T: PartialEq + Debug,
    F: Fn(&ExecutionContext) -> T,
{
    let outcome = run_variants(f);
    assert!(
        outcome.diverged(),
        "old and new variants agree on {:?}",
        outcome.old
    );
}

/// Evaluate `f` once per mutant id under MUTATION_SELECT, each with its own context.
pub fn mutant_outcomes<T, F, I>(ids: I, f: F) -> Vec<(MutantId, T)>
where
    I: IntoIterator<Item = MutantId>,
    F: Fn(&ExecutionContext) -> T,
{
    ids.into_iter()
        .map(|id| {
            let context = ExecutionContext::new(
                Resolver::mutation(id, InterceptableHooks),
                GuardStyle::default_for(ResolutionMode::MutationSelect),
            );
            (id, f(&context))
        })
        .collect()
}

/// Mutant ids whose result differs from the baseline run of `f`.
pub fn killed_mutants<T, F, I>(ids: I, f: F) -> Vec<MutantId>
where
    T: PartialEq,
    I: IntoIterator<Item = MutantId>,
    F: Fn(&ExecutionContext) -> T,
{
    let baseline = mutant_outcomes([MutantId::BASELINE], &f)
        .pop()
        .map(|(_, value)| value);
    mutant_outcomes(ids, &f)
        .into_iter()
        .filter(|(_, value)| baseline.as_ref() != Some(value))
        .map(|(id, _)| id)
        .collect()
}
