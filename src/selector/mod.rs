//! Single-mutant selection: active mutant id, site ids and hook dispatch.

pub mod hooks;

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SwitchError;
use crate::mode::ResolutionMode;
use crate::site::{Resolve, VariantSite, sealed};

pub use hooks::{
    EntryPointHits, HookEvent, InterceptableHooks, MutationHooks, NoopHooks, RecordingHooks,
    TracingHooks, entry_point_hits,
};

/// Harness variable carrying the active mutant id of one process.
pub const MUTANT_ID_ENV: &str = "SHADOW_SWITCH_MUTANT_ID";

/// Statically assigned site identifier. Never zero, so it never matches the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(NonZeroU32);

impl SiteId {
    /// Lowest site id.
    pub const FIRST: SiteId = SiteId(NonZeroU32::MIN);

    /// `None` for zero.
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Raw numeric value.
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Next id, `None` after `u32::MAX`.
    pub const fn successor(self) -> Option<SiteId> {
        match self.0.checked_add(1) {
            Some(next) => Some(SiteId(next)),
            None => None,
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of the mutant a process runs. `0` is the unmutated baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutantId(pub u32);

impl MutantId {
    /// Baseline run: matches no site.
    pub const BASELINE: MutantId = MutantId(0);

    /// Whether this id activates `site`.
    pub const fn activates(self, site: SiteId) -> bool {
        self.0 == site.get()
    }

    /// Whether this is the baseline id.
    pub const fn is_baseline(self) -> bool {
        self.0 == 0
    }
}

impl From<SiteId> for MutantId {
    fn from(site: SiteId) -> Self {
        MutantId(site.get())
    }
}

impl fmt::Display for MutantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MutantId {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(MutantId)
            .map_err(|_| SwitchError::InvalidMutantId {
                value: s.to_string(),
                source_name: "mutant id".to_string(),
            })
    }
}

/// Inclusive range of mutant ids a site owns, reported to the pre-selection hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteRange {
    /// First owned id.
    pub start: u32,
    /// Last owned id.
    pub end: u32,
}

impl SiteRange {
    /// Fixed payload of every post-selection event.
    pub const POST_SELECTION: SiteRange = SiteRange { start: 0, end: 0 };

    /// Range covering exactly `id`.
    pub const fn single(id: SiteId) -> Self {
        Self {
            start: id.get(),
            end: id.get(),
        }
    }

    /// Whether `start <= end`.
    pub const fn is_ordered(self) -> bool {
        self.start <= self.end
    }

    /// Whether `id` lies inside the range.
    pub const fn contains(self, id: u32) -> bool {
        self.start <= id && id <= self.end
    }
}

/// MUTATION_SELECT strategy: compares the active mutant id with each site's id.
#[derive(Debug, Clone, Default)]
pub struct MutantSelector<H = NoopHooks> {
    active: MutantId,
    hooks: H,
}

impl MutantSelector<NoopHooks> {
    /// Selector for `active` without hook side effects.
    pub fn new(active: MutantId) -> Self {
        Self {
            active,
            hooks: NoopHooks,
        }
    }
}

impl<H: MutationHooks> MutantSelector<H> {
    /// Selector for `active` notifying `hooks`.
    pub fn with_hooks(active: MutantId, hooks: H) -> Self {
        Self { active, hooks }
    }

    /// Active mutant id, fixed for the selector's lifetime.
    pub fn active(&self) -> MutantId {
        self.active
    }

    /// Hook sink.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }
}

impl<H: MutationHooks> sealed::Sealed for MutantSelector<H> {}

impl<H: MutationHooks> Resolve for MutantSelector<H> {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::MutationSelect
    }

    fn select<T>(&self, site: &VariantSite, old: T, new: T) -> T {
        self.hooks.pre_select(site.range());
        let mutated = site.id().is_some_and(|id| self.active.activates(id));
        let value = if mutated { old } else { new };
        self.hooks.post_select(SiteRange::POST_SELECTION);
        value
    }
}
