//! Variant sites and the sealed set of resolution strategies.
//!
//! A [`VariantSite`] is the identity of one instrumented change location. A
//! [`Resolve`] implementation decides which of the two values the site
//! yields. There are exactly four strategies, one per
//! [`ResolutionMode`]:
//!
//! | mode              | strategy                 | result                                    |
//! |-------------------|--------------------------|-------------------------------------------|
//! | `Old`             | [`OldResolver`]          | always `old`                              |
//! | `New`             | [`NewResolver`]          | always `new`                              |
//! | `Dual`            | [`DualResolver`]         | oracle; natively the old-version flag     |
//! | `MutationSelect`  | [`MutantSelector`]       | `old` iff site id == active mutant id     |
//!
//! No strategy fails, allocates on its own account or remembers earlier calls.

use crate::mode::ResolutionMode;
use crate::oracle::{ChangeOracle, InterceptableOracle, pick};
use crate::selector::{SiteId, SiteRange};

#[cfg(doc)]
use crate::selector::MutantSelector;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Identity of one instrumented change location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSite {
    id: Option<SiteId>,
    range: SiteRange,
}

impl VariantSite {
    /// Site without a mutant id. Never mutated under MUTATION_SELECT.
    pub const fn unassigned() -> Self {
        Self {
            id: None,
            range: SiteRange { start: 0, end: 0 },
        }
    }

    /// Site owning exactly `id`.
    pub const fn assigned(id: SiteId) -> Self {
        Self {
            id: Some(id),
            range: SiteRange::single(id),
        }
    }

    /// Site from a raw generator-assigned number; `0` yields an unassigned site.
    pub const fn numbered(raw: u32) -> Self {
        match SiteId::new(raw) {
            Some(id) => Self::assigned(id),
            None => Self::unassigned(),
        }
    }

    /// Override the range reported to the pre-selection hook.
    pub const fn with_range(mut self, range: SiteRange) -> Self {
        self.range = range;
        self
    }

    /// Assigned id, if any.
    pub const fn id(&self) -> Option<SiteId> {
        self.id
    }

    /// Range owned by this site.
    pub const fn range(&self) -> SiteRange {
        self.range
    }
}

/// Picks one of two candidate values for a site.
///
/// Sealed: the four strategies in this crate are the whole set.
pub trait Resolve: sealed::Sealed {
    /// Mode this strategy implements.
    fn mode(&self) -> ResolutionMode;

    /// Resolve `site` to `old` or `new`.
    fn select<T>(&self, site: &VariantSite, old: T, new: T) -> T;
}

/// OLD strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct OldResolver;

impl sealed::Sealed for OldResolver {}

impl Resolve for OldResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Old
    }

    #[inline(always)]
    fn select<T>(&self, _site: &VariantSite, old: T, _new: T) -> T {
        old
    }
}

/// NEW strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct NewResolver;

impl sealed::Sealed for NewResolver {}

impl Resolve for NewResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::New
    }

    #[inline(always)]
    fn select<T>(&self, _site: &VariantSite, _old: T, new: T) -> T {
        new
    }
}

/// DUAL strategy: asks a [`ChangeOracle`], by default the interceptable entry point.
#[derive(Debug, Default, Clone)]
pub struct DualResolver<O = InterceptableOracle> {
    oracle: O,
}

impl<O: ChangeOracle> DualResolver<O> {
    /// Strategy backed by `oracle`.
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// Backing oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}

impl<O: ChangeOracle> sealed::Sealed for DualResolver<O> {}

impl<O: ChangeOracle> Resolve for DualResolver<O> {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Dual
    }

    fn select<T>(&self, _site: &VariantSite, old: T, new: T) -> T {
        pick(&self.oracle, old, new)
    }
}
