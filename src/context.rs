//! Per-run execution context and the process-wide slot.
//!
//! A context is built once (usually from [`SwitchConfig`](crate::SwitchConfig))
//! and is immutable afterwards. It can be passed explicitly to every site, or
//! installed once into the process slot that backs [`select`] and
//! [`variant!`](crate::variant).

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{Result, SwitchError};
use crate::mode::{BUILD, BuildProfile, GuardStyle, ResolutionMode};
use crate::oracle::{ChangeOracle, InterceptableOracle};
use crate::selector::{InterceptableHooks, MutantId, MutantSelector, MutationHooks};
use crate::site::{DualResolver, NewResolver, OldResolver, Resolve, VariantSite, sealed};

/// Shared oracle handle used by the DUAL strategy inside a context.
pub type SharedOracle = Arc<dyn ChangeOracle + Send + Sync>;
/// Shared hook handle used by the MUTATION_SELECT strategy inside a context.
pub type SharedHooks = Arc<dyn MutationHooks>;

/// One of the four strategies, chosen once when the context is built.
pub enum Resolver {
    /// OLD.
    Old(OldResolver),
    /// NEW.
    New(NewResolver),
    /// DUAL.
    Dual(DualResolver<SharedOracle>),
    /// MUTATION_SELECT.
    Mutation(MutantSelector<SharedHooks>),
}

impl Resolver {
    /// Default strategy for `mode`: interceptable oracle, or baseline mutant
    /// with the exported hook entry points.
    pub fn for_mode(mode: ResolutionMode) -> Self {
        match mode {
            ResolutionMode::Old => Self::Old(OldResolver),
            ResolutionMode::New => Self::New(NewResolver),
            ResolutionMode::Dual => Self::dual(InterceptableOracle),
            ResolutionMode::MutationSelect => {
                Self::mutation(MutantId::BASELINE, InterceptableHooks)
            }
        }
    }

    /// DUAL strategy backed by `oracle`.
    pub fn dual<O>(oracle: O) -> Self
    where
        O: ChangeOracle + Send + Sync + 'static,
    {
        let oracle: SharedOracle = Arc::new(oracle);
        Self::Dual(DualResolver::new(oracle))
    }

    /// MUTATION_SELECT strategy for `active`, notifying `hooks`.
    pub fn mutation<H>(active: MutantId, hooks: H) -> Self
    where
        H: MutationHooks + 'static,
    {
        let hooks: SharedHooks = Arc::new(hooks);
        Self::Mutation(MutantSelector::with_hooks(active, hooks))
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Resolver");
        out.field("mode", &self.mode());
        if let Self::Mutation(selector) = self {
            out.field("active", &selector.active());
        }
        out.finish()
    }
}

impl sealed::Sealed for Resolver {}

impl Resolve for Resolver {
    fn mode(&self) -> ResolutionMode {
        match self {
            Self::Old(inner) => inner.mode(),
            Self::New(inner) => inner.mode(),
            Self::Dual(inner) => inner.mode(),
            Self::Mutation(inner) => inner.mode(),
        }
    }

    #[inline]
    fn select<T>(&self, site: &VariantSite, old: T, new: T) -> T {
        match self {
            Self::Old(inner) => inner.select(site, old, new),
            Self::New(inner) => inner.select(site, old, new),
            Self::Dual(inner) => inner.select(site, old, new),
            Self::Mutation(inner) => inner.select(site, old, new),
        }
    }
}

/// Immutable resolution state for one run.
#[derive(Debug)]
pub struct ExecutionContext {
    resolver: Resolver,
    guards: GuardStyle,
}

impl ExecutionContext {
    /// Context from an explicit strategy and guard style.
    pub fn new(resolver: Resolver, guards: GuardStyle) -> Self {
        Self { resolver, guards }
    }

    /// Default context for a build profile.
    pub fn from_profile(profile: BuildProfile) -> Self {
        Self::new(Resolver::for_mode(profile.mode), profile.guards)
    }

    /// Default context for `mode`, with that mode's default guard style.
    pub fn for_mode(mode: ResolutionMode) -> Self {
        Self::new(Resolver::for_mode(mode), GuardStyle::default_for(mode))
    }

    /// Resolve one site.
    #[inline]
    pub fn select<T>(&self, site: &VariantSite, old: T, new: T) -> T {
        self.resolver.select(site, old, new)
    }

    /// Active resolution mode.
    pub fn mode(&self) -> ResolutionMode {
        self.resolver.mode()
    }

    /// Guard emission style.
    pub fn guards(&self) -> GuardStyle {
        self.guards
    }

    /// Active mutant id under MUTATION_SELECT.
    pub fn active_mutant(&self) -> Option<MutantId> {
        match &self.resolver {
            Resolver::Mutation(selector) => Some(selector.active()),
            _ => None,
        }
    }

    /// `true` through this context's guard style.
    #[inline(always)]
    pub fn guard_true(&self) -> bool {
        self.guards.truthy()
    }

    /// `false` through this context's guard style.
    #[inline(always)]
    pub fn guard_false(&self) -> bool {
        self.guards.falsy()
    }

    /// Underlying strategy.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::from_profile(BUILD)
    }
}

static CONTEXT: OnceLock<ExecutionContext> = OnceLock::new();

/// Install the process-wide context. Must run before the first instrumented call.
pub fn install(context: ExecutionContext) -> Result<&'static ExecutionContext> {
    let mode = context.mode();
    let active = context.active_mutant();
    CONTEXT
        .set(context)
        .map_err(|_| SwitchError::AlreadyInstalled)?;
    tracing::info!(%mode, ?active, "installed shadow-switch execution context");
    Ok(current())
}

/// Installed context, or the build profile's default if none was installed.
pub fn current() -> &'static ExecutionContext {
    CONTEXT.get_or_init(|| {
        tracing::debug!(mode = %BUILD.mode, "using build-profile execution context");
        ExecutionContext::from_profile(BUILD)
    })
}

/// Resolve `site` through the process-wide context.
#[inline]
pub fn select<T>(site: &VariantSite, old: T, new: T) -> T {
    current().select(site, old, new)
}

/// Resolve a variant site through the process-wide context.
///
/// ```rust
/// let seed: i64 = shadow_switch::variant!(-1, 0);
/// let offset: i64 = shadow_switch::variant!(id = 3, 1, 2);
/// # let _ = (seed, offset);
/// ```
#[macro_export]
macro_rules! variant {
    (id = $id:expr, $old:expr, $new:expr $(,)?) => {
        $crate::select(&$crate::VariantSite::numbered($id), $old, $new)
    };
    ($old:expr, $new:expr $(,)?) => {
        $crate::select(&$crate::VariantSite::unassigned(), $old, $new)
    };
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::env_switch::{DEFAULT_OLD_VERSION_FLAG, EnvSwitch, StaticFlags};
    use crate::selector::{HookEvent, NoopHooks, RecordingHooks, entry_point_hits};

    fn flagged_dual() -> ExecutionContext {
        let flags = StaticFlags::new().with(DEFAULT_OLD_VERSION_FLAG);
        ExecutionContext::new(
            Resolver::dual(EnvSwitch::with_source(DEFAULT_OLD_VERSION_FLAG, flags)),
            GuardStyle::Opaque,
        )
    }

    #[test]
    fn for_mode_builds_matching_strategy() {
        for mode in ResolutionMode::ALL {
            let context = ExecutionContext::for_mode(mode);
            assert_eq!(context.mode(), mode);
            assert_eq!(context.guards(), GuardStyle::default_for(mode));
        }
        assert_eq!(
            ExecutionContext::for_mode(ResolutionMode::MutationSelect).active_mutant(),
            Some(MutantId::BASELINE)
        );
        assert_eq!(ExecutionContext::for_mode(ResolutionMode::Old).active_mutant(), None);
    }

    #[test]
    fn dual_context_with_flag_selects_old() {
        let context = flagged_dual();
        assert_eq!(context.select(&VariantSite::unassigned(), -1, 0), -1);
    }

    #[test]
    fn mutation_context_routes_hooks() {
        let hooks = Arc::new(RecordingHooks::default());
        let context = ExecutionContext::new(
            Resolver::mutation(MutantId(2), Arc::clone(&hooks)),
            GuardStyle::Constant,
        );
        assert_eq!(context.select(&VariantSite::numbered(2), "old", "new"), "old");
        assert_eq!(context.select(&VariantSite::numbered(1), "old", "new"), "new");
        assert_eq!(hooks.len(), 4);
        assert_eq!(hooks.events()[0], HookEvent::PreSelect { start: 2, end: 2 });
    }

    #[test]
    fn default_mutation_context_reaches_exported_hooks() {
        let before = entry_point_hits();
        let context = ExecutionContext::for_mode(ResolutionMode::MutationSelect);
        for raw in 1..=3 {
            assert_eq!(context.select(&VariantSite::numbered(raw), "old", "new"), "new");
        }
        let after = entry_point_hits();
        assert!(after.pre_selection >= before.pre_selection + 3);
        assert!(after.post_selection >= before.post_selection + 3);
    }

    #[test]
    fn guards_are_mode_independent() {
        for mode in ResolutionMode::ALL {
            let context = ExecutionContext::for_mode(mode);
            assert!(context.guard_true());
            assert!(!context.guard_false());
        }
    }

    #[test]
    fn debug_output_names_the_mode() {
        let rendered = format!("{:?}", ExecutionContext::for_mode(ResolutionMode::New));
        assert!(rendered.contains("New"));
    }

    #[test]
    fn process_slot_accepts_a_single_install() {
        let first = current().mode();
        assert!(matches!(
            install(ExecutionContext::for_mode(ResolutionMode::Old)),
            Err(SwitchError::AlreadyInstalled)
        ));
        assert_eq!(current().mode(), first);
        assert_eq!(first, BUILD.mode);
    }

    proptest! {
        #[test]
        fn repeated_selection_is_stable(old in any::<i32>(), new in any::<i32>(), raw in 0u32..6) {
            let contexts = [
                ExecutionContext::for_mode(ResolutionMode::Old),
                ExecutionContext::for_mode(ResolutionMode::New),
                flagged_dual(),
                ExecutionContext::new(Resolver::mutation(MutantId(3), NoopHooks), GuardStyle::Constant),
            ];
            let site = VariantSite::numbered(raw);
            for context in &contexts {
                let first = context.select(&site, old, new);
                prop_assert_eq!(first, context.select(&site, old, new));
            }
            prop_assert_eq!(contexts[0].select(&site, old, new), old);
            prop_assert_eq!(contexts[1].select(&site, old, new), new);
            prop_assert_eq!(contexts[2].select(&site, old, new), old);
            prop_assert_eq!(contexts[3].select(&site, old, new), if raw == 3 { old } else { new });
        }
    }
}
