//! Run-time switch configuration.

use serde::{Deserialize, Serialize};

use crate::context::{ExecutionContext, Resolver};
use crate::env_switch::DEFAULT_OLD_VERSION_FLAG;
use crate::error::{Result, SwitchError};
use crate::mode::{BUILD, GuardStyle, ResolutionMode};
use crate::oracle::{InterceptableOracle, configure_fallback_flag};
use crate::selector::{InterceptableHooks, MUTANT_ID_ENV, MutantId, TracingHooks};

/// Configuration of one instrumented run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitchConfig {
    /// Resolution mode.
    pub mode: ResolutionMode,
    /// Guard emission style.
    pub guards: GuardStyle,
    /// Environment flag consulted by the DUAL fallback.
    pub old_version_flag: String,
    /// Active mutant id for MUTATION_SELECT.
    pub active_mutant: MutantId,
    /// Emit `tracing` events from the selection hooks.
    pub trace_hooks: bool,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            mode: BUILD.mode,
            guards: BUILD.guards,
            old_version_flag: DEFAULT_OLD_VERSION_FLAG.to_string(),
            active_mutant: MutantId::BASELINE,
            trace_hooks: false,
        }
    }
}

impl SwitchConfig {
    /// Defaults plus the active mutant id handed over by the harness in
    /// `SHADOW_SWITCH_MUTANT_ID`.
    pub fn from_env() -> Result<Self> {
        let config = Self::default();
        match std::env::var(MUTANT_ID_ENV) {
            Ok(raw) => {
                let id = parse_env_mutant_id(&raw)?;
                tracing::debug!(mutant = %id, "active mutant taken from environment");
                Ok(config.with_active_mutant(id))
            }
            Err(std::env::VarError::NotPresent) => Ok(config),
            Err(std::env::VarError::NotUnicode(raw)) => Err(SwitchError::InvalidMutantId {
                value: raw.to_string_lossy().into_owned(),
                source_name: MUTANT_ID_ENV.to_string(),
            }),
        }
    }

    /// Set resolution mode.
    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set guard emission style.
    pub fn with_guards(mut self, guards: GuardStyle) -> Self {
        self.guards = guards;
        self
    }

    /// Set the DUAL fallback flag name.
    pub fn with_old_version_flag(mut self, flag: impl Into<String>) -> Self {
        self.old_version_flag = flag.into();
        self
    }

    /// Set active mutant id.
    pub fn with_active_mutant(mut self, id: MutantId) -> Self {
        self.active_mutant = id;
        self
    }

    /// Toggle hook tracing.
    pub fn with_trace_hooks(mut self, enabled: bool) -> Self {
        self.trace_hooks = enabled;
        self
    }

    /// Build the context described by this config.
    ///
    /// DUAL always resolves through the interceptable `klee_change` symbol. A
    /// non-default flag becomes the process-wide fallback of that symbol, so
    /// it fails if another flag was configured first. MUTATION_SELECT always
    /// calls the exported hook entry points, plus `tracing` events when
    /// `trace_hooks` is set.
    pub fn build_context(&self) -> Result<ExecutionContext> {
        let resolver = match self.mode {
            ResolutionMode::Dual => {
                if self.old_version_flag != DEFAULT_OLD_VERSION_FLAG {
                    configure_fallback_flag(self.old_version_flag.clone())?;
                }
                Resolver::dual(InterceptableOracle)
            }
            ResolutionMode::MutationSelect if self.trace_hooks => {
                Resolver::mutation(self.active_mutant, (InterceptableHooks, TracingHooks))
            }
            ResolutionMode::MutationSelect => {
                Resolver::mutation(self.active_mutant, InterceptableHooks)
            }
            mode => Resolver::for_mode(mode),
        };
        Ok(ExecutionContext::new(resolver, self.guards))
    }
}

fn parse_env_mutant_id(raw: &str) -> Result<MutantId> {
    raw.parse::<MutantId>().map_err(|err| match err {
        SwitchError::InvalidMutantId { value, .. } => SwitchError::InvalidMutantId {
            value,
            source_name: MUTANT_ID_ENV.to_string(),
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{fallback_flag, oracle_hits};
    use crate::selector::entry_point_hits;
    use crate::site::VariantSite;

    #[test]
    fn defaults_follow_the_build_profile() {
        let config = SwitchConfig::default();
        assert_eq!(config.mode, BUILD.mode);
        assert_eq!(config.guards, BUILD.guards);
        assert_eq!(config.old_version_flag, DEFAULT_OLD_VERSION_FLAG);
        assert!(config.active_mutant.is_baseline());
    }

    #[test]
    fn builder_overrides_work() {
        let config = SwitchConfig::default()
            .with_mode(ResolutionMode::MutationSelect)
            .with_guards(GuardStyle::Opaque)
            .with_old_version_flag("USE_OLD")
            .with_active_mutant(MutantId(4))
            .with_trace_hooks(true);

        assert_eq!(config.mode, ResolutionMode::MutationSelect);
        assert_eq!(config.guards, GuardStyle::Opaque);
        assert_eq!(config.old_version_flag, "USE_OLD");
        assert_eq!(config.active_mutant, MutantId(4));
        assert!(config.trace_hooks);
    }

    #[test]
    fn built_context_honours_mode_and_mutant() {
        let context = SwitchConfig::default()
            .with_mode(ResolutionMode::MutationSelect)
            .with_active_mutant(MutantId(7))
            .build_context()
            .expect("mutation context should build");
        assert_eq!(context.mode(), ResolutionMode::MutationSelect);
        assert_eq!(context.active_mutant(), Some(MutantId(7)));
        assert_eq!(context.select(&VariantSite::numbered(7), 1, 2), 1);
        assert_eq!(context.select(&VariantSite::numbered(6), 1, 2), 2);
    }

    // The only test in this binary that configures the oracle fallback flag.
    #[test]
    fn custom_flag_stays_behind_the_interceptable_oracle() {
        let flag = "SHADOW_SWITCH_TEST_FLAG_THAT_IS_NEVER_SET";
        let config = SwitchConfig::default()
            .with_mode(ResolutionMode::Dual)
            .with_old_version_flag(flag);
        let context = config.build_context().expect("dual context should build");
        assert_eq!(fallback_flag(), flag);

        let before = oracle_hits();
        assert_eq!(context.select(&VariantSite::unassigned(), "old", "new"), "new");
        assert!(oracle_hits() > before);

        config.build_context().expect("same flag can be configured again");
        let err = config
            .with_old_version_flag("PATH")
            .build_context()
            .expect_err("a second flag should be rejected");
        assert!(matches!(err, SwitchError::FallbackFlagConflict { .. }));
    }

    #[test]
    fn mutation_contexts_reach_exported_hooks_with_or_without_tracing() {
        let base = SwitchConfig::default()
            .with_mode(ResolutionMode::MutationSelect)
            .with_active_mutant(MutantId(2));
        let before = entry_point_hits();
        for config in [base.clone(), base.with_trace_hooks(true)] {
            let context = config.build_context().expect("mutation context should build");
            assert_eq!(context.select(&VariantSite::numbered(2), 1, 2), 1);
        }
        let after = entry_point_hits();
        assert!(after.pre_selection >= before.pre_selection + 2);
        assert!(after.post_selection >= before.post_selection + 2);
    }

    #[test]
    fn mutant_id_errors_name_the_environment_variable() {
        assert_eq!(
            parse_env_mutant_id(" 7 ").expect("padded id should parse"),
            MutantId(7)
        );
        let err = parse_env_mutant_id("seven").expect_err("non-numeric id should fail");
        assert_eq!(
            err.to_string(),
            format!("invalid mutant id `seven` in {MUTANT_ID_ENV}")
        );
    }

    #[test]
    fn config_serializes_as_json() {
        let config = SwitchConfig::default()
            .with_mode(ResolutionMode::Old)
            .with_active_mutant(MutantId(3));
        let json = serde_json::to_value(&config).expect("config should serialize");
        assert_eq!(json["mode"], "old");
        assert_eq!(json["active_mutant"], 3);
        let decoded: SwitchConfig = serde_json::from_value(json).expect("config should decode");
        assert_eq!(decoded, config);
    }
}
