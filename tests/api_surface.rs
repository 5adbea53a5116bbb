use shadow_switch::prelude::*;

#[test]
fn prelude_compiles_and_exports_core() {
    let ctx = ExecutionContext::for_mode(ResolutionMode::New);
    assert_eq!(ctx.select(&VariantSite::numbered(1), "old", "new"), "new");
    assert!(guard_true());
    assert!(!guard_false());
    assert_variants_diverge(|ctx| ctx.select(&VariantSite::unassigned(), 1, 2));
    let _ = SwitchConfig::default().with_active_mutant(MutantId(1));
}

#[test]
fn variant_macro_resolves_through_the_build_profile() {
    let expected_new = match shadow_switch::BUILD.mode {
        ResolutionMode::Old => false,
        ResolutionMode::New | ResolutionMode::MutationSelect => true,
        ResolutionMode::Dual => {
            std::env::var_os(shadow_switch::DEFAULT_OLD_VERSION_FLAG).is_none()
        }
    };
    let value: i64 = variant!(-1, 0);
    assert_eq!(value, if expected_new { 0 } else { -1 });
    let numbered: i64 = variant!(id = 1, -1, 0);
    assert_eq!(numbered, value);
}
