use shadow_switch::{
    ExecutionContext, GuardStyle, InterceptableHooks, MutantId, ResolutionMode, Resolver,
    entry_point_hits, guard_false, guard_style, guard_true, install, variant,
};

// Installing fixes the process slot, so everything runs in one test.
#[test]
fn installed_context_drives_sites_hooks_and_guards() {
    let guards = match GuardStyle::default_for(shadow_switch::BUILD.mode) {
        GuardStyle::Opaque => GuardStyle::Constant,
        GuardStyle::Constant => GuardStyle::Opaque,
    };
    let context = install(ExecutionContext::new(
        Resolver::mutation(MutantId(2), InterceptableHooks),
        guards,
    ))
    .expect("first install should succeed");
    assert_eq!(context.mode(), ResolutionMode::MutationSelect);

    assert_eq!(guard_style(), guards);
    assert!(guard_true());
    assert!(!guard_false());

    let before = entry_point_hits();
    let hit: i64 = variant!(id = 2, -1, 0);
    let missed: i64 = variant!(id = 3, -1, 0);
    let after = entry_point_hits();

    assert_eq!((hit, missed), (-1, 0));
    assert_eq!(after.pre_selection - before.pre_selection, 2);
    assert_eq!(after.post_selection - before.post_selection, 2);
}
