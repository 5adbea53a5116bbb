//! Guard predicates that keep statically dead branches in the compiled CFG.
//!
//! With [`GuardStyle::Opaque`] the predicates go through an out-of-line call
//! whose result passes through [`std::hint::black_box`], so the optimizer
//! cannot prove the guarded branch dead and coverage tools still see it.
//! With [`GuardStyle::Constant`] they are plain literals.
//!
//! The free functions follow the process-wide context, so a style chosen at
//! [`install`](crate::install) time wins over the build profile.

use std::hint::black_box;

use crate::context::current;
use crate::mode::GuardStyle;

#[inline(never)]
fn opaque_true() -> bool {
    black_box(true)
}

#[inline(never)]
fn opaque_false() -> bool {
    black_box(false)
}

impl GuardStyle {
    /// Always `true`, emitted according to this style.
    #[inline(always)]
    pub fn truthy(self) -> bool {
        match self {
            GuardStyle::Opaque => opaque_true(),
            GuardStyle::Constant => true,
        }
    }

    /// Always `false`, emitted according to this style.
    #[inline(always)]
    pub fn falsy(self) -> bool {
        match self {
            GuardStyle::Opaque => opaque_false(),
            GuardStyle::Constant => false,
        }
    }
}

/// Guard style of the process-wide context.
pub fn guard_style() -> GuardStyle {
    current().guards()
}

/// Always `true`, using the process-wide guard style.
#[inline(always)]
pub fn guard_true() -> bool {
    guard_style().truthy()
}

/// Always `false`, using the process-wide guard style.
#[inline(always)]
pub fn guard_false() -> bool {
    guard_style().falsy()
}
