//! Interception boundary for shadow symbolic execution.
//!
//! [`klee_change`] is exported unmangled and never inlined. A symbolic
//! execution engine that recognizes the symbol replaces the call with a fork
//! over `{old, new}`; the body below only runs natively, where it defers to
//! the old-version environment flag. The flag name defaults to
//! [`DEFAULT_OLD_VERSION_FLAG`] and can be replaced once per process with
//! [`configure_fallback_flag`].

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use crate::env_switch::{DEFAULT_OLD_VERSION_FLAG, EnvSwitch, FlagSource};
use crate::error::{Result, SwitchError};

/// Widest integer the target naturally addresses.
pub type Word = usize;

/// Unmangled name of the interceptable entry point.
pub const ORACLE_SYMBOL: &str = "klee_change";

/// Tag passed as `old` when the oracle only has to pick a side.
pub const OLD_TAG: Word = 1;
/// Tag passed as `new` when the oracle only has to pick a side.
pub const NEW_TAG: Word = 0;

static FALLBACK_FLAG: OnceLock<Cow<'static, str>> = OnceLock::new();
static ORACLE_HITS: AtomicU64 = AtomicU64::new(0);

/// Interceptable change point. Returns either `old` or `new`.
#[unsafe(no_mangle)]
#[inline(never)]
pub extern "C" fn klee_change(old: Word, new: Word) -> Word {
    ORACLE_HITS.fetch_add(1, Ordering::Relaxed);
    EnvSwitch::named(fallback_flag()).choose(old, new)
}

/// Flag read by the native body of [`klee_change`].
pub fn fallback_flag() -> &'static str {
    FALLBACK_FLAG
        .get()
        .map_or(DEFAULT_OLD_VERSION_FLAG, |flag| &**flag)
}

/// Set the flag read by the native body of [`klee_change`].
///
/// The name is process-wide and fixed by the first call. Asking again for the
/// same name is a no-op, asking for a different one fails. Calls that ran
/// before configuration read the default flag.
pub fn configure_fallback_flag(name: impl Into<Cow<'static, str>>) -> Result<()> {
    match FALLBACK_FLAG.set(name.into()) {
        Ok(()) => {
            tracing::info!(flag = fallback_flag(), "configured oracle fallback flag");
            Ok(())
        }
        Err(requested) => {
            let current = fallback_flag();
            if current == requested {
                Ok(())
            } else {
                Err(SwitchError::FallbackFlagConflict {
                    current: current.to_string(),
                    requested: requested.into_owned(),
                })
            }
        }
    }
}

/// Native calls that reached [`klee_change`] so far. An engine that
/// intercepts the symbol never runs the body, so it leaves this untouched.
pub fn oracle_hits() -> u64 {
    ORACLE_HITS.load(Ordering::Relaxed)
}

/// Two-valued oracle constrained to return one of its arguments.
pub trait ChangeOracle {
    /// Return `old` or `new`.
    fn change(&self, old: Word, new: Word) -> Word;
}

/// Routes through the exported [`klee_change`] symbol.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterceptableOracle;

impl ChangeOracle for InterceptableOracle {
    fn change(&self, old: Word, new: Word) -> Word {
        klee_change(old, new)
    }
}

impl<O: ChangeOracle + ?Sized> ChangeOracle for Arc<O> {
    fn change(&self, old: Word, new: Word) -> Word {
        (**self).change(old, new)
    }
}

impl<F: FlagSource> ChangeOracle for EnvSwitch<F> {
    fn change(&self, old: Word, new: Word) -> Word {
        self.choose(old, new)
    }
}

/// Resolve arbitrary values by asking the oracle to pick between two tags.
pub fn pick<O, T>(oracle: &O, old: T, new: T) -> T
where
    O: ChangeOracle + ?Sized,
{
    if oracle.change(OLD_TAG, NEW_TAG) == OLD_TAG {
        old
    } else {
        new
    }
}
