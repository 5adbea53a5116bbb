//! Environment-driven two-way switch used by the DUAL fallback.
//!
//! [`ProcessEnv`] goes through [`std::env::var_os`], which copies the value
//! into an `OsString` when the flag is present. That is the one heap
//! allocation on a resolution path, and only in native DUAL runs with the
//! flag set. [`StaticFlags`] never allocates on lookup.

use std::borrow::Cow;
use std::collections::BTreeSet;

/// Environment flag whose presence selects the old version.
pub const DEFAULT_OLD_VERSION_FLAG: &str = "KLEE_CHANGE_RUNTIME_SET_OLD_VERSION";

/// Source of named presence flags.
pub trait FlagSource {
    /// Whether `name` is present. The value, if any, is ignored.
    fn is_present(&self, name: &str) -> bool;
}

/// Reads the live process environment on every query. Allocates when the flag is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl FlagSource for ProcessEnv {
    fn is_present(&self, name: &str) -> bool {
        std::env::var_os(name).is_some()
    }
}

/// Fixed set of present flags, for harnesses that must not touch the real environment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StaticFlags {
    present: BTreeSet<String>,
}

impl StaticFlags {
    /// Empty set: every flag is absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as present.
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.present.insert(name.into());
        self
    }
}

impl FlagSource for StaticFlags {
    fn is_present(&self, name: &str) -> bool {
        self.present.contains(name)
    }
}

/// Presence check of one named flag.
#[derive(Debug, Clone)]
pub struct EnvSwitch<F = ProcessEnv> {
    name: Cow<'static, str>,
    source: F,
}

impl EnvSwitch<ProcessEnv> {
    /// Switch on [`DEFAULT_OLD_VERSION_FLAG`] in the process environment.
    pub const fn process() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_OLD_VERSION_FLAG),
            source: ProcessEnv,
        }
    }

    /// Switch on a custom flag name in the process environment.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: ProcessEnv,
        }
    }
}

impl Default for EnvSwitch<ProcessEnv> {
    fn default() -> Self {
        Self::process()
    }
}

impl<F: FlagSource> EnvSwitch<F> {
    /// Switch on `name` looked up in `source`.
    pub fn with_source(name: impl Into<Cow<'static, str>>, source: F) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// Flag name this switch reads.
    pub fn flag_name(&self) -> &str {
        &self.name
    }

    /// Fresh read: `true` when the flag is present.
    pub fn wants_old(&self) -> bool {
        self.source.is_present(&self.name)
    }

    /// `old` when the flag is present, otherwise `new`.
    pub fn choose<T>(&self, old: T, new: T) -> T {
        if self.wants_old() { old } else { new }
    }
}
