//! Pre/post selection notifications.
//!
//! The selector only promises to call these at the documented points. What
//! they record belongs to whatever tracer or fault-localization tool sits
//! behind them.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::hint::black_box;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::SiteRange;
use crate::error::Result;

/// Notification sink for MUTATION_SELECT sites.
pub trait MutationHooks: Send + Sync {
    /// Called before the id comparison with the range the site owns.
    fn pre_select(&self, range: SiteRange);

    /// Called after the id comparison with [`SiteRange::POST_SELECTION`].
    fn post_select(&self, range: SiteRange);
}

impl<H: MutationHooks + ?Sized> MutationHooks for Arc<H> {
    fn pre_select(&self, range: SiteRange) {
        (**self).pre_select(range);
    }

    fn post_select(&self, range: SiteRange) {
        (**self).post_select(range);
    }
}

impl<H: MutationHooks + ?Sized> MutationHooks for Box<H> {
    fn pre_select(&self, range: SiteRange) {
        (**self).pre_select(range);
    }

    fn post_select(&self, range: SiteRange) {
        (**self).post_select(range);
    }
}

/// Notifies both sinks, first `A` then `B`.
impl<A: MutationHooks, B: MutationHooks> MutationHooks for (A, B) {
    fn pre_select(&self, range: SiteRange) {
        self.0.pre_select(range);
        self.1.pre_select(range);
    }

    fn post_select(&self, range: SiteRange) {
        self.0.post_select(range);
        self.1.post_select(range);
    }
}

/// Ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl MutationHooks for NoopHooks {
    fn pre_select(&self, _range: SiteRange) {}

    fn post_select(&self, _range: SiteRange) {}
}

static PRE_SELECTION_HITS: AtomicU64 = AtomicU64::new(0);
static POST_SELECTION_HITS: AtomicU64 = AtomicU64::new(0);

/// Pre-selection entry point exported for external tracers.
#[unsafe(export_name = "klee_semu_GenMu_Mutant_ID_Selector_Func")]
#[inline(never)]
pub extern "C" fn mutant_selection_point(start: u32, end: u32) {
    PRE_SELECTION_HITS.fetch_add(1, Ordering::Relaxed);
    let _ = black_box((start, end));
}

/// Post-selection entry point exported for external tracers.
#[unsafe(export_name = "klee_semu_GenMu_Post_Mutation_Point_Func")]
#[inline(never)]
pub extern "C" fn post_mutation_point(start: u32, end: u32) {
    POST_SELECTION_HITS.fetch_add(1, Ordering::Relaxed);
    let _ = black_box((start, end));
}

/// Native calls that reached the exported entry points so far.
///
/// A tool that intercepts the symbols replaces the bodies, so these only
/// count uninstrumented runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPointHits {
    /// Calls to [`mutant_selection_point`].
    pub pre_selection: u64,
    /// Calls to [`post_mutation_point`].
    pub post_selection: u64,
}

/// Snapshot of the entry point counters.
pub fn entry_point_hits() -> EntryPointHits {
    EntryPointHits {
        pre_selection: PRE_SELECTION_HITS.load(Ordering::Relaxed),
        post_selection: POST_SELECTION_HITS.load(Ordering::Relaxed),
    }
}

/// Calls the exported entry points so an instrumenting tool can intercept them.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterceptableHooks;

impl MutationHooks for InterceptableHooks {
    fn pre_select(&self, range: SiteRange) {
        mutant_selection_point(range.start, range.end);
    }

    fn post_select(&self, range: SiteRange) {
        post_mutation_point(range.start, range.end);
    }
}

/// Emits `trace` events under the `shadow_switch::hooks` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHooks;

impl MutationHooks for TracingHooks {
    fn pre_select(&self, range: SiteRange) {
        tracing::trace!(
            target: "shadow_switch::hooks",
            start = range.start,
            end = range.end,
            "pre-selection"
        );
    }

    fn post_select(&self, range: SiteRange) {
        tracing::trace!(
            target: "shadow_switch::hooks",
            start = range.start,
            end = range.end,
            "post-selection"
        );
    }
}

/// One recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HookEvent {
    /// Before the id comparison.
    PreSelect {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },
    /// After the id comparison.
    PostSelect {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },
}

/// Keeps every notification in memory, in call order.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<HookEvent>>,
}

impl RecordingHooks {
    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<HookEvent> {
        self.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every recorded event.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Ranges reported by pre-selection events, i.e. the sites that executed.
    pub fn executed_ranges(&self) -> Vec<SiteRange> {
        self.lock()
            .iter()
            .filter_map(|event| match *event {
                HookEvent::PreSelect { start, end } => Some(SiteRange { start, end }),
                HookEvent::PostSelect { .. } => None,
            })
            .collect()
    }

    /// Recorded events as JSON lines.
    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for event in self.lock().iter() {
            let line = serde_json::to_string(event)?;
            let _ = writeln!(out, "{line}");
        }
        Ok(out)
    }

    /// Append recorded events to `path` as JSON lines.
    pub fn append_jsonl(&self, path: &Path) -> Result<()> {
        let text = self.to_jsonl()?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HookEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MutationHooks for RecordingHooks {
    fn pre_select(&self, range: SiteRange) {
        self.lock().push(HookEvent::PreSelect {
            start: range.start,
            end: range.end,
        });
    }

    fn post_select(&self, range: SiteRange) {
        self.lock().push(HookEvent::PostSelect {
            start: range.start,
            end: range.end,
        });
    }
}
