//! Error type shared by configuration, install and registry operations.
//!
//! Resolving a variant site never fails; everything here happens before the
//! first instrumented call or inside generation-time tooling.

use thiserror::Error;

use crate::selector::SiteId;

/// Errors raised while configuring or validating variant sites.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Resolution mode code was not recognized.
    #[error("unknown resolution mode `{0}` (expected old, new, dual, mutation or -1, 1, 0, 2, 11)")]
    UnknownMode(String),
    /// Guard emission style was not recognized.
    #[error("unknown guard style `{0}` (expected opaque or constant)")]
    UnknownGuardStyle(String),
    /// Active mutant id could not be parsed.
    #[error("invalid mutant id `{value}` in {source_name}")]
    InvalidMutantId {
        /// Raw value that failed to parse.
        value: String,
        /// Where the value came from.
        source_name: String,
    },
    /// A process-wide context has already been installed.
    #[error("an execution context is already installed for this process")]
    AlreadyInstalled,
    /// Two unrelated changes were assigned the same site id.
    #[error("site id {id} is shared by unrelated changes `{first}` and `{second}`")]
    ConflictingSiteId {
        /// Shared id.
        id: SiteId,
        /// Change group of the first registration.
        first: String,
        /// Change group of the conflicting registration.
        second: String,
    },
    /// The native fallback of `klee_change` already reads another flag.
    #[error("oracle fallback flag is already `{current}`, cannot switch to `{requested}`")]
    FallbackFlagConflict {
        /// Flag currently read by the fallback.
        current: String,
        /// Flag that was asked for.
        requested: String,
    },
    /// Every non-zero site id has been handed out.
    #[error("site id space exhausted, id {} is already taken", u32::MAX)]
    IdSpaceExhausted,
    /// Site range has `start > end`.
    #[error("site range [{start}, {end}] is inverted")]
    InvertedRange {
        /// Range start.
        start: u32,
        /// Range end.
        end: u32,
    },
    /// Manifest (de)serialization failed.
    #[error("manifest json error: {0}")]
    Json(#[from] serde_json::Error),
    /// IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SwitchError>;
