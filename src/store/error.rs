use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Lifecycle phase of a container.
///
/// A container starts in [`Phase::Writing`], becomes [`Phase::Ready`] once
/// and for all when `index(..)` seals it, and ends [`Phase::Closed`].
/// There are no backwards transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting appends; nothing is readable yet.
    Writing,
    /// Sorted (and possibly key-indexed); read-only.
    Ready,
    /// Flushed and released; the file persists on disk.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Writing => write!(f, "writing"),
            Phase::Ready => write!(f, "ready"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

/// Errors surfaced by the storage engine.
///
/// The I/O variants wrap the underlying [`io::Error`] and are fatal to the
/// operation that hit them; nothing is retried internally. The remaining
/// variants flag caller bugs (wrong phase, missing index, out-of-domain
/// keys) as typed errors instead of aborting.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be created, replaced, or truncated.
    #[error("cannot create or truncate backing file {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// The backing file could not be mapped (or remapped) into memory.
    #[error("cannot map backing file: {0}")]
    Map(#[source] io::Error),

    /// The filesystem refused to grow the backing file.
    #[error("cannot extend backing file to {bytes} bytes: {source}")]
    Extend { bytes: u64, source: io::Error },

    /// An operation was invoked in the wrong lifecycle phase.
    #[error("operation requires the {required} phase, container is {actual}")]
    Phase { required: Phase, actual: Phase },

    /// The operation needs a key index, but the container was sealed
    /// without one.
    #[error("operation requires a key index; seal the container with a maximum key")]
    Unindexed,

    /// Random access past the end of the record array.
    #[error("record {index} out of range: container holds {len} records")]
    OutOfBounds { index: u64, len: u64 },

    /// The key equals (or the declared domain reaches) the engine's
    /// reserved end-of-run marker.
    #[error("key {0:#x} is reserved as the end-of-run marker")]
    ReservedKey(u64),

    /// A stored key lies outside the declared dense key domain.
    #[error("key {key} exceeds the declared maximum key {max_key}")]
    KeyAboveMax { key: u64, max_key: u64 },

    /// The dedicated sort thread pool could not be built.
    #[error("cannot build sort thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
