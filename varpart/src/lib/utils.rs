pub use std::hash::BuildHasherDefault;
pub use thiserror::Error;
pub use itertools::Itertools;
pub use indexmap::IndexMap;
pub use ahash::AHasher;
pub use serde::{Serialize, Deserialize};
pub use log::{debug, trace, warn};

pub use crate::{
    region::*,
    process::*,
    partition::*,
    free::*,
    carve::*,
    coalesce::*,
};

/// The unit for measuring both space and logical time. A region's
/// start and size are counted in it, and so are a process's arrival
/// and duration. `varpart` does not care what one unit stands for.
pub type ByteSteps = usize;

/// Insertion-ordered map with a fast, non-cryptographic hasher.
/// Iteration order is reproducible across runs, which keeps logs and
/// layouts stable.
pub type FastMap<K, V> = IndexMap<K, V, BuildHasherDefault<AHasher>>;

/// Which side of a region a neighbor sits on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left  => { write!(f, "left") },
            Side::Right => { write!(f, "right") },
        }
    }
}

/// Structural damage in the free set or the partition set. None of
/// these should ever be observed under a correct caller: they are
/// surfaced, never repaired.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("region at {start} has zero size")]
    ZeroSize { start: ByteSteps },
    #[error("region at {start} of size {size} overflows the address type")]
    Overflow { start: ByteSteps, size: ByteSteps },
    #[error("{count} free regions are {side}-adjacent to [{}, {})", .of.start(), .of.end())]
    ManyNeighbors { of: Region, side: Side, count: usize },
    #[error("[{}, {}) is not the {side} neighbor of [{}, {})", .neighbor.start(), .neighbor.end(), .of.start(), .of.end())]
    NotAdjacent { neighbor: Region, of: Region, side: Side },
    #[error("address space has a hole over [{}, {})", .hole.start(), .hole.end())]
    Gap { hole: Region },
    #[error("[{}, {}) overlaps [{}, {})", .a.start(), .a.end(), .b.start(), .b.end())]
    Overlap { a: Region, b: Region },
    #[error("[{}, {}) escapes the address space [{}, {})", .culprit.start(), .culprit.end(), .space.start(), .space.end())]
    OutOfBounds { culprit: Region, space: Region },
    #[error("partition of {process} spans {span_size} bytes, process asked for {process_size}")]
    SizeMismatch { process: ProcessId, span_size: ByteSteps, process_size: ByteSteps },
    #[error("free regions [{}, {}) and [{}, {}) were left unmerged", .left.start(), .left.end(), .right.start(), .right.end())]
    Unmerged { left: Region, right: Region },
}

/// Everything the engine (and the address-space bookkeeping around it)
/// may refuse to do.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The chosen free region is too small. This is a placement-policy
    /// bug on the caller's side. The process is handed back untouched.
    #[error("process {} needs {} bytes, region at {start} holds {available}", .culprit.id(), .culprit.size())]
    InsufficientSpace {
        culprit:    Process,
        start:      ByteSteps,
        available:  ByteSteps,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(#[from] Violation),
    #[error("no free region with handle {0}")]
    UnknownRegion(RegionId),
    #[error("no live partition belongs to process {0}")]
    UnknownProcess(ProcessId),
    #[error("process {} already owns a partition", .culprit.id())]
    DuplicateProcess { culprit: Process },
}

/// Appears while constructing a [Process] descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (process {culprit})")]
pub struct ProcessError {
    pub message: String,
    pub culprit: ProcessId,
}

pub type Result<T> = std::result::Result<T, EngineError>;
