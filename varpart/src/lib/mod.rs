//! Welcome to `varpart`!
//!
//! A simulator's engine for dynamic (variable-partition) memory
//! allocation. A contiguous address space is carved into
//! [Partition]s, each owned by one [Process], and unowned
//! [FreeRegion]s. Released partitions turn back into free space, which
//! is merged with whatever free space surrounds it.
//!
//! The engine knows *how* to carve and merge, never *where*: picking
//! the free region that serves a request (first-fit, best-fit, ...) is
//! left to the caller, and so is the simulation clock deciding when a
//! process arrives or leaves.
//!
//! ```
//! use varpart::*;
//!
//! let mut space = AddressSpace::new(0, 100).unwrap();
//! let whole = space.free_set().at(0).unwrap();
//! let p = Process::new("P1", 30, 0, 5).unwrap();
//! let span = space.place(whole, p).unwrap();
//! assert_eq!((span.start(), span.size()), (0, 30));
//!
//! space.release(&ProcessId::new("P1")).unwrap();
//! assert_eq!(space.free_set().spans(), vec![Region::new(0, 100).unwrap()]);
//! ```

mod region;
mod process;
mod partition;
mod free;
/// The allocation engine.
mod carve;
/// The coalescing engine.
mod coalesce;
mod space;

/// Imports, type aliases, error types ... in general
/// useful stuff that shall be needed in many places.
pub mod utils;

pub use crate::utils::{
    ByteSteps, Side, Violation, EngineError, ProcessError, Result,
};
pub use crate::region::{Region, MemoryArea, Segment};
pub use crate::process::{Process, ProcessId};
pub use crate::partition::Partition;
pub use crate::free::{FreeRegion, FreeSet, RegionId};
pub use crate::carve::Carved;
pub use crate::coalesce::{Neighbors, Merge, find_neighbors, coalesce, merge_released};
pub use crate::space::{AddressSpace, Usage};
