use crate::utils::*;
use std::sync::atomic::{AtomicU64, Ordering};

// Shared by every set, so handles from different sets never collide.
static NEXT_REGION: AtomicU64 = AtomicU64::new(0);

/// Unowned space: the unit that gets carved and merged.
#[derive(Debug, PartialEq, Eq)]
pub struct FreeRegion {
    span: Region,
}

impl FreeRegion {
    pub fn new(start: ByteSteps, size: ByteSteps) -> std::result::Result<Self, Violation> {
        Ok(Self::from_span(Region::new(start, size)?))
    }

    pub(crate) fn from_span(span: Region) -> Self {
        Self { span }
    }

    pub(crate) fn span_mut(&mut self) -> &mut Region {
        &mut self.span
    }
}

impl MemoryArea for FreeRegion {
    fn span(&self) -> Region {
        self.span
    }
}

/// Stable handle of a region inside a [FreeSet]. Handles are unique
/// process-wide and never recycled, so a stale handle, or one taken from
/// another set, can only miss, never alias.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena of free regions. Shrinking a region in place or dropping an
/// absorbed one is a table update on its handle; nobody ever holds a
/// reference into the set across such updates.
#[derive(Debug, Default)]
pub struct FreeSet {
    regions:    FastMap<RegionId, FreeRegion>,
}

impl FreeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding a single region, e.g. the whole address space at
    /// the beginning of a simulation.
    pub fn with_region(region: FreeRegion) -> (Self, RegionId) {
        let mut res = Self::new();
        let id = res.insert(region);

        (res, id)
    }

    pub fn insert(&mut self, region: FreeRegion) -> RegionId {
        let id = RegionId(NEXT_REGION.fetch_add(1, Ordering::Relaxed));
        self.regions.insert(id, region);

        id
    }

    pub fn get(&self, id: RegionId) -> Option<&FreeRegion> {
        self.regions.get(&id)
    }

    /// Mutable access is what [FreeRegion::carve] needs. Spans can only
    /// change through the engine, so this cannot break tiling.
    pub fn get_mut(&mut self, id: RegionId) -> Option<&mut FreeRegion> {
        self.regions.get_mut(&id)
    }

    pub fn remove(&mut self, id: RegionId) -> Option<FreeRegion> {
        // Order of the remaining regions is not part of any contract.
        self.regions.swap_remove(&id)
    }

    /// Drops the regions a merge reported as absorbed. Fails, without
    /// touching anything, if one of them is not in the set.
    pub fn reclaim(&mut self, merge: &Merge) -> Result<()> {
        if let Some(missing) = merge.absorbed()
            .find(|id| !self.contains(*id)) {
                return Err(EngineError::UnknownRegion(missing));
        }
        for id in merge.absorbed() {
            self.regions.swap_remove(&id);
        }

        Ok(())
    }

    pub fn contains(&self, id: RegionId) -> bool {
        self.regions.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &FreeRegion)> + '_ {
        self.regions
            .iter()
            .map(|(id, r)| (*id, r))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Amount of unowned space.
    pub fn total_size(&self) -> ByteSteps {
        self.regions
            .values()
            .map(|r| r.size())
            .sum()
    }

    /// The biggest region. Ties go to the lowest address.
    pub fn largest(&self) -> Option<(RegionId, &FreeRegion)> {
        self.iter()
            .max_by(|(_, a), (_, b)| {
                a.size()
                    .cmp(&b.size())
                    .then(b.start().cmp(&a.start()))
            })
    }

    /// The region starting exactly at `start`, if any.
    pub fn at(&self, start: ByteSteps) -> Option<RegionId> {
        self.iter()
            .find(|(_, r)| r.start() == start)
            .map(|(id, _)| id)
    }

    /// All spans, in increasing address order.
    pub fn spans(&self) -> Vec<Region> {
        self.regions
            .values()
            .map(|r| r.span())
            .sorted_unstable_by_key(|r| r.start())
            .collect()
    }
}
