use crate::utils::*;

/// Aggregate figures of an address space at some point in time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub capacity:       ByteSteps,
    pub used:           ByteSteps,
    pub free:           ByteSteps,
    pub largest_free:   ByteSteps,
    pub free_regions:   usize,
    pub partitions:     usize,
}

impl Usage {
    /// Share of free space lying outside the largest free region: 0.0
    /// when all free space is contiguous (or there is none), tending to
    /// 1.0 as it gets scattered in ever smaller holes.
    pub fn external_fragmentation(&self) -> f64 {
        if self.free == 0 { 0.0 }
        else { 1.0 - self.largest_free as f64 / self.free as f64 }
    }
}

/// The bookkeeping around the engine: owns the free set and the live
/// partitions, applies carve and merge outcomes to them, and can check
/// at any point that together they still tile `[base, base + capacity)`.
///
/// Which free region serves a request is never decided here. Callers
/// pick one through [free_set](AddressSpace::free_set) and pass its
/// handle to [place](AddressSpace::place).
#[derive(Debug)]
pub struct AddressSpace {
    bounds:     Region,
    free:       FreeSet,
    partitions: FastMap<ProcessId, Partition>,
}

impl AddressSpace {
    /// Starts off with a single free region covering everything.
    pub fn new(base: ByteSteps, capacity: ByteSteps) -> Result<Self> {
        let bounds = Region::new(base, capacity)?;
        let (free, _) = FreeSet::with_region(FreeRegion::from_span(bounds));
        debug!("New address space [{}, {})", bounds.start(), bounds.end());

        Ok(Self {
            bounds,
            free,
            partitions: FastMap::default(),
        })
    }

    pub fn base(&self) -> ByteSteps {
        self.bounds.start()
    }

    pub fn capacity(&self) -> ByteSteps {
        self.bounds.size()
    }

    pub fn free_set(&self) -> &FreeSet {
        &self.free
    }

    pub fn partition(&self, id: &ProcessId) -> Option<&Partition> {
        self.partitions.get(id)
    }

    /// Live partitions, in order of placement.
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> + '_ {
        self.partitions.values()
    }

    /// Carves `process` out of the free region `target` and records the
    /// resulting partition. A fully consumed region leaves the free set.
    ///
    /// Requests that cannot be honored (unknown region, a process id
    /// that already owns a partition, a region too small) are refused
    /// before anything changes; the process comes back inside the error.
    pub fn place(&mut self, target: RegionId, process: Process) -> Result<Region> {
        if self.partitions.contains_key(process.id()) {
            return Err(EngineError::DuplicateProcess { culprit: process });
        }
        let region = self.free.get_mut(target)
            .ok_or(EngineError::UnknownRegion(target))?;
        let Carved { partition, fully_consumed } = region.carve(process)?;
        if fully_consumed {
            self.free.remove(target);
        }
        let span = partition.span();
        self.partitions.insert(partition.process().id().clone(), partition);

        Ok(span)
    }

    /// Gives the partition of process `id` back to the free set and
    /// merges it with whatever free space surrounds it. Returns the
    /// handle of the region now covering the released span.
    ///
    /// If the merge turns up a corrupted free set, the partition is put
    /// back where it was and the free set is left as it was found.
    pub fn release(&mut self, id: &ProcessId) -> Result<RegionId> {
        let (idx, key, partition) = self.partitions.shift_remove_full(id)
            .ok_or_else(|| EngineError::UnknownProcess(id.clone()))?;
        let start = partition.start();
        debug!("Releasing [{}, {}) of {}", start, partition.end(), id);
        let (region, process) = partition.into_parts();
        let fresh = self.free.insert(region);
        match merge_released(&mut self.free, fresh) {
            Ok(merge)   => { Ok(merge.survivor()) },
            Err(e)      => {
                // Nothing was merged or reclaimed if we got here.
                self.free.remove(fresh);
                self.partitions.shift_insert(idx, key, Partition::new(start, process)?);
                Err(e)
            },
        }
    }

    /// Every free region and partition, in increasing address order.
    pub fn layout(&self) -> Vec<Segment> {
        self.free
            .iter()
            .map(|(_, r)| Segment::Free(r.span()))
            .chain(self.partitions
                .values()
                .map(|p| Segment::Owned {
                    span:       p.span(),
                    process:    p.process().id().clone(),
                }))
            .sorted_unstable_by_key(|s| s.start())
            .collect()
    }

    pub fn usage(&self) -> Usage {
        let free = self.free.total_size();
        Usage {
            capacity:       self.capacity(),
            used:           self.capacity() - free,
            free,
            largest_free:   self.free
                                .largest()
                                .map_or(0, |(_, r)| r.size()),
            free_regions:   self.free.len(),
            partitions:     self.partitions.len(),
        }
    }

    /// Checks that free regions and partitions exactly tile the address
    /// space, that every partition is as big as its process, and that no
    /// two free regions were left unmerged. Reports the first problem
    /// found, in address order.
    pub fn validate(&self) -> std::result::Result<(), Violation> {
        for p in self.partitions.values() {
            if p.size() != p.process().size() {
                return Err(Violation::SizeMismatch {
                    process:        p.process().id().clone(),
                    span_size:      p.size(),
                    process_size:   p.process().size(),
                });
            }
        }

        let layout = self.layout();
        let mut runner = self.bounds.start();
        let mut prev: Option<&Segment> = None;
        for seg in &layout {
            let span = seg.span();
            if span.start() < self.bounds.start() || span.end() > self.bounds.end() {
                return Err(Violation::OutOfBounds { culprit: span, space: self.bounds });
            }
            if span.start() > runner {
                return Err(Violation::Gap { hole: Region::new(runner, span.start() - runner)? });
            }
            if let Some(p) = prev {
                if span.start() < runner {
                    return Err(Violation::Overlap { a: p.span(), b: span });
                }
                if p.is_free() && seg.is_free() {
                    return Err(Violation::Unmerged { left: p.span(), right: span });
                }
            }
            runner = span.end();
            prev = Some(seg);
        }
        if runner < self.bounds.end() {
            return Err(Violation::Gap { hole: Region::new(runner, self.bounds.end() - runner)? });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: ByteSteps, size: ByteSteps) -> Region {
        Region::new(start, size).unwrap()
    }

    fn only_free(space: &mut AddressSpace) -> &mut Region {
        let id = space.free.iter().next().unwrap().0;
        space.free.get_mut(id).unwrap().span_mut()
    }

    fn with_a(size: ByteSteps) -> AddressSpace {
        let mut space = AddressSpace::new(0, 100).unwrap();
        let whole = space.free.at(0).unwrap();
        space.place(whole, Process::new("A", size, 0, 1).unwrap()).unwrap();

        space
    }

    #[test]
    fn validate_accepts_fresh_space() {
        let space = with_a(30);
        assert_eq!(space.validate(), Ok(()));
    }

    #[test]
    fn validate_reports_leading_gap() {
        let mut space = AddressSpace::new(0, 100).unwrap();
        *only_free(&mut space) = span(10, 90);
        assert_eq!(space.validate(), Err(Violation::Gap { hole: span(0, 10) }));
    }

    #[test]
    fn validate_reports_trailing_gap() {
        let mut space = AddressSpace::new(0, 100).unwrap();
        *only_free(&mut space) = span(0, 90);
        assert_eq!(space.validate(), Err(Violation::Gap { hole: span(90, 10) }));
    }

    #[test]
    fn validate_reports_overlap() {
        let mut space = with_a(30);
        space.free.insert(FreeRegion::new(20, 10).unwrap());
        assert_eq!(
            space.validate(),
            Err(Violation::Overlap { a: span(0, 30), b: span(20, 10) })
        );
    }

    #[test]
    fn validate_reports_unmerged_neighbors() {
        let mut space = AddressSpace::new(0, 100).unwrap();
        *only_free(&mut space) = span(0, 50);
        space.free.insert(FreeRegion::new(50, 50).unwrap());
        assert_eq!(
            space.validate(),
            Err(Violation::Unmerged { left: span(0, 50), right: span(50, 50) })
        );
    }

    #[test]
    fn validate_reports_out_of_bounds() {
        let mut space = AddressSpace::new(0, 100).unwrap();
        space.free.insert(FreeRegion::new(100, 5).unwrap());
        assert_eq!(
            space.validate(),
            Err(Violation::OutOfBounds { culprit: span(100, 5), space: span(0, 100) })
        );
    }

    #[test]
    fn validate_reports_size_mismatch() {
        let mut space = with_a(30);
        let a = ProcessId::from("A");
        *space.partitions.get_mut(&a).unwrap().span_mut() = span(0, 20);
        assert_eq!(
            space.validate(),
            Err(Violation::SizeMismatch { process: a, span_size: 20, process_size: 30 })
        );
    }

    #[test]
    fn failed_release_restores_state() {
        let mut space = with_a(30);
        let whole_rest = space.free.at(30).unwrap();
        space.place(whole_rest, Process::new("B", 10, 0, 1).unwrap()).unwrap();
        // Two free regions claiming to start where A ends.
        space.free.insert(FreeRegion::new(30, 5).unwrap());
        space.free.insert(FreeRegion::new(30, 3).unwrap());
        let spans_before = space.free.spans();
        let order_before = space.partitions().map(|p| p.process().id().clone()).collect_vec();

        match space.release(&ProcessId::from("A")) {
            Err(EngineError::InvariantViolation(Violation::ManyNeighbors { side, count, .. })) => {
                assert_eq!(side, Side::Right);
                assert_eq!(count, 2);
            },
            other => { panic!("Expected ManyNeighbors, got {:?}", other); }
        }
        assert_eq!(space.free.spans(), spans_before);
        assert_eq!(
            space.partitions().map(|p| p.process().id().clone()).collect_vec(),
            order_before
        );
        let a = space.partition(&ProcessId::from("A")).unwrap();
        assert_eq!(a.span(), span(0, 30));
        assert_eq!(a.process().size(), 30);
    }
}
