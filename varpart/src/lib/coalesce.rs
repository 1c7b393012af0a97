use crate::utils::*;

/// Free regions sitting right next to some other free region, as found
/// by [find_neighbors].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Neighbors {
    /// Ends exactly where the region of interest starts.
    pub left:   Option<RegionId>,
    /// Starts exactly where the region of interest ends.
    pub right:  Option<RegionId>,
}

/// What [coalesce] did. The survivor has already been grown in place;
/// the absorbed handles still sit in the free set until the caller
/// drops them (see [FreeSet::reclaim]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Merge {
    survivor:   RegionId,
    span:       Region,
    absorbed:   [Option<RegionId>; 2],
}

impl Merge {
    /// Handle of the one region covering the merged span.
    pub fn survivor(&self) -> RegionId {
        self.survivor
    }

    /// The merged span.
    pub fn span(&self) -> Region {
        self.span
    }

    /// Handles that no longer stand for a region of their own.
    pub fn absorbed(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.absorbed
            .iter()
            .flatten()
            .copied()
    }

    /// Returns `true` if nothing was merged.
    pub fn is_isolated(&self) -> bool {
        self.absorbed().next().is_none()
    }
}

/// Scans `free` for the regions adjacent to `target`, skipping `target`
/// itself.
///
/// Under correct tiling there is at most one neighbor per side. Finding
/// more means the free set was corrupted upstream: this is reported as
/// [Violation::ManyNeighbors] instead of being papered over.
pub fn find_neighbors(free: &FreeSet, target: RegionId) -> Result<Neighbors> {
    let of = free.get(target)
        .ok_or(EngineError::UnknownRegion(target))?
        .span();
    let mut lefts = vec![];
    let mut rights = vec![];
    for (id, r) in free.iter()
        .filter(|(id, _)| *id != target) {
            if r.span().precedes(&of) {
                lefts.push(id);
            } else if of.precedes(&r.span()) {
                rights.push(id);
            }
    }
    for (side, found) in [(Side::Left, &lefts), (Side::Right, &rights)] {
        if found.len() > 1 {
            warn!("{} free regions found {}-adjacent to {}", found.len(), side, target);
            return Err(Violation::ManyNeighbors { of, side, count: found.len() }.into());
        }
    }
    let res = Neighbors {
        left:   lefts.first().copied(),
        right:  rights.first().copied(),
    };
    trace!("Neighbors of {} at [{}, {}): {:?}", target, of.start(), of.end(), res);

    Ok(res)
}

// A claimed neighbor must touch `fresh` exactly, on the claimed side.
fn ensure_adjacent(side: Side, neighbor: Region, fresh: Region) -> std::result::Result<(), Violation> {
    let touches = match side {
        Side::Left  => { neighbor.precedes(&fresh) },
        Side::Right => { fresh.precedes(&neighbor) },
    };
    if touches { Ok(()) }
    else {
        warn!("Claimed {} neighbor [{}, {}) does not touch [{}, {})", side, neighbor.start(), neighbor.end(), fresh.start(), fresh.end());
        Err(Violation::NotAdjacent { neighbor, of: fresh, side })
    }
}

fn span_of(free: &FreeSet, id: RegionId) -> Result<Region> {
    Ok(free.get(id)
        .ok_or(EngineError::UnknownRegion(id))?
        .span())
}

/// Merges the freshly released region `fresh` with its `neighbors`.
///
/// The four outcomes, by which neighbors exist:
///
/// 1. none: `fresh` stays as it is;
/// 2. left: the left neighbor grows forward over `fresh`;
/// 3. right: the right neighbor grows backward over `fresh`;
/// 4. both: the left neighbor grows forward over `fresh` and then over
///    the right neighbor, ending up as the single region covering all
///    three spans.
///
/// Every claimed neighbor is checked before anything is touched, so a
/// failed call leaves the set exactly as it found it.
pub fn coalesce(free: &mut FreeSet, fresh: RegionId, neighbors: Neighbors) -> Result<Merge> {
    let fresh_span = span_of(free, fresh)?;
    let left = match neighbors.left {
        Some(id)    => { Some((id, span_of(free, id)?)) },
        None        => { None },
    };
    let right = match neighbors.right {
        Some(id)    => { Some((id, span_of(free, id)?)) },
        None        => { None },
    };
    if let Some((_, l)) = left {
        ensure_adjacent(Side::Left, l, fresh_span)?;
    }
    if let Some((_, r)) = right {
        ensure_adjacent(Side::Right, r, fresh_span)?;
    }

    let (survivor, absorbed) = match (left, right) {
        (None, None)                    => {
            (fresh, [None, None])
        },
        (Some((l, _)), None)            => {
            grow(free, l)?.extend_forward(&fresh_span);
            (l, [Some(fresh), None])
        },
        (None, Some((r, _)))            => {
            grow(free, r)?.extend_backward(&fresh_span);
            (r, [Some(fresh), None])
        },
        (Some((l, _)), Some((r, r_span))) => {
            let bridge = grow(free, l)?;
            bridge.extend_forward(&fresh_span);
            bridge.extend_forward(&r_span);
            (l, [Some(fresh), Some(r)])
        },
    };
    let res = Merge {
        survivor,
        span: span_of(free, survivor)?,
        absorbed,
    };
    if res.is_isolated() {
        debug!("{} at [{}, {}) has no free neighbors", fresh, fresh_span.start(), fresh_span.end());
    } else {
        debug!(
            "Merged {} into {}, now [{}, {})",
            res.absorbed().join(", "),
            survivor,
            res.span.start(),
            res.span.end()
        );
    }

    Ok(res)
}

fn grow(free: &mut FreeSet, id: RegionId) -> Result<&mut Region> {
    Ok(free.get_mut(id)
        .ok_or(EngineError::UnknownRegion(id))?
        .span_mut())
}

/// The whole release path for a region already inserted in `free`:
/// finds its neighbors, merges, and drops whatever got absorbed.
pub fn merge_released(free: &mut FreeSet, fresh: RegionId) -> Result<Merge> {
    let neighbors = find_neighbors(free, fresh)?;
    let merge = coalesce(free, fresh, neighbors)?;
    free.reclaim(&merge)?;

    Ok(merge)
}
