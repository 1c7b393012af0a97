use crate::utils::*;

/// A contiguous span `[start, start + size)` of the simulated address
/// space. Spans are plain values: they never own one another, and a
/// span of size zero is never represented. Whatever would shrink to
/// nothing is removed instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct Region {
    start:  ByteSteps,
    size:   ByteSteps,
}

impl Region {
    /// The only way to get hold of a [Region]. Rejects zero sizes, as
    /// well as spans whose end does not fit in [ByteSteps].
    pub fn new(start: ByteSteps, size: ByteSteps) -> std::result::Result<Self, Violation> {
        if size == 0 {
            return Err(Violation::ZeroSize { start });
        }
        if start.checked_add(size).is_none() {
            return Err(Violation::Overflow { start, size });
        }

        Ok(Self { start, size })
    }

    pub fn start(&self) -> ByteSteps {
        self.start
    }

    pub fn size(&self) -> ByteSteps {
        self.size
    }

    /// First address past the span.
    pub fn end(&self) -> ByteSteps {
        self.start + self.size
    }

    /// Returns `true` if `other` begins exactly where `self` ends.
    pub fn precedes(&self, other: &Self) -> bool {
        self.end() == other.start
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    pub fn contains(&self, offset: ByteSteps) -> bool {
        self.start <= offset && offset < self.end()
    }

    // The mutators below are reserved for the engine. Callers see
    // regions change only through carving and coalescing, both of
    // which preserve the total amount of space.

    /// Drops the first `amount` units. `amount` must be strictly
    /// smaller than the current size.
    pub(crate) fn advance(&mut self, amount: ByteSteps) {
        debug_assert!(amount < self.size, "Advancing would empty the region");
        self.start += amount;
        self.size -= amount;
    }

    /// Grows the span rightwards over an adjacent follower.
    pub(crate) fn extend_forward(&mut self, follower: &Region) {
        debug_assert!(self.precedes(follower), "Forward absorption of a non-adjacent span");
        self.size += follower.size;
    }

    /// Grows the span leftwards over an adjacent predecessor.
    pub(crate) fn extend_backward(&mut self, predecessor: &Region) {
        debug_assert!(predecessor.precedes(self), "Backward absorption of a non-adjacent span");
        self.start -= predecessor.size;
        self.size += predecessor.size;
    }
}

#[derive(Deserialize)]
struct RawRegion {
    start:  ByteSteps,
    size:   ByteSteps,
}

impl TryFrom<RawRegion> for Region {
    type Error = Violation;

    fn try_from(raw: RawRegion) -> std::result::Result<Self, Self::Error> {
        Region::new(raw.start, raw.size)
    }
}

/// What every address-space segment has in common: a span. That is the
/// only polymorphism the engine needs, so no segment kind ever has to
/// be inspected at runtime through this trait.
pub trait MemoryArea {
    fn span(&self) -> Region;

    fn start(&self) -> ByteSteps {
        self.span().start()
    }

    fn size(&self) -> ByteSteps {
        self.span().size()
    }

    fn end(&self) -> ByteSteps {
        self.span().end()
    }
}

impl MemoryArea for Region {
    fn span(&self) -> Region {
        *self
    }
}

/// One entry of an address-ordered layout, as handed to whoever needs
/// to render or log the state of the address space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Free(Region),
    Owned {
        span:       Region,
        process:    ProcessId,
    },
}

impl Segment {
    pub fn is_free(&self) -> bool {
        if let Segment::Free(_) = self { true }
        else { false }
    }
}

impl MemoryArea for Segment {
    fn span(&self) -> Region {
        match self {
            Segment::Free(r)                => { *r },
            Segment::Owned { span, .. }     => { *span },
        }
    }
}
