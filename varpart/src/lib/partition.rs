use crate::utils::*;

/// A span of the address space owned by exactly one [Process].
///
/// Partitions only come out of [FreeRegion::carve]. Their size is never
/// set independently: it is read off the owning process, so the two
/// always agree.
#[derive(Debug, PartialEq, Eq)]
pub struct Partition {
    span:       Region,
    process:    Process,
}

impl Partition {
    pub(crate) fn new(start: ByteSteps, process: Process) -> std::result::Result<Self, Violation> {
        Ok(Self {
            span: Region::new(start, process.size())?,
            process,
        })
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    /// Turns the partition back into unowned space with the exact same
    /// span. When to do so (usually once the process's duration has
    /// elapsed) is the scheduler's call.
    pub fn release(self) -> FreeRegion {
        self.into_parts().0
    }

    /// Like [release](Partition::release), but hands the process back too.
    pub fn into_parts(self) -> (FreeRegion, Process) {
        (FreeRegion::from_span(self.span), self.process)
    }

    #[cfg(test)]
    pub(crate) fn span_mut(&mut self) -> &mut Region {
        &mut self.span
    }
}

impl MemoryArea for Partition {
    fn span(&self) -> Region {
        self.span
    }
}
