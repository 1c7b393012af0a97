use crate::utils::*;

/// Outcome of a successful [FreeRegion::carve].
#[derive(Debug)]
pub struct Carved {
    pub partition:      Partition,
    /// The free region was used up entirely. It is left as it was, and
    /// removing it from the free set is up to the caller.
    pub fully_consumed: bool,
}

impl FreeRegion {
    /// Places `process` at the very start of this region.
    ///
    /// Which region to carve is the caller's decision (first-fit,
    /// best-fit, whatever it likes). No other region is looked at here:
    /// if this one is too small, the request is refused with
    /// [EngineError::InsufficientSpace], the process is handed back inside
    /// the error, and nothing changes.
    ///
    /// Otherwise a [Partition] of exactly `process.size()` units is cut
    /// from the front. Any remainder stays here, shrunk in place. The
    /// partition and the remainder together always cover the original
    /// span exactly.
    pub fn carve(&mut self, process: Process) -> Result<Carved> {
        let available = self.size();
        let start = self.start();
        if process.size() > available {
            return Err(EngineError::InsufficientSpace {
                culprit: process,
                start,
                available,
            });
        }

        let fully_consumed = process.size() == available;
        let partition = Partition::new(start, process)?;
        if !fully_consumed {
            self.span_mut()
                .advance(partition.size());
        }
        debug!(
            "Carved [{}, {}) for {} out of [{}, {}){}",
            partition.start(),
            partition.end(),
            partition.process().id(),
            start,
            start + available,
            if fully_consumed { " (fully consumed)" } else { "" }
        );

        Ok(Carved {
            partition,
            fully_consumed,
        })
    }
}
