use crate::utils::*;

/// Opaque, caller-chosen identity of a [Process].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProcessId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A request for memory. Besides its [size](Process::size), which is the
/// only thing the engine ever reads, a process carries the scheduling
/// metadata of whoever drives the simulation clock: it shows up at
/// [arrival_step](Process::arrival_step) and holds on to its partition
/// for [duration_steps](Process::duration_steps).
///
/// Descriptors are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProcess")]
pub struct Process {
    id:             ProcessId,
    size:           ByteSteps,
    arrival_step:   ByteSteps,
    duration_steps: ByteSteps,
}

impl Process {
    /// Gatekeeper for descriptors. A successfully returned [Process]
    /// demands a non-zero amount of memory.
    pub fn new(
        id:             impl Into<ProcessId>,
        size:           ByteSteps,
        arrival_step:   ByteSteps,
        duration_steps: ByteSteps,
    ) -> std::result::Result<Self, ProcessError> {
        let id = id.into();
        if size == 0 {
            return Err(ProcessError {
                message: String::from("Process with 0 size found!"),
                culprit: id,
            });
        }

        Ok(Self {
            id,
            size,
            arrival_step,
            duration_steps,
        })
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn size(&self) -> ByteSteps {
        self.size
    }

    pub fn arrival_step(&self) -> ByteSteps {
        self.arrival_step
    }

    pub fn duration_steps(&self) -> ByteSteps {
        self.duration_steps
    }

    /// The step at which the scheduler is expected to release the
    /// process's partition.
    pub fn departure_step(&self) -> ByteSteps {
        self.arrival_step.saturating_add(self.duration_steps)
    }

    /// Returns `true` if the process holds memory at step `t`. Memory is
    /// live from arrival up to, but not including, departure.
    pub fn is_live_at(&self, t: ByteSteps) -> bool {
        self.arrival_step <= t && t < self.departure_step()
    }
}

// Deserialized descriptors go through the same gatekeeper as the
// ones built in code.
#[derive(Deserialize)]
struct RawProcess {
    id:             ProcessId,
    size:           ByteSteps,
    arrival_step:   ByteSteps,
    duration_steps: ByteSteps,
}

impl TryFrom<RawProcess> for Process {
    type Error = ProcessError;

    fn try_from(raw: RawProcess) -> std::result::Result<Self, Self::Error> {
        Process::new(raw.id, raw.size, raw.arrival_step, raw.duration_steps)
    }
}
