use anyhow::{anyhow, Result};
use crossbeam_channel::Sender;

use crate::core::domain::AtomicConfiguration;

/// One trajectory entry, borrowed from the live configuration.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub step: usize,
    /// Thermostat set-point in force for the step, when there is one.
    pub target_temperature: Option<f64>,
    pub atoms: &'a AtomicConfiguration,
}

impl Frame<'_> {
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step,
            target_temperature: self.target_temperature,
            atoms: self.atoms.clone(),
        }
    }
}

/// An owned copy of a `Frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub target_temperature: Option<f64>,
    pub atoms: AtomicConfiguration,
}

/// Append-only frame consumer. One call per frame, in step order.
pub trait TrajectorySink {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()>;
}

impl<S: TrajectorySink + ?Sized> TrajectorySink for &mut S {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        (**self).write_frame(frame)
    }
}

impl<S: TrajectorySink + ?Sized> TrajectorySink for Box<S> {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        (**self).write_frame(frame)
    }
}

/// Fans each frame out to both sinks, first `A` then `B`.
impl<A: TrajectorySink, B: TrajectorySink> TrajectorySink for (A, B) {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        self.0.write_frame(frame)?;
        self.1.write_frame(frame)
    }
}

/// Streams snapshots to another thread.
impl TrajectorySink for Sender<Snapshot> {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        self.send(frame.to_snapshot())
            .map_err(|_| anyhow!("trajectory receiver disconnected at step {}", frame.step))
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrajectory {
    pub frames: Vec<Snapshot>,
}

impl MemoryTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.frames.last()
    }
}

impl TrajectorySink for MemoryTrajectory {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        self.frames.push(frame.to_snapshot());
        Ok(())
    }
}
