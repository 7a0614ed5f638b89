use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::engine::trajectory::{Frame, TrajectorySink};
use crate::engine::velocities;

#[derive(Debug, Serialize)]
struct StepRow {
    step: usize,
    target_temperature: Option<f64>,
    temperature: Option<f64>,
}

/// CSV log with one row per frame: step, set-point, instantaneous temperature.
///
/// The instantaneous temperature column is left empty for configurations
/// containing elements without a tabulated mass.
pub struct StepLog<W: Write> {
    writer: csv::Writer<W>,
}

impl StepLog<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create step log {}", path.display()))?;
        Ok(Self { writer })
    }
}

impl<W: Write> StepLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush step log: {}", e.error()))
    }
}

impl<W: Write> TrajectorySink for StepLog<W> {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        let row = StepRow {
            step: frame.step,
            target_temperature: frame.target_temperature,
            temperature: velocities::instantaneous_temperature(frame.atoms).ok(),
        };
        self.writer.serialize(row).context("Failed to write step log row")?;
        self.writer.flush().context("Failed to flush step log")?;
        Ok(())
    }
}
