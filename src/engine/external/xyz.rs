use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::domain::AtomicConfiguration;
use crate::engine::trajectory::{Frame, TrajectorySink};

/// Extended-XYZ trajectory writer.
///
/// Every frame carries the cell, periodic flags, positions (Å) and
/// velocities (Å/fs). Frames are flushed as they are written so an aborted
/// run keeps every completed step.
pub struct XyzTrajectory<W: Write> {
    writer: W,
    frames_written: usize,
}

impl XyzTrajectory<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create trajectory file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> XyzTrajectory<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes a single structure with no step metadata.
    pub fn write_structure(&mut self, atoms: &AtomicConfiguration) -> Result<()> {
        let block = format_block(atoms, None, None);
        self.emit(&block)
    }

    fn emit(&mut self, block: &str) -> Result<()> {
        self.writer
            .write_all(block.as_bytes())
            .context("Failed to write XYZ frame")?;
        self.writer.flush().context("Failed to flush XYZ frame")?;
        self.frames_written += 1;
        Ok(())
    }
}

impl<W: Write> TrajectorySink for XyzTrajectory<W> {
    fn write_frame(&mut self, frame: Frame<'_>) -> Result<()> {
        let block = format_block(frame.atoms, Some(frame.step), frame.target_temperature);
        self.emit(&block)
    }
}

fn format_block(atoms: &AtomicConfiguration, step: Option<usize>, target: Option<f64>) -> String {
    let mut s = String::with_capacity(64 * (atoms.len() + 2));
    let l = atoms.cell.lengths;
    let flag = |b: bool| if b { 'T' } else { 'F' };

    s.push_str(&format!("{}\n", atoms.len()));
    s.push_str(&format!(
        "Lattice=\"{:.9} 0.0 0.0 0.0 {:.9} 0.0 0.0 0.0 {:.9}\" \
         Properties=species:S:1:pos:R:3:vel:R:3 pbc=\"{} {} {}\"",
        l.x,
        l.y,
        l.z,
        flag(atoms.pbc.axis(0)),
        flag(atoms.pbc.axis(1)),
        flag(atoms.pbc.axis(2)),
    ));
    if let Some(step) = step {
        s.push_str(&format!(" step={step}"));
    }
    if let Some(t) = target {
        s.push_str(&format!(" target_temperature={t:.6}"));
    }
    s.push('\n');

    for ((symbol, p), v) in atoms.symbols.iter().zip(&atoms.positions).zip(&atoms.velocities) {
        s.push_str(&format!(
            "{:<3} {:.9} {:.9} {:.9} {:.9} {:.9} {:.9}\n",
            symbol, p.x, p.y, p.z, v.x, v.y, v.z
        ));
    }
    s
}
