use std::path::Path;

use anyhow::Result;

use crate::core::domain::AtomicConfiguration;
use crate::engine::calculator::Calculator;

/// An external force-minimizing optimizer.
pub trait Optimizer: Send {
    /// Relaxes `atoms` in place until the largest force drops below `fmax`
    /// (eV/Å) or `max_steps` iterations pass. Returns whether it converged.
    fn run(
        &mut self,
        atoms: &mut AtomicConfiguration,
        calculator: &dyn Calculator,
        fmax: f64,
        max_steps: usize,
    ) -> Result<bool>;
}

/// Builds optimizers. A present restart file resumes the optimizer's state.
pub trait OptimizerEngine {
    fn optimizer(
        &self,
        logfile: Option<&Path>,
        restart_file: Option<&Path>,
    ) -> Result<Box<dyn Optimizer>>;
}
