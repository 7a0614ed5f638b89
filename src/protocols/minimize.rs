use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::domain::AtomicConfiguration;
use crate::core::error::{Result, SimulationError};
use crate::engine::calculator::Calculator;
use crate::engine::optimizer::OptimizerEngine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizeParams {
    /// Force convergence threshold (eV/Å).
    pub fmax: f64,
    pub max_steps: usize,
    pub logfile: Option<PathBuf>,
    pub restart_file: Option<PathBuf>,
}

impl Default for MinimizeParams {
    fn default() -> Self {
        Self {
            fmax: 0.05,
            max_steps: 500,
            logfile: Some(PathBuf::from("opt.log")),
            restart_file: Some(PathBuf::from("opt.restart")),
        }
    }
}

/// Relaxes `atoms` with an external optimizer and returns the final
/// potential energy (eV).
///
/// Hitting `max_steps` without converging is logged, not treated as an error.
pub fn minimize(
    atoms: &mut AtomicConfiguration,
    calculator: &dyn Calculator,
    engine: &dyn OptimizerEngine,
    params: &MinimizeParams,
) -> Result<f64> {
    if !params.fmax.is_finite() || params.fmax <= 0.0 {
        return Err(SimulationError::InvalidParameter(format!(
            "fmax must be positive, got {}",
            params.fmax
        )));
    }

    let mut optimizer =
        engine.optimizer(params.logfile.as_deref(), params.restart_file.as_deref())?;
    let converged = optimizer.run(atoms, calculator, params.fmax, params.max_steps)?;
    if !converged {
        log::warn!(
            "Minimization stopped after {} steps without reaching fmax={}",
            params.max_steps,
            params.fmax
        );
    }

    let result = calculator.compute(atoms)?;
    log::info!(
        "Energy after minimization: {} eV (max force {:.4} eV/Å)",
        result.energy,
        result.max_force()
    );
    Ok(result.energy)
}
