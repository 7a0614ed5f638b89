use rand::Rng;

use crate::core::domain::AtomicConfiguration;
use crate::core::error::{Result, SimulationError};
use crate::engine::velocities;

pub mod dynamics;
pub mod minimize;
pub mod quench;

/// Optional Maxwell-Boltzmann initialisation followed by optional momentum removal.
pub(crate) fn prepare_velocities<R: Rng + ?Sized>(
    atoms: &mut AtomicConfiguration,
    temperature: f64,
    init_velocities: bool,
    remove_translation: bool,
    rng: &mut R,
) -> Result<()> {
    if init_velocities {
        velocities::maxwell_boltzmann(atoms, temperature, rng)?;
    }
    if remove_translation {
        velocities::remove_translation(atoms)?;
    }
    Ok(())
}

pub(crate) fn check_timestep(timestep: f64) -> Result<()> {
    if !timestep.is_finite() || timestep <= 0.0 {
        return Err(SimulationError::InvalidParameter(format!(
            "timestep must be positive, got {timestep}"
        )));
    }
    Ok(())
}
