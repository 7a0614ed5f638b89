use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::core::domain::AtomicConfiguration;
use crate::core::error::{Result, SimulationError};
use crate::core::units::{kinetic_energy_ev, EV_PER_AMU_IN_A2_FS2, KB_EV};

/// Draws velocities from the Maxwell-Boltzmann distribution at `temperature` (K).
///
/// Each Cartesian component of atom `i` is sampled from
/// `N(0, sqrt(kB T / m_i))`. The resulting instantaneous temperature
/// fluctuates around the target; it is not rescaled.
pub fn maxwell_boltzmann<R: Rng + ?Sized>(
    atoms: &mut AtomicConfiguration,
    temperature: f64,
    rng: &mut R,
) -> Result<()> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(SimulationError::InvalidParameter(format!(
            "temperature must be finite and non-negative, got {temperature}"
        )));
    }
    let masses = atoms.masses()?;
    let kt = KB_EV * temperature;

    for (v, &m) in atoms.velocities.iter_mut().zip(&masses) {
        let sigma = (kt / m * EV_PER_AMU_IN_A2_FS2).sqrt();
        let normal = Normal::new(0.0, sigma).map_err(|e| {
            SimulationError::InvalidParameter(format!("velocity distribution: {e}"))
        })?;
        *v = Vector3::new(normal.sample(rng), normal.sample(rng), normal.sample(rng));
    }
    Ok(())
}

/// Removes the centre-of-mass velocity so the system does not drift as a whole.
pub fn remove_translation(atoms: &mut AtomicConfiguration) -> Result<()> {
    if atoms.is_empty() {
        return Ok(());
    }
    let masses = atoms.masses()?;
    let total_mass: f64 = masses.iter().sum();

    let mut momentum = Vector3::zeros();
    for (v, &m) in atoms.velocities.iter().zip(&masses) {
        momentum += v * m;
    }
    let v_com = momentum / total_mass;

    for v in &mut atoms.velocities {
        *v -= v_com;
    }
    Ok(())
}

/// Total kinetic energy (eV).
pub fn kinetic_energy(atoms: &AtomicConfiguration) -> Result<f64> {
    let masses = atoms.masses()?;
    Ok(atoms
        .velocities
        .iter()
        .zip(&masses)
        .map(|(v, &m)| kinetic_energy_ev(m, v.norm_squared()))
        .sum())
}

/// Instantaneous temperature (K) from `3N` degrees of freedom.
pub fn instantaneous_temperature(atoms: &AtomicConfiguration) -> Result<f64> {
    if atoms.is_empty() {
        return Ok(0.0);
    }
    let dof = 3.0 * atoms.len() as f64;
    Ok(2.0 * kinetic_energy(atoms)? / (dof * KB_EV))
}
