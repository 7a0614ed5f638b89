//! Unit conventions: Angstrom, femtosecond, amu, eV, Kelvin.

/// Boltzmann constant (eV/K).
pub const KB_EV: f64 = 8.617333262e-5;

/// 1 eV/amu expressed in (Angstrom/fs)^2.
pub const EV_PER_AMU_IN_A2_FS2: f64 = 9.648533212e-3;

/// Kinetic energy in eV of a particle with `mass` (amu) and squared speed (Angstrom^2/fs^2).
#[inline]
pub fn kinetic_energy_ev(mass: f64, speed_sq: f64) -> f64 {
    0.5 * mass * speed_sq / EV_PER_AMU_IN_A2_FS2
}
