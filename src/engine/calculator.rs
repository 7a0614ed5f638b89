use crate::core::domain::AtomicConfiguration;
use anyhow::Result;
use nalgebra::Vector3;

/// Output of a single energy/force evaluation.
#[derive(Debug, Clone)]
pub struct Calculation {
    /// The potential energy (eV).
    pub energy: f64,
    /// Per-atom forces (eV/Å), aligned with the configuration's atoms.
    pub forces: Vec<Vector3<f64>>,
}

impl Calculation {
    /// Largest per-atom force magnitude (eV/Å).
    pub fn max_force(&self) -> f64 {
        self.forces.iter().map(|f| f.norm()).fold(0.0, f64::max)
    }
}

/// A generic interface for potential-energy engines.
/// Implementations must be Thread-Safe (Sync).
pub trait Calculator: Send + Sync {
    /// Evaluates energy and forces without modifying the configuration.
    fn compute(&self, atoms: &AtomicConfiguration) -> Result<Calculation>;

    /// Returns the name of the engine (e.g., "EMT").
    fn name(&self) -> &str;
}
