use nalgebra::Point3;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::composition::CompositionSpec;
use crate::core::domain::{AtomicConfiguration, Cell, Periodicity};
use crate::core::error::{Result, SimulationError};
use crate::core::spatial;

/// Placement constraints for a random amorphous structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub total_atoms: usize,
    /// Cubic cell edge (Å).
    pub box_size: f64,
    /// Smallest allowed minimum-image separation (Å).
    pub min_distance: f64,
    /// Candidate draws allowed per atom before giving up.
    pub max_attempts: usize,
    pub pbc: Periodicity,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            total_atoms: 100,
            box_size: 10.0,
            min_distance: 2.0,
            max_attempts: 10_000,
            pbc: Periodicity::FULL,
        }
    }
}

impl GeneratorParams {
    fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(SimulationError::InvalidParameter(msg));
        if self.total_atoms == 0 {
            return fail("total_atoms must be positive".into());
        }
        if !self.box_size.is_finite() || self.box_size <= 0.0 {
            return fail(format!("box_size must be positive, got {}", self.box_size));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return fail(format!(
                "min_distance must be non-negative, got {}",
                self.min_distance
            ));
        }
        if self.max_attempts == 0 {
            return fail("max_attempts must be positive".into());
        }
        Ok(())
    }
}

/// Generates a random multi-species configuration in a cubic box.
///
/// Species labels are shuffled before placement so that no species is
/// favoured by placement order. Each atom is placed by rejection sampling:
/// uniform draws in `[0, box_size)^3` are discarded while any already placed
/// atom lies closer than `min_distance` (minimum image on periodic axes).
///
/// Fails with `UnsatisfiableConstraint` as soon as one atom exhausts
/// `max_attempts` draws; no partial configuration is returned.
pub fn generate<R: Rng + ?Sized>(
    composition: &CompositionSpec,
    params: &GeneratorParams,
    rng: &mut R,
) -> Result<AtomicConfiguration> {
    params.validate()?;
    let counts = composition.counts(params.total_atoms)?;

    log::info!(
        "Generating {} atoms in a {:.3} Å box (min_distance={:.3}, pbc={:?})",
        params.total_atoms,
        params.box_size,
        params.min_distance,
        params.pbc.0
    );
    for (species, count) in &counts {
        log::debug!("  {species}: {count}");
    }

    // 1. Build the exact multiset of labels, then shuffle.
    let mut symbols: Vec<String> = Vec::with_capacity(params.total_atoms);
    for (species, count) in &counts {
        symbols.extend(std::iter::repeat(species.clone()).take(*count));
    }
    symbols.shuffle(rng);

    // 2. Place atoms (rejection sampling)
    let cell = Cell::cubic(params.box_size);
    log::debug!(
        "Number density {:.4} atoms/Å^3",
        params.total_atoms as f64 / cell.volume()
    );
    let mut positions: Vec<Point3<f64>> = Vec::with_capacity(symbols.len());
    let mut total_draws = 0usize;

    for symbol in &symbols {
        let mut placed = false;

        for _ in 0..params.max_attempts {
            total_draws += 1;
            let candidate = Point3::new(
                rng.gen::<f64>() * params.box_size,
                rng.gen::<f64>() * params.box_size,
                rng.gen::<f64>() * params.box_size,
            );

            if spatial::clears_all(&candidate, &positions, params.min_distance, &cell, params.pbc) {
                positions.push(candidate);
                placed = true;
                break;
            }
        }

        if !placed {
            log::debug!(
                "Placement failed after {} atoms ({} draws in total)",
                positions.len(),
                total_draws
            );
            return Err(SimulationError::UnsatisfiableConstraint {
                species: symbol.clone(),
                min_distance: params.min_distance,
                max_attempts: params.max_attempts,
            });
        }
    }

    log::info!(
        "Placed {} atoms with {} draws ({:.2} per atom)",
        positions.len(),
        total_draws,
        total_draws as f64 / positions.len() as f64
    );

    AtomicConfiguration::new(symbols, positions, cell, params.pbc).ok_or_else(|| {
        SimulationError::InvalidParameter("symbol/position count mismatch".into())
    })
}
