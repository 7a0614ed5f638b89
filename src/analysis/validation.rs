use rayon::prelude::*;

use crate::core::composition::CompositionSpec;
use crate::core::domain::AtomicConfiguration;
use crate::core::error::Result;
use crate::core::spatial;

/// The closest pair in a configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPair {
    pub i: usize,
    pub j: usize,
    pub distance: f64,
}

/// Finds the closest pair under the minimum image convention.
///
/// Rows of the pair matrix are scanned in parallel. Returns `None` for fewer
/// than two atoms.
pub fn closest_pair(atoms: &AtomicConfiguration) -> Option<ClosestPair> {
    let n = atoms.len();
    let positions = &atoms.positions;
    let cell = &atoms.cell;
    let pbc = atoms.pbc;

    (0..n)
        .into_par_iter()
        .filter_map(|i| {
            ((i + 1)..n)
                .map(|j| ClosestPair {
                    i,
                    j,
                    distance: spatial::distance(&positions[i], &positions[j], cell, pbc),
                })
                .min_by(|a, b| a.distance.total_cmp(&b.distance))
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Checks that every pair is at least `min_distance` apart.
/// Returns `true` if the configuration is valid (no overlaps).
pub fn respects_min_distance(atoms: &AtomicConfiguration, min_distance: f64) -> bool {
    closest_pair(atoms).map_or(true, |p| p.distance >= min_distance)
}

/// Per-species atom counts in composition order.
pub fn species_counts(atoms: &AtomicConfiguration, composition: &CompositionSpec) -> Vec<(String, usize)> {
    composition
        .entries()
        .iter()
        .map(|(s, _)| (s.clone(), atoms.count_of(s)))
        .collect()
}

/// Verifies the configuration matches the counts the composition implies.
/// Returns true if counts match exactly.
pub fn check_stoichiometry(atoms: &AtomicConfiguration, composition: &CompositionSpec) -> Result<bool> {
    let expected = composition.counts(atoms.len())?;
    Ok(species_counts(atoms, composition) == expected)
}
