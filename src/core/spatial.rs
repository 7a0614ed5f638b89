use nalgebra::{Point3, Vector3};
use crate::core::domain::{AtomicConfiguration, Cell, Periodicity};

/// Displacement `p2 - p1` under the Minimum Image Convention.
///
/// Periodic axes subtract the nearest whole number of box lengths, so
/// positions that drifted out of the cell are handled too. A delta of
/// exactly `L/2` is kept as is (ties round to even). Non-periodic axes keep
/// the raw delta.
#[inline]
pub fn minimum_image(p1: &Point3<f64>, p2: &Point3<f64>, cell: &Cell, pbc: Periodicity) -> Vector3<f64> {
    let mut d = p2 - p1;
    for i in 0..3 {
        if pbc.axis(i) {
            let l = cell.lengths[i];
            d[i] -= l * (d[i] / l).round_ties_even();
        }
    }
    d
}

#[inline]
pub fn distance(p1: &Point3<f64>, p2: &Point3<f64>, cell: &Cell, pbc: Periodicity) -> f64 {
    minimum_image(p1, p2, cell, pbc).norm()
}

/// True if `candidate` is at least `min_distance` from every point in `placed`.
///
/// Stops at the first violation.
pub fn clears_all(
    candidate: &Point3<f64>,
    placed: &[Point3<f64>],
    min_distance: f64,
    cell: &Cell,
    pbc: Periodicity,
) -> bool {
    placed
        .iter()
        .all(|p| distance(candidate, p, cell, pbc) >= min_distance)
}

/// Wraps atoms back into `[0, L)` along periodic axes.
///
/// **Invariant**: Modifies positions in-place. Does NOT reorder atoms.
pub fn wrap_positions(atoms: &mut AtomicConfiguration) {
    let lengths = atoms.cell.lengths;
    let pbc = atoms.pbc;
    for pos in &mut atoms.positions {
        for i in 0..3 {
            if pbc.axis(i) {
                pos[i] = pos[i].rem_euclid(lengths[i]);
            }
        }
    }
}
