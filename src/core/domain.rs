use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

// --- Boundary Conditions ---

/// Per-axis periodic boundary flags.
///
/// Deserializes from either a single boolean (broadcast to all three axes)
/// or a three-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PbcRepr", into = "PbcRepr")]
pub struct Periodicity(pub [bool; 3]);

impl Periodicity {
    pub const FULL: Periodicity = Periodicity([true; 3]);
    pub const NONE: Periodicity = Periodicity([false; 3]);

    #[inline]
    pub fn axis(&self, i: usize) -> bool {
        self.0[i]
    }
}

impl Default for Periodicity {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<bool> for Periodicity {
    fn from(all: bool) -> Self {
        Self([all; 3])
    }
}

impl From<[bool; 3]> for Periodicity {
    fn from(axes: [bool; 3]) -> Self {
        Self(axes)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PbcRepr {
    All(bool),
    Axes([bool; 3]),
}

impl From<PbcRepr> for Periodicity {
    fn from(repr: PbcRepr) -> Self {
        match repr {
            PbcRepr::All(b) => b.into(),
            PbcRepr::Axes(a) => a.into(),
        }
    }
}

impl From<Periodicity> for PbcRepr {
    fn from(p: Periodicity) -> Self {
        let [x, y, z] = p.0;
        if x == y && y == z {
            PbcRepr::All(x)
        } else {
            PbcRepr::Axes(p.0)
        }
    }
}

/// Orthorhombic simulation box, edge lengths in Angstrom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub lengths: Vector3<f64>,
}

impl Cell {
    pub fn cubic(edge: f64) -> Self {
        Self {
            lengths: Vector3::new(edge, edge, edge),
        }
    }

    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }
}

// --- The Core Entity ---

/// A set of point atoms in a box. Index `i` of every per-atom vector refers
/// to the same atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicConfiguration {
    pub symbols: Vec<String>,
    pub positions: Vec<Point3<f64>>,
    /// Angstrom/fs.
    pub velocities: Vec<Vector3<f64>>,
    pub cell: Cell,
    pub pbc: Periodicity,
}

impl AtomicConfiguration {
    /// Builds a configuration at rest.
    ///
    /// Returns `None` when `symbols` and `positions` differ in length.
    pub fn new(
        symbols: Vec<String>,
        positions: Vec<Point3<f64>>,
        cell: Cell,
        pbc: Periodicity,
    ) -> Option<Self> {
        if symbols.len() != positions.len() {
            return None;
        }
        let velocities = vec![Vector3::zeros(); positions.len()];
        Some(Self {
            symbols,
            positions,
            velocities,
            cell,
            pbc,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of atoms carrying `symbol`.
    pub fn count_of(&self, symbol: &str) -> usize {
        self.symbols.iter().filter(|s| s.as_str() == symbol).count()
    }

    /// Per-atom masses (amu) looked up from the element table.
    pub fn masses(&self) -> crate::core::error::Result<Vec<f64>> {
        self.symbols
            .iter()
            .map(|s| {
                crate::core::chemistry::atomic_mass(s)
                    .ok_or_else(|| crate::core::error::SimulationError::UnknownElement(s.clone()))
            })
            .collect()
    }
}
