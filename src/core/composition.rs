use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::{Result, SimulationError};

/// Tolerance on the ratio sum before the ratios are rescaled.
pub const RATIO_SUM_TOLERANCE: f64 = 1e-8;

/// Target fraction per species, kept in insertion order.
///
/// Order matters: the last species absorbs the rounding residual when the
/// ratios are turned into integer counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositionSpec {
    entries: Vec<(String, f64)>,
}

impl CompositionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a species, or overwrites its ratio in place if already present.
    pub fn with(mut self, species: impl Into<String>, ratio: f64) -> Self {
        self.insert(species, ratio);
        self
    }

    pub fn insert(&mut self, species: impl Into<String>, ratio: f64) {
        let species = species.into();
        match self.entries.iter_mut().find(|(s, _)| *s == species) {
            Some(entry) => entry.1 = ratio,
            None => self.entries.push((species, ratio)),
        }
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self) -> Result<f64> {
        if self.entries.is_empty() {
            return Err(SimulationError::InvalidParameter(
                "composition must name at least one species".into(),
            ));
        }
        for (species, ratio) in &self.entries {
            if !ratio.is_finite() || *ratio < 0.0 {
                return Err(SimulationError::InvalidParameter(format!(
                    "ratio for '{species}' must be finite and non-negative, got {ratio}"
                )));
            }
        }
        let sum: f64 = self.entries.iter().map(|(_, r)| r).sum();
        if sum <= 0.0 {
            return Err(SimulationError::InvalidParameter(
                "composition ratios sum to zero".into(),
            ));
        }
        Ok(sum)
    }

    /// Returns a copy whose ratios sum to 1.0.
    ///
    /// Ratios already within `RATIO_SUM_TOLERANCE` of 1.0 are left untouched.
    pub fn normalized(&self) -> Result<Self> {
        let sum = self.validate()?;
        if (sum - 1.0).abs() <= RATIO_SUM_TOLERANCE {
            return Ok(self.clone());
        }
        log::warn!("Composition ratios sum to {sum}; rescaling to 1.0");
        let entries = self
            .entries
            .iter()
            .map(|(s, r)| (s.clone(), r / sum))
            .collect();
        Ok(Self { entries })
    }

    /// Integer count per species for `total_atoms`.
    ///
    /// Every species but the last gets its ratio share rounded half-to-even;
    /// the last takes whatever remains so the counts sum to `total_atoms`.
    pub fn counts(&self, total_atoms: usize) -> Result<Vec<(String, usize)>> {
        let normalized = self.normalized()?;
        let n = normalized.entries.len();
        let mut counts = Vec::with_capacity(n);
        let mut accumulated = 0usize;

        for (i, (species, ratio)) in normalized.entries.iter().enumerate() {
            let count = if i + 1 < n {
                (ratio * total_atoms as f64).round_ties_even() as usize
            } else {
                total_atoms.checked_sub(accumulated).ok_or_else(|| {
                    SimulationError::InvalidParameter(format!(
                        "rounded counts of the leading species ({accumulated}) exceed total_atoms ({total_atoms})"
                    ))
                })?
            };
            accumulated += count;
            counts.push((species.clone(), count));
        }

        Ok(counts)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for CompositionSpec {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (s, r) in iter {
            spec.insert(s, r);
        }
        spec
    }
}

/// Parses `"Si=0.5,O=0.5"`.
impl FromStr for CompositionSpec {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        let mut spec = Self::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (species, ratio) = part.split_once('=').ok_or_else(|| {
                SimulationError::InvalidParameter(format!(
                    "expected SPECIES=RATIO, got '{part}'"
                ))
            })?;
            let ratio: f64 = ratio.trim().parse().map_err(|_| {
                SimulationError::InvalidParameter(format!("invalid ratio in '{part}'"))
            })?;
            spec.insert(species.trim(), ratio);
        }
        Ok(spec)
    }
}

impl Serialize for CompositionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (species, ratio) in &self.entries {
            map.serialize_entry(species, ratio)?;
        }
        map.end()
    }
}

struct CompositionVisitor;

impl<'de> Visitor<'de> for CompositionVisitor {
    type Value = CompositionSpec;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of species to ratio")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut spec = CompositionSpec::new();
        while let Some((species, ratio)) = access.next_entry::<String, f64>()? {
            spec.insert(species, ratio);
        }
        Ok(spec)
    }
}

impl<'de> Deserialize<'de> for CompositionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(CompositionVisitor)
    }
}
