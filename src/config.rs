use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::composition::CompositionSpec;
use crate::core::domain::Periodicity;
use crate::core::error::SimulationError;
use crate::engine::external::steplog::StepLog;
use crate::engine::external::xyz::XyzTrajectory;
use crate::engine::generator::GeneratorParams;
use crate::protocols::dynamics::{DynamicsParams, Ensemble};
use crate::protocols::minimize::MinimizeParams;
use crate::protocols::quench::{QuenchOptions, QuenchSchedule, Thermostat, ThermostatKind};

/// XYZ trajectory plus CSV step log; a frame written to the pair goes to both files.
pub type FileSinks = (XyzTrajectory<BufWriter<File>>, StepLog<File>);

fn open_sinks(trajectory: &Path, logfile: &Path) -> Result<FileSinks> {
    Ok((XyzTrajectory::create(trajectory)?, StepLog::create(logfile)?))
}

// --- Configuration Types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub composition: CompositionSpec,
    pub total_atoms: usize,
    pub box_size: f64,
    pub min_distance: f64,
    pub max_attempts: usize,
    pub pbc: Periodicity,
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let p = GeneratorParams::default();
        Self {
            composition: CompositionSpec::new().with("Si", 0.5).with("O", 0.5),
            total_atoms: p.total_atoms,
            box_size: p.box_size,
            min_distance: p.min_distance,
            max_attempts: p.max_attempts,
            pbc: p.pbc,
            seed: None,
        }
    }
}

impl GenerationConfig {
    pub fn params(&self) -> GeneratorParams {
        GeneratorParams {
            total_atoms: self.total_atoms,
            box_size: self.box_size,
            min_distance: self.min_distance,
            max_attempts: self.max_attempts,
            pbc: self.pbc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizeConfig {
    pub fmax: f64,
    pub max_steps: usize,
    pub logfile: Option<PathBuf>,
    pub restart_file: Option<PathBuf>,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        let p = MinimizeParams::default();
        Self {
            fmax: p.fmax,
            max_steps: p.max_steps,
            logfile: p.logfile,
            restart_file: p.restart_file,
        }
    }
}

impl MinimizeConfig {
    pub fn params(&self) -> MinimizeParams {
        MinimizeParams {
            fmax: self.fmax,
            max_steps: self.max_steps,
            logfile: self.logfile.clone(),
            restart_file: self.restart_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// "NVE", "NVT" or "NPT".
    pub ensemble: String,
    /// Used for NVT only: "Langevin" or "NoseHoover".
    pub thermostat: String,
    pub temperature: f64,
    /// bar, NPT only.
    pub pressure: f64,
    /// fs
    pub timestep: f64,
    pub steps: usize,
    /// 1/fs
    pub friction: f64,
    /// fs
    pub ttime: f64,
    /// fs
    pub ptime: f64,
    pub trajectory: PathBuf,
    pub logfile: PathBuf,
    pub trajectory_interval: usize,
    pub init_velocities: bool,
    pub remove_translation: bool,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        let p = DynamicsParams::default();
        Self {
            ensemble: "NVE".into(),
            thermostat: "Langevin".into(),
            temperature: p.temperature,
            pressure: 1.0,
            timestep: p.timestep,
            steps: p.steps,
            friction: 0.02,
            ttime: 25.0,
            ptime: 100.0,
            trajectory: PathBuf::from("md.traj"),
            logfile: PathBuf::from("md.log"),
            trajectory_interval: p.trajectory_interval,
            init_velocities: p.init_velocities,
            remove_translation: p.remove_translation,
        }
    }
}

impl DynamicsConfig {
    pub fn ensemble(&self) -> Result<Ensemble, SimulationError> {
        Ensemble::parse(
            &self.ensemble,
            &self.thermostat,
            self.friction,
            self.ttime,
            self.pressure,
            self.ptime,
        )
    }

    pub fn params(&self) -> DynamicsParams {
        DynamicsParams {
            temperature: self.temperature,
            timestep: self.timestep,
            steps: self.steps,
            init_velocities: self.init_velocities,
            remove_translation: self.remove_translation,
            trajectory_interval: self.trajectory_interval,
        }
    }

    /// Creates (truncating) the configured trajectory and log files.
    pub fn sinks(&self) -> Result<FileSinks> {
        open_sinks(&self.trajectory, &self.logfile)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuenchConfig {
    pub start_temp: f64,
    pub end_temp: f64,
    pub total_steps: usize,
    pub timestep_fs: f64,
    /// "Langevin" or "NoseHoover".
    pub thermostat: String,
    pub friction: f64,
    pub ttime: f64,
    pub init_velocity: bool,
    pub remove_translation: bool,
    pub logfile: PathBuf,
    pub trajectory: PathBuf,
}

impl Default for QuenchConfig {
    fn default() -> Self {
        let o = QuenchOptions::default();
        Self {
            start_temp: 3000.0,
            end_temp: 300.0,
            total_steps: 5000,
            timestep_fs: o.timestep,
            thermostat: "Langevin".into(),
            friction: 0.02,
            ttime: 25.0,
            init_velocity: o.init_velocities,
            remove_translation: o.remove_translation,
            logfile: PathBuf::from("quench.log"),
            trajectory: PathBuf::from("quench.traj"),
        }
    }
}

impl QuenchConfig {
    pub fn schedule(&self) -> Result<QuenchSchedule, SimulationError> {
        QuenchSchedule::new(self.start_temp, self.end_temp, self.total_steps)
    }

    pub fn thermostat(&self) -> Result<Thermostat, SimulationError> {
        let kind: ThermostatKind = self.thermostat.parse()?;
        Ok(Thermostat::from_kind(kind, self.friction, self.ttime))
    }

    pub fn options(&self) -> QuenchOptions {
        QuenchOptions {
            timestep: self.timestep_fs,
            init_velocities: self.init_velocity,
            remove_translation: self.remove_translation,
        }
    }

    pub fn sinks(&self) -> Result<FileSinks> {
        open_sinks(&self.trajectory, &self.logfile)
    }
}

/// Full run configuration. Every field may be omitted from the JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub generation: GenerationConfig,
    pub minimize: MinimizeConfig,
    pub dynamics: DynamicsConfig,
    pub quench: QuenchConfig,
}

impl RunConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse run configuration")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("In config file {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run configuration")
    }
}
