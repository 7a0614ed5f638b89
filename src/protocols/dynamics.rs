use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::domain::AtomicConfiguration;
use crate::core::error::{Result, SimulationError};
use crate::engine::calculator::Calculator;
use crate::engine::integrator::{Dynamics, DynamicsEngine, NptParams};
use crate::engine::trajectory::{Frame, TrajectorySink};
use crate::protocols::quench::{Thermostat, ThermostatKind};
use crate::protocols::{check_timestep, prepare_velocities};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnsembleKind {
    Nve,
    Nvt,
    Npt,
}

impl FromStr for EnsembleKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "NVE" => Ok(EnsembleKind::Nve),
            "NVT" => Ok(EnsembleKind::Nvt),
            "NPT" => Ok(EnsembleKind::Npt),
            _ => Err(SimulationError::InvalidEnsemble(s.to_string())),
        }
    }
}

impl fmt::Display for EnsembleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnsembleKind::Nve => f.write_str("NVE"),
            EnsembleKind::Nvt => f.write_str("NVT"),
            EnsembleKind::Npt => f.write_str("NPT"),
        }
    }
}

/// Statistical ensemble of a dynamics run together with its coupling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Ensemble {
    Nve,
    Nvt(Thermostat),
    /// Pressure in bar, coupling times in fs.
    Npt { pressure: f64, ttime: f64, ptime: f64 },
}

impl Ensemble {
    pub fn kind(&self) -> EnsembleKind {
        match self {
            Ensemble::Nve => EnsembleKind::Nve,
            Ensemble::Nvt(_) => EnsembleKind::Nvt,
            Ensemble::Npt { .. } => EnsembleKind::Npt,
        }
    }

    /// Parses ensemble and thermostat names. The thermostat name is only
    /// consulted for NVT.
    pub fn parse(
        ensemble: &str,
        thermostat: &str,
        friction: f64,
        ttime: f64,
        pressure: f64,
        ptime: f64,
    ) -> Result<Self> {
        Ok(match ensemble.parse::<EnsembleKind>()? {
            EnsembleKind::Nve => Ensemble::Nve,
            EnsembleKind::Nvt => {
                let kind: ThermostatKind = thermostat.parse()?;
                Ensemble::Nvt(Thermostat::from_kind(kind, friction, ttime))
            }
            EnsembleKind::Npt => Ensemble::Npt {
                pressure,
                ttime,
                ptime,
            },
        })
    }

    /// Thermostat set-point carried by the ensemble, if any.
    fn set_point(&self, temperature: f64) -> Option<f64> {
        match self {
            Ensemble::Nve => None,
            _ => Some(temperature),
        }
    }

    fn build(
        &self,
        engine: &dyn DynamicsEngine,
        atoms: &AtomicConfiguration,
        params: &DynamicsParams,
    ) -> Result<Box<dyn Dynamics>> {
        let dynamics: Box<dyn Dynamics> = match *self {
            Ensemble::Nve => engine.velocity_verlet(atoms, params.timestep)?,
            Ensemble::Nvt(thermostat) => {
                Box::new(thermostat.build(engine, atoms, params.timestep, params.temperature)?)
            }
            Ensemble::Npt {
                pressure,
                ttime,
                ptime,
            } => engine.npt(
                atoms,
                NptParams {
                    timestep: params.timestep,
                    temperature: params.temperature,
                    pressure,
                    ttime,
                    ptime,
                },
            )?,
        };
        Ok(dynamics)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicsParams {
    /// Target temperature (K); also the velocity initialisation temperature.
    pub temperature: f64,
    /// Timestep (fs).
    pub timestep: f64,
    pub steps: usize,
    pub init_velocities: bool,
    pub remove_translation: bool,
    /// Steps between trajectory frames.
    pub trajectory_interval: usize,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            temperature: 300.0,
            timestep: 1.0,
            steps: 5000,
            init_velocities: true,
            remove_translation: true,
            trajectory_interval: 1,
        }
    }
}

/// Runs a plain MD trajectory in the requested ensemble.
///
/// With a sink the engine is advanced in chunks of `trajectory_interval`
/// steps and one frame follows each chunk; without one it runs all steps in
/// a single call.
pub fn run_dynamics<R: Rng + ?Sized>(
    atoms: &mut AtomicConfiguration,
    ensemble: &Ensemble,
    params: &DynamicsParams,
    engine: &dyn DynamicsEngine,
    calculator: &dyn Calculator,
    sink: Option<&mut dyn TrajectorySink>,
    rng: &mut R,
) -> Result<()> {
    check_timestep(params.timestep)?;
    if params.trajectory_interval == 0 {
        return Err(SimulationError::InvalidParameter(
            "trajectory_interval must be positive".into(),
        ));
    }

    prepare_velocities(
        atoms,
        params.temperature,
        params.init_velocities,
        params.remove_translation,
        rng,
    )?;

    let mut dynamics = ensemble.build(engine, atoms, params)?;
    log::info!(
        "{} dynamics: {} steps of {} fs at {:.1} K ({})",
        ensemble.kind(),
        params.steps,
        params.timestep,
        params.temperature,
        engine.name()
    );

    match sink {
        None => dynamics.run(atoms, calculator, params.steps)?,
        Some(sink) => {
            let target = ensemble.set_point(params.temperature);
            let mut done = 0;
            while done < params.steps {
                let chunk = params.trajectory_interval.min(params.steps - done);
                dynamics.run(atoms, calculator, chunk)?;
                done += chunk;
                sink.write_frame(Frame {
                    step: done,
                    target_temperature: target,
                    atoms: &*atoms,
                })?;
            }
        }
    }

    log::info!("{} dynamics finished", ensemble.kind());
    Ok(())
}
