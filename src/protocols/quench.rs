use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::domain::AtomicConfiguration;
use crate::core::error::{Result, SimulationError};
use crate::engine::calculator::Calculator;
use crate::engine::integrator::{Dynamics, DynamicsEngine, ThermostatHandle};
use crate::engine::trajectory::{Frame, TrajectorySink};
use crate::engine::velocities;
use crate::protocols::{check_timestep, prepare_velocities};

// --- Schedule ---

/// Linear temperature ramp over a fixed number of steps.
///
/// `temperature_at(s) = start + (end - start) * s / total_steps` for `s` in
/// `[0, total_steps)`. The last set-point is one increment short of `end`;
/// the ramp never pushes `end` itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuenchSchedule {
    start_temperature: f64,
    end_temperature: f64,
    total_steps: usize,
}

impl QuenchSchedule {
    pub fn new(start_temperature: f64, end_temperature: f64, total_steps: usize) -> Result<Self> {
        if total_steps == 0 {
            return Err(SimulationError::InvalidParameter(
                "quench total_steps must be positive".into(),
            ));
        }
        for (name, t) in [("start", start_temperature), ("end", end_temperature)] {
            if !t.is_finite() || t < 0.0 {
                return Err(SimulationError::InvalidParameter(format!(
                    "{name} temperature must be finite and non-negative, got {t}"
                )));
            }
        }
        Ok(Self {
            start_temperature,
            end_temperature,
            total_steps,
        })
    }

    pub fn start_temperature(&self) -> f64 {
        self.start_temperature
    }

    pub fn end_temperature(&self) -> f64 {
        self.end_temperature
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    #[inline]
    pub fn temperature_at(&self, step: usize) -> f64 {
        let fraction = step as f64 / self.total_steps as f64;
        self.start_temperature + (self.end_temperature - self.start_temperature) * fraction
    }

    /// `(step, set-point)` for every step of the ramp.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.total_steps).map(move |s| (s, self.temperature_at(s)))
    }
}

// --- Thermostats ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermostatKind {
    Langevin,
    NoseHoover,
}

impl FromStr for ThermostatKind {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "langevin" => Ok(ThermostatKind::Langevin),
            "nosehoover" => Ok(ThermostatKind::NoseHoover),
            _ => Err(SimulationError::InvalidThermostat(s.to_string())),
        }
    }
}

impl fmt::Display for ThermostatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThermostatKind::Langevin => f.write_str("Langevin"),
            ThermostatKind::NoseHoover => f.write_str("NoseHoover"),
        }
    }
}

/// A thermostat kind with its coupling parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Thermostat {
    /// Friction coefficient (1/fs).
    Langevin { friction: f64 },
    /// Characteristic coupling time (fs).
    NoseHoover { ttime: f64 },
}

impl Thermostat {
    /// Picks the parameter relevant to `kind`.
    pub fn from_kind(kind: ThermostatKind, friction: f64, ttime: f64) -> Self {
        match kind {
            ThermostatKind::Langevin => Thermostat::Langevin { friction },
            ThermostatKind::NoseHoover => Thermostat::NoseHoover { ttime },
        }
    }

    pub fn kind(&self) -> ThermostatKind {
        match self {
            Thermostat::Langevin { .. } => ThermostatKind::Langevin,
            Thermostat::NoseHoover { .. } => ThermostatKind::NoseHoover,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Thermostat::Langevin { friction } if !friction.is_finite() || friction < 0.0 => {
                Err(SimulationError::InvalidParameter(format!(
                    "Langevin friction must be non-negative, got {friction}"
                )))
            }
            Thermostat::NoseHoover { ttime } if !ttime.is_finite() || ttime <= 0.0 => {
                Err(SimulationError::InvalidParameter(format!(
                    "Nose-Hoover ttime must be positive, got {ttime}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Asks the engine for a thermostatted integrator at `temperature`.
    pub fn build(
        &self,
        engine: &dyn DynamicsEngine,
        atoms: &AtomicConfiguration,
        timestep: f64,
        temperature: f64,
    ) -> Result<ThermostatHandle> {
        self.validate()?;
        let handle = match *self {
            Thermostat::Langevin { friction } => {
                ThermostatHandle::Langevin(engine.langevin(atoms, timestep, temperature, friction)?)
            }
            Thermostat::NoseHoover { ttime } => {
                ThermostatHandle::NoseHoover(engine.nose_hoover(atoms, timestep, temperature, ttime)?)
            }
        };
        Ok(handle)
    }
}

// --- Quench ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuenchOptions {
    /// Integration timestep (fs).
    pub timestep: f64,
    /// Draw Maxwell-Boltzmann velocities at the start temperature.
    pub init_velocities: bool,
    /// Zero the centre-of-mass velocity before the ramp.
    pub remove_translation: bool,
}

impl Default for QuenchOptions {
    fn default() -> Self {
        Self {
            timestep: 1.0,
            init_velocities: true,
            remove_translation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuenchReport {
    pub steps_completed: usize,
    /// Set-point pushed on the last step.
    pub final_target_temperature: f64,
    /// Instantaneous temperature after the last step, if masses are known.
    pub final_temperature: Option<f64>,
}

/// Live state of a quench: the configuration, its one integrator and the
/// index of the next step.
pub struct QuenchRun<'a> {
    atoms: &'a mut AtomicConfiguration,
    calculator: &'a dyn Calculator,
    integrator: ThermostatHandle,
    schedule: QuenchSchedule,
    next_step: usize,
}

impl<'a> QuenchRun<'a> {
    pub fn new(
        atoms: &'a mut AtomicConfiguration,
        calculator: &'a dyn Calculator,
        integrator: ThermostatHandle,
        schedule: QuenchSchedule,
    ) -> Self {
        Self {
            atoms,
            calculator,
            integrator,
            schedule,
            next_step: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next_step >= self.schedule.total_steps()
    }

    pub fn next_step(&self) -> usize {
        self.next_step
    }

    pub fn atoms(&self) -> &AtomicConfiguration {
        &*self.atoms
    }

    /// Pushes the set-point, advances one step and appends one frame.
    ///
    /// Returns the set-point used, or `None` once the ramp is complete.
    pub fn step(&mut self, sink: &mut dyn TrajectorySink) -> Result<Option<f64>> {
        if self.is_finished() {
            return Ok(None);
        }
        let s = self.next_step;
        let target = self.schedule.temperature_at(s);

        self.integrator.set_target_temperature(target);
        self.integrator.run(&mut *self.atoms, self.calculator, 1)?;
        sink.write_frame(Frame {
            step: s,
            target_temperature: Some(target),
            atoms: &*self.atoms,
        })?;

        self.next_step += 1;
        Ok(Some(target))
    }
}

/// Cools (or heats) `atoms` along `schedule` under an NVT thermostat.
///
/// One integrator is built at the start temperature and kept for the whole
/// ramp; its set-point is replaced before every single step, and one frame is
/// written to `sink` after every step. On error the configuration is left as
/// the last completed step produced it.
#[allow(clippy::too_many_arguments)]
pub fn quench<R: Rng + ?Sized>(
    atoms: &mut AtomicConfiguration,
    schedule: &QuenchSchedule,
    thermostat: &Thermostat,
    options: &QuenchOptions,
    engine: &dyn DynamicsEngine,
    calculator: &dyn Calculator,
    sink: &mut dyn TrajectorySink,
    rng: &mut R,
) -> Result<QuenchReport> {
    check_timestep(options.timestep)?;
    thermostat.validate()?;

    prepare_velocities(
        atoms,
        schedule.start_temperature(),
        options.init_velocities,
        options.remove_translation,
        rng,
    )?;

    let integrator = thermostat.build(engine, atoms, options.timestep, schedule.start_temperature())?;
    log::info!(
        "Quench {:.1} K -> {:.1} K over {} steps ({} via {}, calculator {})",
        schedule.start_temperature(),
        schedule.end_temperature(),
        schedule.total_steps(),
        thermostat.kind(),
        engine.name(),
        calculator.name()
    );

    let total = schedule.total_steps();
    let progress_every = (total / 10).max(1);
    let mut run = QuenchRun::new(atoms, calculator, integrator, *schedule);
    let mut last_target = schedule.start_temperature();

    while let Some(target) = run.step(sink)? {
        last_target = target;
        let done = run.next_step();
        if done % progress_every == 0 {
            log::debug!("Quench step {done}/{total}, set-point {target:.2} K");
        }
    }

    let report = QuenchReport {
        steps_completed: run.next_step(),
        final_target_temperature: last_target,
        final_temperature: velocities::instantaneous_temperature(run.atoms()).ok(),
    };
    log::info!(
        "Quench finished after {} steps (last set-point {:.2} K)",
        report.steps_completed,
        report.final_target_temperature
    );
    Ok(report)
}
