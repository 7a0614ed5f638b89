use anyhow::Result;

use crate::core::domain::AtomicConfiguration;
use crate::engine::calculator::Calculator;

/// An external equations-of-motion integrator bound to one configuration.
pub trait Dynamics: Send {
    /// Advances `atoms` by `steps` timesteps using forces from `calculator`.
    fn run(
        &mut self,
        atoms: &mut AtomicConfiguration,
        calculator: &dyn Calculator,
        steps: usize,
    ) -> Result<()>;
}

/// Stochastic thermostat. The engine exposes its set-point as `set_temperature`.
pub trait LangevinDynamics: Dynamics {
    fn set_temperature(&mut self, kelvin: f64);
}

/// Deterministic thermostat. The engine exposes its set-point as `set_temeq`.
pub trait NoseHooverDynamics: Dynamics {
    fn set_temeq(&mut self, kelvin: f64);
}

/// Factory for every integrator the protocols can request.
///
/// Timesteps and coupling times in fs, friction in 1/fs, temperature in K,
/// pressure in bar.
pub trait DynamicsEngine {
    fn velocity_verlet(
        &self,
        atoms: &AtomicConfiguration,
        timestep: f64,
    ) -> Result<Box<dyn Dynamics>>;

    fn langevin(
        &self,
        atoms: &AtomicConfiguration,
        timestep: f64,
        temperature: f64,
        friction: f64,
    ) -> Result<Box<dyn LangevinDynamics>>;

    fn nose_hoover(
        &self,
        atoms: &AtomicConfiguration,
        timestep: f64,
        temperature: f64,
        ttime: f64,
    ) -> Result<Box<dyn NoseHooverDynamics>>;

    fn npt(&self, atoms: &AtomicConfiguration, params: NptParams) -> Result<Box<dyn Dynamics>>;

    /// Returns the name of the engine.
    fn name(&self) -> &str;
}

/// Arguments forwarded to the constant-pressure integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NptParams {
    pub timestep: f64,
    pub temperature: f64,
    /// Isotropic external stress (bar).
    pub pressure: f64,
    pub ttime: f64,
    pub ptime: f64,
}

/// A live thermostatted integrator.
///
/// Gives both thermostat kinds one `set_target_temperature` entry point.
pub enum ThermostatHandle {
    Langevin(Box<dyn LangevinDynamics>),
    NoseHoover(Box<dyn NoseHooverDynamics>),
}

impl ThermostatHandle {
    pub fn set_target_temperature(&mut self, kelvin: f64) {
        match self {
            ThermostatHandle::Langevin(d) => d.set_temperature(kelvin),
            ThermostatHandle::NoseHoover(d) => d.set_temeq(kelvin),
        }
    }
}

impl Dynamics for ThermostatHandle {
    fn run(
        &mut self,
        atoms: &mut AtomicConfiguration,
        calculator: &dyn Calculator,
        steps: usize,
    ) -> Result<()> {
        match self {
            ThermostatHandle::Langevin(d) => d.run(atoms, calculator, steps),
            ThermostatHandle::NoseHoover(d) => d.run(atoms, calculator, steps),
        }
    }
}
