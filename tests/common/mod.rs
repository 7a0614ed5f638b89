#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use nalgebra::{Point3, Vector3};

use amorphgen::core::domain::{AtomicConfiguration, Cell, Periodicity};
use amorphgen::engine::calculator::{Calculation, Calculator};
use amorphgen::engine::integrator::{
    Dynamics, DynamicsEngine, LangevinDynamics, NoseHooverDynamics, NptParams,
};
use amorphgen::engine::optimizer::{Optimizer, OptimizerEngine};

pub struct MockCalculator;

impl Calculator for MockCalculator {
    fn compute(&self, atoms: &AtomicConfiguration) -> Result<Calculation> {
        // Simple mock energy function: Sum of distances from origin
        let energy = atoms.positions.iter().map(|p| p.coords.norm()).sum();
        Ok(Calculation {
            energy,
            forces: vec![Vector3::zeros(); atoms.len()],
        })
    }

    fn name(&self) -> &str {
        "Mock Calculator"
    }
}

/// Everything the mock engine was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    VelocityVerlet { timestep: f64 },
    Langevin { timestep: f64, temperature: f64, friction: f64 },
    NoseHoover { timestep: f64, temperature: f64, ttime: f64 },
    Npt(NptParams),
    SetTemperature(f64),
    SetTemeq(f64),
    Run(usize),
}

pub type CallLog = Arc<Mutex<Vec<EngineCall>>>;

/// Records every call; dynamics drift atoms +0.01 Å along x per step.
#[derive(Default)]
pub struct MockEngine {
    pub calls: CallLog,
    /// Number of successful `run` calls before the integrator fails.
    pub fail_after_runs: Option<usize>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(runs: usize) -> Self {
        Self {
            calls: CallLog::default(),
            fail_after_runs: Some(runs),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    fn dynamics(&self) -> MockDynamics {
        MockDynamics {
            calls: self.calls.clone(),
            runs: 0,
            fail_after_runs: self.fail_after_runs,
        }
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DynamicsEngine for MockEngine {
    fn velocity_verlet(&self, _atoms: &AtomicConfiguration, timestep: f64) -> Result<Box<dyn Dynamics>> {
        self.record(EngineCall::VelocityVerlet { timestep });
        Ok(Box::new(self.dynamics()))
    }

    fn langevin(
        &self,
        _atoms: &AtomicConfiguration,
        timestep: f64,
        temperature: f64,
        friction: f64,
    ) -> Result<Box<dyn LangevinDynamics>> {
        self.record(EngineCall::Langevin { timestep, temperature, friction });
        Ok(Box::new(self.dynamics()))
    }

    fn nose_hoover(
        &self,
        _atoms: &AtomicConfiguration,
        timestep: f64,
        temperature: f64,
        ttime: f64,
    ) -> Result<Box<dyn NoseHooverDynamics>> {
        self.record(EngineCall::NoseHoover { timestep, temperature, ttime });
        Ok(Box::new(self.dynamics()))
    }

    fn npt(&self, _atoms: &AtomicConfiguration, params: NptParams) -> Result<Box<dyn Dynamics>> {
        self.record(EngineCall::Npt(params));
        Ok(Box::new(self.dynamics()))
    }

    fn name(&self) -> &str {
        "Mock Engine"
    }
}

pub struct MockDynamics {
    calls: CallLog,
    runs: usize,
    fail_after_runs: Option<usize>,
}

impl Dynamics for MockDynamics {
    fn run(
        &mut self,
        atoms: &mut AtomicConfiguration,
        calculator: &dyn Calculator,
        steps: usize,
    ) -> Result<()> {
        if self.fail_after_runs == Some(self.runs) {
            bail!("integrator blew up");
        }
        calculator.compute(atoms)?;
        for p in &mut atoms.positions {
            p.x += 0.01 * steps as f64;
        }
        self.runs += 1;
        self.calls.lock().unwrap().push(EngineCall::Run(steps));
        Ok(())
    }
}

impl LangevinDynamics for MockDynamics {
    fn set_temperature(&mut self, kelvin: f64) {
        self.calls.lock().unwrap().push(EngineCall::SetTemperature(kelvin));
    }
}

impl NoseHooverDynamics for MockDynamics {
    fn set_temeq(&mut self, kelvin: f64) {
        self.calls.lock().unwrap().push(EngineCall::SetTemeq(kelvin));
    }
}

/// What the optimizer factory and optimizer were handed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizerRecord {
    pub logfile: Option<PathBuf>,
    pub restart_file: Option<PathBuf>,
    pub fmax: Option<f64>,
    pub max_steps: Option<usize>,
}

/// Pulls every atom to the origin, which zeroes the mock energy.
#[derive(Default)]
pub struct MockOptimizerEngine {
    pub record: Arc<Mutex<OptimizerRecord>>,
    pub converge: bool,
    pub fail: bool,
}

impl OptimizerEngine for MockOptimizerEngine {
    fn optimizer(&self, logfile: Option<&Path>, restart_file: Option<&Path>) -> Result<Box<dyn Optimizer>> {
        {
            let mut r = self.record.lock().unwrap();
            r.logfile = logfile.map(Path::to_path_buf);
            r.restart_file = restart_file.map(Path::to_path_buf);
        }
        Ok(Box::new(MockOptimizer {
            record: self.record.clone(),
            converge: self.converge,
            fail: self.fail,
        }))
    }
}

pub struct MockOptimizer {
    record: Arc<Mutex<OptimizerRecord>>,
    converge: bool,
    fail: bool,
}

impl Optimizer for MockOptimizer {
    fn run(
        &mut self,
        atoms: &mut AtomicConfiguration,
        _calculator: &dyn Calculator,
        fmax: f64,
        max_steps: usize,
    ) -> Result<bool> {
        if self.fail {
            bail!("optimizer diverged");
        }
        {
            let mut r = self.record.lock().unwrap();
            r.fmax = Some(fmax);
            r.max_steps = Some(max_steps);
        }
        for p in &mut atoms.positions {
            *p = Point3::origin();
        }
        Ok(self.converge)
    }
}

/// A small Si/O configuration on a line, at rest.
pub fn silica_line(n: usize) -> AtomicConfiguration {
    let symbols = (0..n)
        .map(|i| if i % 2 == 0 { "Si".to_string() } else { "O".to_string() })
        .collect();
    let positions = (0..n).map(|i| Point3::new(i as f64 * 2.0, 1.0, 1.0)).collect();
    AtomicConfiguration::new(symbols, positions, Cell::cubic(2.0 * n as f64), Periodicity::FULL)
        .unwrap()
}
