use amorphgen::core::error::SimulationError;
use amorphgen::engine::trajectory::{MemoryTrajectory, Snapshot};
use amorphgen::protocols::quench::{
    quench, QuenchOptions, QuenchRun, QuenchSchedule, Thermostat, ThermostatKind,
};
use crate::common::{silica_line, EngineCall, MockCalculator, MockEngine};
use crossbeam_channel::unbounded;
use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

mod common;

const LANGEVIN: Thermostat = Thermostat::Langevin { friction: 0.02 };

fn no_velocities() -> QuenchOptions {
    QuenchOptions {
        timestep: 1.0,
        init_velocities: false,
        remove_translation: false,
    }
}

#[test]
fn test_schedule_boundaries() {
    let s = QuenchSchedule::new(3000.0, 300.0, 3000).unwrap();
    assert!((s.temperature_at(0) - 3000.0).abs() < 1e-9);
    assert!((s.temperature_at(1500) - 1650.0).abs() < 1e-9);
    // Literal step / total_steps: the last set-point stops one increment short of 300 K.
    assert!((s.temperature_at(2999) - 300.9).abs() < 1e-9);

    let ramp: Vec<(usize, f64)> = s.iter().collect();
    assert_eq!(ramp.len(), 3000);
    assert_eq!(ramp[0].0, 0);
    assert_eq!(ramp[2999].0, 2999);
}

#[test]
fn test_schedule_rejects_zero_steps() {
    assert!(matches!(
        QuenchSchedule::new(3000.0, 300.0, 0),
        Err(SimulationError::InvalidParameter(_))
    ));
    assert!(QuenchSchedule::new(f64::NAN, 300.0, 10).is_err());
}

#[test]
fn test_thermostat_names() {
    assert_eq!("Langevin".parse::<ThermostatKind>().unwrap(), ThermostatKind::Langevin);
    assert_eq!("langevin".parse::<ThermostatKind>().unwrap(), ThermostatKind::Langevin);
    assert_eq!("NoseHoover".parse::<ThermostatKind>().unwrap(), ThermostatKind::NoseHoover);
    assert_eq!("NOSEHOOVER".parse::<ThermostatKind>().unwrap(), ThermostatKind::NoseHoover);

    match "Berendsen".parse::<ThermostatKind>() {
        Err(SimulationError::InvalidThermostat(name)) => assert_eq!(name, "Berendsen"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_langevin_ramp_pushes_every_set_point() {
    let mut atoms = silica_line(6);
    let schedule = QuenchSchedule::new(100.0, 10.0, 10).unwrap();
    let engine = MockEngine::new();
    let mut traj = MemoryTrajectory::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let report = quench(
        &mut atoms,
        &schedule,
        &LANGEVIN,
        &no_velocities(),
        &engine,
        &MockCalculator,
        &mut traj,
        &mut rng,
    )
    .unwrap();

    let calls = engine.calls();
    assert_eq!(
        calls[0],
        EngineCall::Langevin {
            timestep: 1.0,
            temperature: 100.0,
            friction: 0.02
        }
    );

    // A single integrator, then (set-point, one step) pairs in step order.
    let builds = calls
        .iter()
        .filter(|c| matches!(c, EngineCall::Langevin { .. } | EngineCall::NoseHoover { .. }))
        .count();
    assert_eq!(builds, 1);
    assert_eq!(calls.len(), 1 + 2 * 10);
    for s in 0..10 {
        let expected = 100.0 + (10.0 - 100.0) * (s as f64 / 10.0);
        match &calls[1 + 2 * s] {
            EngineCall::SetTemperature(t) => assert!((t - expected).abs() < 1e-12),
            other => panic!("step {s}: expected set-point, got {other:?}"),
        }
        assert_eq!(calls[2 + 2 * s], EngineCall::Run(1));
    }

    assert_eq!(traj.len(), 10);
    for (s, frame) in traj.frames.iter().enumerate() {
        assert_eq!(frame.step, s);
        assert_eq!(frame.target_temperature, Some(schedule.temperature_at(s)));
        // The mock engine moves every atom 0.01 Å per step.
        let drift = frame.atoms.positions[0].x - 0.0;
        assert!((drift - 0.01 * (s + 1) as f64).abs() < 1e-12);
    }

    assert_eq!(report.steps_completed, 10);
    assert!((report.final_target_temperature - 19.0).abs() < 1e-12);
    assert_eq!(report.final_temperature, Some(0.0));
    assert_eq!(atoms, traj.last().unwrap().atoms);
}

#[test]
fn test_nose_hoover_uses_its_own_entry_point() {
    let mut atoms = silica_line(4);
    let schedule = QuenchSchedule::new(3000.0, 300.0, 4).unwrap();
    let engine = MockEngine::new();
    let mut traj = MemoryTrajectory::new();

    quench(
        &mut atoms,
        &schedule,
        &Thermostat::NoseHoover { ttime: 25.0 },
        &no_velocities(),
        &engine,
        &MockCalculator,
        &mut traj,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap();

    let calls = engine.calls();
    assert_eq!(
        calls[0],
        EngineCall::NoseHoover {
            timestep: 1.0,
            temperature: 3000.0,
            ttime: 25.0
        }
    );
    let set_points: Vec<f64> = calls
        .iter()
        .filter_map(|c| match c {
            EngineCall::SetTemeq(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(set_points, vec![3000.0, 2325.0, 1650.0, 975.0]);
    assert!(!calls.iter().any(|c| matches!(c, EngineCall::SetTemperature(_))));
}

#[test]
fn test_velocity_initialisation_removes_drift() {
    let mut atoms = silica_line(50);
    let schedule = QuenchSchedule::new(1500.0, 300.0, 3).unwrap();
    let engine = MockEngine::new();
    let mut traj = MemoryTrajectory::new();

    let report = quench(
        &mut atoms,
        &schedule,
        &LANGEVIN,
        &QuenchOptions::default(),
        &engine,
        &MockCalculator,
        &mut traj,
        &mut ChaCha8Rng::seed_from_u64(21),
    )
    .unwrap();

    let masses = atoms.masses().unwrap();
    let momentum: Vector3<f64> = atoms
        .velocities
        .iter()
        .zip(&masses)
        .map(|(v, m)| v * *m)
        .sum();
    assert!(momentum.norm() < 1e-9);
    assert!(atoms.velocities.iter().any(|v| v.norm() > 0.0));
    assert!(report.final_temperature.unwrap() > 0.0);
}

#[test]
fn test_integrator_failure_propagates() {
    let mut atoms = silica_line(4);
    let schedule = QuenchSchedule::new(1000.0, 100.0, 10).unwrap();
    let engine = MockEngine::failing_after(3);
    let mut traj = MemoryTrajectory::new();

    let err = quench(
        &mut atoms,
        &schedule,
        &LANGEVIN,
        &no_velocities(),
        &engine,
        &MockCalculator,
        &mut traj,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();

    assert!(matches!(err, SimulationError::Engine(_)));
    assert!(err.to_string().contains("blew up"));
    // Frames for the three completed steps only.
    assert_eq!(traj.len(), 3);
    assert!((atoms.positions[0].x - 0.03).abs() < 1e-12);
}

#[test]
fn test_bad_parameters_fail_before_any_engine_call() {
    let schedule = QuenchSchedule::new(1000.0, 100.0, 10).unwrap();
    let engine = MockEngine::new();
    let mut traj = MemoryTrajectory::new();

    let err = quench(
        &mut silica_line(4),
        &schedule,
        &Thermostat::NoseHoover { ttime: 0.0 },
        &no_velocities(),
        &engine,
        &MockCalculator,
        &mut traj,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidParameter(_)));

    let bad_timestep = QuenchOptions {
        timestep: 0.0,
        ..no_velocities()
    };
    let err = quench(
        &mut silica_line(4),
        &schedule,
        &LANGEVIN,
        &bad_timestep,
        &engine,
        &MockCalculator,
        &mut traj,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidParameter(_)));

    assert!(engine.calls().is_empty());
    assert!(traj.is_empty());
}

#[test]
fn test_unknown_element_blocks_velocity_init() {
    let mut atoms = silica_line(2);
    atoms.symbols[1] = "Xx".into();
    let schedule = QuenchSchedule::new(1000.0, 100.0, 5).unwrap();
    let engine = MockEngine::new();
    let mut traj = MemoryTrajectory::new();

    let err = quench(
        &mut atoms,
        &schedule,
        &LANGEVIN,
        &QuenchOptions::default(),
        &engine,
        &MockCalculator,
        &mut traj,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap_err();

    assert!(matches!(err, SimulationError::UnknownElement(ref s) if s == "Xx"));
    assert!(engine.calls().is_empty());
}

#[test]
fn test_frames_stream_through_channel() {
    let mut atoms = silica_line(4);
    let schedule = QuenchSchedule::new(500.0, 100.0, 5).unwrap();
    let engine = MockEngine::new();
    let (tx, rx) = unbounded::<Snapshot>();
    let mut sink = (tx, MemoryTrajectory::new());

    quench(
        &mut atoms,
        &schedule,
        &LANGEVIN,
        &no_velocities(),
        &engine,
        &MockCalculator,
        &mut sink,
        &mut ChaCha8Rng::seed_from_u64(0),
    )
    .unwrap();

    let (tx, memory) = sink;
    drop(tx);
    let streamed: Vec<Snapshot> = rx.iter().collect();
    assert_eq!(streamed.len(), 5);
    assert_eq!(streamed, memory.frames);
    let steps: Vec<usize> = streamed.iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_quench_run_steps_until_done() {
    let mut atoms = silica_line(2);
    let schedule = QuenchSchedule::new(200.0, 100.0, 2).unwrap();
    let engine = MockEngine::new();
    let integrator = Thermostat::Langevin { friction: 0.01 }
        .build(&engine, &atoms, 0.5, schedule.start_temperature())
        .unwrap();
    let mut traj = MemoryTrajectory::new();

    let mut run = QuenchRun::new(&mut atoms, &MockCalculator, integrator, schedule);
    assert_eq!(run.step(&mut traj).unwrap(), Some(200.0));
    assert_eq!(run.step(&mut traj).unwrap(), Some(150.0));
    assert!(run.is_finished());
    assert_eq!(run.step(&mut traj).unwrap(), None);
    assert_eq!(traj.len(), 2);
}
