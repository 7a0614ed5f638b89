use thiserror::Error;

/// Failures raised by the generator and the simulation protocols.
///
/// Collaborator failures (calculator, integrator, optimizer, sinks) are
/// carried through `Engine` untouched.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(
        "Cannot place atom '{species}' without violating min_distance={min_distance} \
         after {max_attempts} attempts. Increase box_size or reduce total_atoms / min_distance."
    )]
    UnsatisfiableConstraint {
        species: String,
        min_distance: f64,
        max_attempts: usize,
    },

    #[error("Unknown thermostat '{0}' for NVT: choose 'Langevin' or 'NoseHoover'")]
    InvalidThermostat(String),

    #[error("Invalid ensemble '{0}': must be 'NVE', 'NVT', or 'NPT'")]
    InvalidEnsemble(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No atomic mass tabulated for element '{0}'")]
    UnknownElement(String),

    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;
