pub mod calculator;
pub mod external;
pub mod generator;
pub mod integrator;
pub mod optimizer;
pub mod trajectory;
pub mod velocities;
