//! Random amorphous structure generation and thermal quench protocols
//! driven through an external simulation engine.

pub mod analysis;
pub mod config;
pub mod core;
pub mod engine;
pub mod protocols;
