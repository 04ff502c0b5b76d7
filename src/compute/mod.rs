//! Compute module - Agents, randomness and the generation step.

mod agent;
mod rng;
mod simulation;

pub use agent::*;
pub use rng::*;
pub use simulation::*;
