//! Dilemma Sim - An evolving population playing a repeated grooming dilemma.
//!
//! Each generation the population is shuffled and paired off. Every pair
//! plays one round of a three-move game (`Groom`, `Ignore`, `Decline`),
//! payoffs adjust each agent's energy, every agent pays a metabolic cost, and
//! agents at or below zero energy are culled. Survivors then refill the
//! population, passing on their strategy with a small chance of mutation.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, moves, strategies, payoff table and run history
//! - `compute`: Agents, the random source and the generation step
//!
//! # Example
//!
//! ```rust,no_run
//! use dilemma_sim::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     random_seed: Some(42),
//!     ..SimulationConfig::with_population(100)
//! };
//! let mut sim = Simulation::new(config);
//!
//! let result = sim.run_with_callback(100, |snapshot| {
//!     println!("{}", snapshot.summary());
//! });
//!
//! for (strategy, series) in result.history.strategy_series() {
//!     println!("{strategy}: {series:?}");
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{Agent, AgentId, SimRng, Simulation};
pub use schema::{
    GenerationSnapshot, Move, PayoffTable, RunHistory, RunResult, SimulationConfig, StopReason,
    Strategy,
};
