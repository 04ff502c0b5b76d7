//! Configuration types for dilemma simulation parameters.

use serde::{Deserialize, Serialize};

/// Upper bound on starting energy and metabolism cost.
pub const MAX_ENERGY_SETTING: i32 = 1_000_000;

fn default_start_population() -> usize {
    100
}

fn default_start_energy() -> i32 {
    100
}

fn default_metabolism_cost() -> i32 {
    3
}

fn default_mutation_chance() -> f64 {
    0.05
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Population size at start, and the target reproduction refills to.
    #[serde(default = "default_start_population")]
    pub start_population: usize,
    /// Energy every new agent (initial or offspring) starts with.
    #[serde(default = "default_start_energy")]
    pub start_energy: i32,
    /// Energy subtracted from every agent once per generation.
    #[serde(default = "default_metabolism_cost")]
    pub metabolism_cost: i32,
    /// Probability that an offspring re-rolls its strategy.
    #[serde(default = "default_mutation_chance")]
    pub mutation_chance: f64,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_population: default_start_population(),
            start_energy: default_start_energy(),
            metabolism_cost: default_metabolism_cost(),
            mutation_chance: default_mutation_chance(),
            random_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Config with the given starting population and defaults elsewhere.
    pub fn with_population(start_population: usize) -> Self {
        Self {
            start_population,
            ..Default::default()
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.start_energy <= 0 {
            return Err(ConfigError::InvalidStartEnergy(self.start_energy));
        }
        if self.start_energy > MAX_ENERGY_SETTING {
            return Err(ConfigError::StartEnergyTooHigh(self.start_energy));
        }
        if self.metabolism_cost < 0 {
            return Err(ConfigError::NegativeMetabolism(self.metabolism_cost));
        }
        if self.metabolism_cost > MAX_ENERGY_SETTING {
            return Err(ConfigError::MetabolismTooHigh(self.metabolism_cost));
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(ConfigError::InvalidMutationChance(self.mutation_chance));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Starting population must be non-zero")]
    EmptyPopulation,
    #[error("Starting energy must be positive, got {0}")]
    InvalidStartEnergy(i32),
    #[error("Starting energy must be at most 1000000, got {0}")]
    StartEnergyTooHigh(i32),
    #[error("Metabolism cost must be non-negative, got {0}")]
    NegativeMetabolism(i32),
    #[error("Metabolism cost must be at most 1000000, got {0}")]
    MetabolismTooHigh(i32),
    #[error("Mutation chance must be within [0, 1], got {0}")]
    InvalidMutationChance(f64),
}
