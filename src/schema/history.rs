//! Per-generation snapshots and run history.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Strategy;

/// State of the population right after a generation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    /// Generation index (1-based; 0 is the initial population).
    pub generation: usize,
    /// Population size.
    pub population: usize,
    /// Agents per strategy. Strategies with no agents are absent.
    pub strategy_counts: BTreeMap<Strategy, usize>,
    /// Mean energy across the population (0 when empty).
    pub mean_energy: f32,
    /// Offspring created this generation.
    #[serde(default)]
    pub births: usize,
    /// Agents culled this generation.
    #[serde(default)]
    pub deaths: usize,
}

impl GenerationSnapshot {
    /// Number of agents holding `strategy`.
    pub fn count(&self, strategy: Strategy) -> usize {
        self.strategy_counts.get(&strategy).copied().unwrap_or(0)
    }

    pub fn is_extinct(&self) -> bool {
        self.population == 0
    }

    /// Format as a one-line summary.
    pub fn summary(&self) -> String {
        let counts = self
            .strategy_counts
            .iter()
            .map(|(strategy, count)| format!("'{}': {}", strategy, count))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Generation {}: Population = {} | Strategies = {{{}}}",
            self.generation, self.population, counts
        )
    }
}

/// Ordered record of generation snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    pub generations: Vec<GenerationSnapshot>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: GenerationSnapshot) {
        self.generations.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn last(&self) -> Option<&GenerationSnapshot> {
        self.generations.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationSnapshot> {
        self.generations.iter()
    }

    /// Per-strategy counts over generation index, ready for a stacked area chart.
    ///
    /// The strategy set is taken from the first recorded generation; later
    /// generations missing a strategy contribute 0.
    pub fn strategy_series(&self) -> BTreeMap<Strategy, Vec<usize>> {
        let Some(first) = self.generations.first() else {
            return BTreeMap::new();
        };

        first
            .strategy_counts
            .keys()
            .map(|&strategy| {
                let series: Vec<usize> =
                    self.generations.iter().map(|g| g.count(strategy)).collect();
                (strategy, series)
            })
            .collect()
    }

    /// Save history to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load history from JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Ran the requested number of generations.
    MaxGenerations,
    /// Population reached zero.
    Extinct,
}

/// Outcome of a multi-generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Snapshots recorded after each generation.
    pub history: RunHistory,
    /// Generations actually run.
    pub generations: usize,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}
