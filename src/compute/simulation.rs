//! Population ownership and the generation-step protocol.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::schema::{
    GenerationSnapshot, Move, Payoff, PayoffTable, RunHistory, RunResult, SimulationConfig,
    StopReason, Strategy,
};

use super::agent::Agent;
use super::rng::SimRng;

/// An evolving population playing the grooming game.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    payoffs: PayoffTable,
    population: Vec<Agent>,
    start_population: usize,
    rng: SimRng,
    generation: usize,
}

impl Simulation {
    /// Create a simulation seeded from `config.random_seed` (entropy if unset).
    pub fn new(config: SimulationConfig) -> Self {
        let rng = SimRng::from_seed(config.random_seed);
        Self::with_rng(config, rng)
    }

    /// Create a simulation drawing all randomness from `rng`.
    ///
    /// The initial population has `start_population` agents, each with an
    /// independently uniform strategy.
    pub fn with_rng(config: SimulationConfig, mut rng: SimRng) -> Self {
        let population = (0..config.start_population)
            .map(|_| Agent::new(config.start_energy, rng.choose_strategy()))
            .collect();
        Self::from_population(config, population, rng)
    }

    /// Create a simulation over a caller-provided population.
    pub fn from_population(config: SimulationConfig, population: Vec<Agent>, rng: SimRng) -> Self {
        Self {
            start_population: config.start_population,
            config,
            payoffs: PayoffTable::standard(),
            population,
            rng,
            generation: 0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn payoffs(&self) -> &PayoffTable {
        &self.payoffs
    }

    /// Live agents, in their current (shuffled) order.
    pub fn population(&self) -> &[Agent] {
        &self.population
    }

    #[cfg(test)]
    fn population_mut(&mut self) -> &mut Vec<Agent> {
        &mut self.population
    }

    pub fn start_population(&self) -> usize {
        self.start_population
    }

    #[cfg(test)]
    fn set_start_population(&mut self, start_population: usize) {
        self.start_population = start_population;
    }

    /// Generations run so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn is_extinct(&self) -> bool {
        self.population.is_empty()
    }

    /// Agents per strategy; strategies with no agents are absent.
    pub fn strategy_counts(&self) -> BTreeMap<Strategy, usize> {
        let mut counts = BTreeMap::new();
        for agent in &self.population {
            *counts.entry(agent.strategy()).or_insert(0) += 1;
        }
        counts
    }

    /// Snapshot of the current population.
    pub fn snapshot(&self) -> GenerationSnapshot {
        self.snapshot_with(0, 0)
    }

    fn snapshot_with(&self, births: usize, deaths: usize) -> GenerationSnapshot {
        let mean_energy = if self.population.is_empty() {
            0.0
        } else {
            self.population.iter().map(|a| a.energy as f32).sum::<f32>()
                / self.population.len() as f32
        };

        GenerationSnapshot {
            generation: self.generation,
            population: self.population.len(),
            strategy_counts: self.strategy_counts(),
            mean_energy,
            births,
            deaths,
        }
    }

    /// Choose `agent`'s move against `opponent` using this simulation's RNG.
    pub fn decide_move(&mut self, agent: &Agent, opponent: &Agent) -> Move {
        agent.decide_move(opponent.id(), &mut self.rng)
    }

    /// Resolve one round: record each opponent's move, then apply payoffs.
    ///
    /// Returns the payoffs applied to `agent1` and `agent2`.
    pub fn play_round(
        &self,
        agent1: &mut Agent,
        agent2: &mut Agent,
        move1: Move,
        move2: Move,
    ) -> Payoff {
        resolve_round(&self.payoffs, agent1, agent2, move1, move2)
    }

    /// Run one full generation: shuffle, pair, play, metabolize, cull, reproduce.
    ///
    /// On an empty population every step is a no-op.
    pub fn run_generation(&mut self) -> GenerationSnapshot {
        self.play_pairs();
        self.apply_metabolism(self.config.metabolism_cost);
        let deaths = self.cull_the_weak();
        let births = self.reproduction_and_mutation(self.config.mutation_chance);
        self.generation += 1;

        let snapshot = self.snapshot_with(births, deaths);
        debug!(
            "generation {}: population={} births={} deaths={} mean_energy={:.1}",
            snapshot.generation, snapshot.population, births, deaths, snapshot.mean_energy
        );
        snapshot
    }

    /// Shuffle, then play a round within each consecutive pair.
    ///
    /// A trailing unpaired agent sits the generation out.
    fn play_pairs(&mut self) {
        let Self {
            population,
            rng,
            payoffs,
            ..
        } = self;

        rng.shuffle(population);

        for pair in population.chunks_exact_mut(2) {
            if let [agent1, agent2] = pair {
                // Both decisions happen before either memory is updated
                let move1 = agent1.decide_move(agent2.id(), rng);
                let move2 = agent2.decide_move(agent1.id(), rng);
                resolve_round(payoffs, agent1, agent2, move1, move2);
            }
        }
    }

    /// Subtract `cost` energy from every agent, paired or not.
    pub fn apply_metabolism(&mut self, cost: i32) {
        for agent in &mut self.population {
            agent.energy = agent.energy.saturating_sub(cost);
        }
    }

    /// Remove every agent with `energy <= 0`. Returns how many were removed.
    pub fn cull_the_weak(&mut self) -> usize {
        let before = self.population.len();
        self.population.retain(Agent::is_alive);
        before - self.population.len()
    }

    /// Refill the population to `start_population` from the survivors.
    ///
    /// Parents are picked uniformly from all survivors. Each offspring keeps
    /// its parent's strategy unless a `mutation_chance` draw re-rolls it
    /// uniformly. Offspring start fresh (configured start energy, empty
    /// memory) and are appended once all are created; parents stay. Returns
    /// the number of offspring. With no survivors nothing can reproduce and 0
    /// is returned.
    pub fn reproduction_and_mutation(&mut self, mutation_chance: f64) -> usize {
        let num_to_reproduce = self.start_population.saturating_sub(self.population.len());
        if num_to_reproduce == 0 {
            return 0;
        }
        if self.population.is_empty() {
            warn!(
                "population is extinct; cannot reproduce {} offspring",
                num_to_reproduce
            );
            return 0;
        }

        // Ranked by fitness, though parent choice below is uniform
        let mut fittest: Vec<&Agent> = self.population.iter().collect();
        fittest.sort_by(|a, b| b.energy.cmp(&a.energy));

        let mut offspring = Vec::with_capacity(num_to_reproduce);
        for _ in 0..num_to_reproduce {
            let parent = fittest[self.rng.index(fittest.len())];
            let strategy = if self.rng.chance(mutation_chance) {
                self.rng.choose_strategy()
            } else {
                parent.strategy()
            };
            offspring.push(Agent::new(self.config.start_energy, strategy));
        }

        self.population.extend(offspring);
        num_to_reproduce
    }

    /// Run up to `generations` steps, calling `callback` after each.
    ///
    /// Stops early once the population is extinct.
    pub fn run_with_callback<F>(&mut self, generations: usize, mut callback: F) -> RunResult
    where
        F: FnMut(&GenerationSnapshot),
    {
        info!(
            "starting run: {} generations, population {}",
            generations,
            self.population.len()
        );

        let mut history = RunHistory::new();
        let mut completed = 0;

        let stop_reason = loop {
            if self.is_extinct() {
                break StopReason::Extinct;
            }
            if completed >= generations {
                break StopReason::MaxGenerations;
            }

            let snapshot = self.run_generation();
            completed += 1;
            callback(&snapshot);
            history.push(snapshot);
        };

        info!(
            "run stopped after {} generations: {:?}",
            completed, stop_reason
        );

        RunResult {
            history,
            generations: completed,
            stop_reason,
        }
    }

    /// Run up to `generations` steps (blocking).
    pub fn run(&mut self, generations: usize) -> RunResult {
        self.run_with_callback(generations, |_| {})
    }
}

/// Record both moves in the opposite agent's memory, then apply the
/// directional payoffs for `(move1, move2)`.
fn resolve_round(
    payoffs: &PayoffTable,
    agent1: &mut Agent,
    agent2: &mut Agent,
    move1: Move,
    move2: Move,
) -> Payoff {
    agent1.record_opponent_move(agent2.id(), move2);
    agent2.record_opponent_move(agent1.id(), move1);

    let (payoff1, payoff2) = payoffs.payoff(move1, move2);
    agent1.energy = agent1.energy.saturating_add(payoff1);
    agent2.energy = agent2.energy.saturating_add(payoff2);
    (payoff1, payoff2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_simulation() -> Simulation {
        let config = SimulationConfig {
            random_seed: Some(42),
            ..Default::default()
        };
        Simulation::new(config)
    }

    fn pair() -> (Agent, Agent) {
        (
            Agent::new(100, Strategy::Random),
            Agent::new(100, Strategy::Random),
        )
    }

    #[test]
    fn test_initial_population() {
        let sim = test_simulation();
        assert_eq!(sim.population().len(), 100);
        assert_eq!(sim.start_population(), 100);
        assert_eq!(sim.generation(), 0);
        assert!(sim.population().iter().all(|a| a.energy == 100));
        assert!(sim.population().iter().all(|a| a.memory.is_empty()));
        assert_eq!(sim.strategy_counts().values().sum::<usize>(), 100);
    }

    #[test]
    fn test_mutual_cooperation_payoff() {
        let sim = test_simulation();
        let (mut a, mut b) = pair();
        sim.play_round(&mut a, &mut b, Move::Groom, Move::Groom);
        assert_eq!((a.energy, b.energy), (103, 103));
    }

    #[test]
    fn test_mutual_defection_payoff() {
        let sim = test_simulation();
        let (mut a, mut b) = pair();
        sim.play_round(&mut a, &mut b, Move::Ignore, Move::Ignore);
        assert_eq!((a.energy, b.energy), (100, 100));
    }

    #[test]
    fn test_exploitation_payoff() {
        let sim = test_simulation();
        let (mut a, mut b) = pair();
        sim.play_round(&mut a, &mut b, Move::Groom, Move::Ignore);
        assert_eq!((a.energy, b.energy), (98, 105));

        let (mut a, mut b) = pair();
        sim.play_round(&mut a, &mut b, Move::Ignore, Move::Groom);
        assert_eq!((a.energy, b.energy), (105, 98));
    }

    #[test]
    fn test_decline_is_neutral() {
        let sim = test_simulation();
        for other in Move::ALL {
            let (mut a, mut b) = pair();
            sim.play_round(&mut a, &mut b, other, Move::Decline);
            assert_eq!((a.energy, b.energy), (100, 100));

            let (mut a, mut b) = pair();
            sim.play_round(&mut a, &mut b, Move::Decline, other);
            assert_eq!((a.energy, b.energy), (100, 100));
        }
    }

    #[test]
    fn test_every_move_pair_matches_table() {
        let sim = test_simulation();
        for move1 in Move::ALL {
            for move2 in Move::ALL {
                let (mut a, mut b) = pair();
                let applied = sim.play_round(&mut a, &mut b, move1, move2);
                let expected = sim.payoffs().payoff(move1, move2);

                assert_eq!(applied, expected);
                assert_eq!(a.energy, 100 + expected.0);
                assert_eq!(b.energy, 100 + expected.1);

                assert_eq!(a.memory.len(), 1);
                assert_eq!(b.memory.len(), 1);
                assert_eq!(a.memory[&b.id()], vec![move2]);
                assert_eq!(b.memory[&a.id()], vec![move1]);
            }
        }
    }

    #[test]
    fn test_decide_move_uses_memory() {
        let mut sim = test_simulation();
        let mut tft = Agent::with_strategy(Strategy::TitForTat);
        let mut opponent = Agent::with_strategy(Strategy::AlwaysIgnore);

        assert_eq!(sim.decide_move(&tft, &opponent), Move::Groom);
        let move2 = sim.decide_move(&opponent, &tft);
        sim.play_round(&mut tft, &mut opponent, Move::Groom, move2);
        assert_eq!(sim.decide_move(&tft, &opponent), Move::Ignore);
    }

    #[test]
    fn test_culling_removes_dead_agents() {
        let mut sim = test_simulation();
        let survivor = Agent::new(100, Strategy::Random);
        let survivor_id = survivor.id();
        *sim.population_mut() = vec![
            Agent::new(1, Strategy::Random),
            Agent::new(0, Strategy::Random),
            survivor,
        ];

        sim.apply_metabolism(3);
        let removed = sim.cull_the_weak();

        assert_eq!(removed, 2);
        assert_eq!(sim.population().len(), 1);
        assert_eq!(sim.population()[0].id(), survivor_id);
        assert_eq!(sim.population()[0].energy, 97);
    }

    #[test]
    fn test_reproduction_replaces_culled_agents() {
        let mut sim = test_simulation();
        *sim.population_mut() = vec![
            Agent::new(100, Strategy::Random),
            Agent::new(100, Strategy::Random),
            Agent::new(1, Strategy::Random),
        ];
        sim.set_start_population(3);

        sim.apply_metabolism(3);
        sim.cull_the_weak();
        assert_eq!(sim.population().len(), 2);

        let born = sim.reproduction_and_mutation(0.05);
        assert_eq!(born, 1);
        assert_eq!(sim.population().len(), 3);
    }

    #[test]
    fn test_offspring_inherits_strategy() {
        let mut sim = test_simulation();
        let parent = Agent::new(200, Strategy::AlwaysGroom);
        let parent_id = parent.id();
        *sim.population_mut() = vec![parent];
        sim.set_start_population(20);

        sim.reproduction_and_mutation(0.0);

        let population = sim.population();
        assert_eq!(population.len(), 20);
        assert_eq!(population[0].id(), parent_id);
        assert_eq!(population[0].energy, 200);
        for child in &population[1..] {
            assert_eq!(child.strategy(), Strategy::AlwaysGroom);
            assert_eq!(child.energy, 100);
            assert!(child.memory.is_empty());
        }
    }

    #[test]
    fn test_full_mutation_rerolls_strategies() {
        let mut sim = test_simulation();
        *sim.population_mut() = vec![Agent::new(100, Strategy::AlwaysIgnore)];
        sim.set_start_population(200);

        sim.reproduction_and_mutation(1.0);

        let counts = sim.strategy_counts();
        assert_eq!(counts.len(), Strategy::ALL.len());
    }

    #[test]
    fn test_reproduction_noop_when_full() {
        let mut sim = test_simulation();
        sim.set_start_population(50);
        assert_eq!(sim.reproduction_and_mutation(0.05), 0);
        // Excess is not culled here
        assert_eq!(sim.population().len(), 100);
    }

    #[test]
    fn test_reproduction_without_survivors() {
        let mut sim = test_simulation();
        sim.population_mut().clear();
        assert_eq!(sim.reproduction_and_mutation(0.05), 0);
        assert!(sim.is_extinct());
    }

    #[test]
    fn test_run_generation_invariants() {
        let mut sim = test_simulation();
        for _ in 0..50 {
            let snapshot = sim.run_generation();
            assert!(sim.population().len() <= sim.start_population());
            assert!(sim.population().iter().all(|a| a.energy > 0));
            assert_eq!(snapshot.population, sim.population().len());
            assert_eq!(
                snapshot.strategy_counts.values().sum::<usize>(),
                snapshot.population
            );
        }
        assert_eq!(sim.generation(), 50);
    }

    #[test]
    fn test_odd_agent_still_pays_metabolism() {
        let config = SimulationConfig {
            start_population: 1,
            random_seed: Some(1),
            ..Default::default()
        };
        let mut sim = Simulation::new(config);
        let snapshot = sim.run_generation();

        assert_eq!(snapshot.population, 1);
        assert_eq!(sim.population()[0].energy, 97);
        assert!(sim.population()[0].memory.is_empty());
    }

    #[test]
    fn test_trailing_agent_of_odd_population_sits_out() {
        let config = SimulationConfig {
            start_population: 3,
            ..Default::default()
        };
        let population = (0..3)
            .map(|_| Agent::new(100, Strategy::AlwaysGroom))
            .collect();
        let mut sim = Simulation::from_population(config, population, SimRng::new(11));

        let snapshot = sim.run_generation();
        assert_eq!(snapshot.population, 3);
        assert_eq!(snapshot.deaths, 0);

        let mut energies: Vec<i32> = sim.population().iter().map(|a| a.energy).collect();
        energies.sort_unstable();
        assert_eq!(energies, vec![97, 100, 100]);

        let mut memory_sizes: Vec<usize> =
            sim.population().iter().map(|a| a.memory.len()).collect();
        memory_sizes.sort_unstable();
        assert_eq!(memory_sizes, vec![0, 1, 1]);
    }

    #[test]
    fn test_energy_saturates_instead_of_overflowing() {
        let config = SimulationConfig {
            start_population: 2,
            ..Default::default()
        };
        let population = vec![
            Agent::new(i32::MAX, Strategy::AlwaysGroom),
            Agent::new(i32::MAX, Strategy::AlwaysGroom),
        ];
        let mut sim = Simulation::from_population(config, population, SimRng::new(2));

        sim.run_generation();

        for agent in sim.population() {
            assert_eq!(agent.energy, i32::MAX - 3);
        }

        let mut sim = test_simulation();
        *sim.population_mut() = vec![Agent::new(i32::MIN + 1, Strategy::Random)];
        sim.apply_metabolism(3);
        assert_eq!(sim.population()[0].energy, i32::MIN);
    }

    #[test]
    fn test_tit_for_tat_pair_keeps_grooming() {
        let config = SimulationConfig {
            start_population: 2,
            ..Default::default()
        };
        let population = vec![
            Agent::new(100, Strategy::TitForTat),
            Agent::new(100, Strategy::TitForTat),
        ];
        let mut sim = Simulation::from_population(config, population, SimRng::new(5));

        for _ in 0..3 {
            sim.run_generation();
        }

        // +3 per round, -3 metabolism
        for agent in sim.population() {
            assert_eq!(agent.energy, 100);
            assert_eq!(agent.memory.values().next().unwrap().len(), 3);
        }
    }

    #[test]
    fn test_empty_generation_is_noop() {
        let mut sim = test_simulation();
        sim.population_mut().clear();
        let snapshot = sim.run_generation();
        assert!(snapshot.is_extinct());
        assert_eq!(snapshot.births, 0);
        assert_eq!(snapshot.deaths, 0);
    }

    #[test]
    fn test_run_stops_on_extinction() {
        let config = SimulationConfig {
            start_population: 4,
            metabolism_cost: 1000,
            random_seed: Some(3),
            ..Default::default()
        };
        let mut sim = Simulation::new(config);

        let mut seen = 0;
        let result = sim.run_with_callback(10, |_| seen += 1);

        assert_eq!(result.stop_reason, StopReason::Extinct);
        assert_eq!(result.generations, 1);
        assert_eq!(seen, 1);
        assert!(result.history.last().unwrap().is_extinct());
        assert_eq!(result.history.last().unwrap().deaths, 4);
    }

    #[test]
    fn test_run_max_generations() {
        let mut sim = test_simulation();
        let result = sim.run(5);
        assert_eq!(result.stop_reason, StopReason::MaxGenerations);
        assert_eq!(result.generations, 5);
        assert_eq!(result.history.len(), 5);
        assert_eq!(result.history.last().unwrap().generation, 5);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut sim = test_simulation();
            sim.run(20)
                .history
                .iter()
                .map(|g| g.strategy_counts.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
