//! Agents: identity, energy, strategy and interaction memory.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::schema::{Move, Strategy};

use super::rng::SimRng;

static NEXT_AGENT_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique agent handle. Only meaningful for equality and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId(u64);

impl AgentId {
    fn next() -> Self {
        Self(NEXT_AGENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Default energy for a freshly created agent.
pub const DEFAULT_START_ENERGY: i32 = 100;

/// A member of the population.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    strategy: Strategy,
    /// Fitness score. The agent is culled once this is `<= 0`.
    pub energy: i32,
    /// Opponent id -> moves that opponent played against this agent, oldest first.
    pub memory: HashMap<AgentId, Vec<Move>>,
}

impl Agent {
    /// Create an agent with a fresh id and empty memory.
    pub fn new(start_energy: i32, strategy: Strategy) -> Self {
        Self {
            id: AgentId::next(),
            strategy,
            energy: start_energy,
            memory: HashMap::new(),
        }
    }

    /// Create an agent with default energy and the given strategy.
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self::new(DEFAULT_START_ENERGY, strategy)
    }

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.energy > 0
    }

    /// Most recent move `opponent` played against this agent, if they have met.
    pub fn last_move_of(&self, opponent: AgentId) -> Option<Move> {
        self.memory.get(&opponent).and_then(|moves| moves.last().copied())
    }

    /// Remember a move an opponent played against this agent.
    pub fn record_opponent_move(&mut self, opponent: AgentId, mv: Move) {
        self.memory.entry(opponent).or_default().push(mv);
    }

    /// Choose this agent's move against `opponent`.
    ///
    /// Depends only on the strategy and this agent's own memory; `rng` is
    /// drawn from only by the `Random` strategy.
    pub fn decide_move(&self, opponent: AgentId, rng: &mut SimRng) -> Move {
        match self.strategy {
            Strategy::Random => rng.choose_move(),
            Strategy::AlwaysGroom => Move::Groom,
            Strategy::AlwaysIgnore => Move::Ignore,
            // Cooperate first, then copy the opponent's last move
            Strategy::TitForTat => self.last_move_of(opponent).unwrap_or(Move::Groom),
        }
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(DEFAULT_START_ENERGY, Strategy::default())
    }
}
