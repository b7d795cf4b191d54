//! Tabular Q-learning agent.
//!
//! The agent keeps a state-action value table, an ε-greedy action rule and the
//! one-step temporal-difference update
//! `Q(s,a) ← Q(s,a) + α [r + γ max_a' Q(s',a') − Q(s,a)]`.
//! Its rates are either constant or decay with the number of actions it has
//! chosen so far (its trial counter).

use crate::board::{Move, StateKey};
use crate::config::{LearnerConfig, RateMode};
use crate::error::DecisionError;
use crate::q_table::QTable;
use log::trace;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// γ never anneals below this value.
pub const GAMMA_FLOOR: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rates {
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon: f32,
}

impl LearnerConfig {
    /// Rates in force after `trials` chosen actions.
    pub fn rates_at(&self, trials: u64) -> Rates {
        match self.rate_mode {
            RateMode::Constant => Rates {
                alpha: self.alpha0,
                gamma: self.gamma0,
                epsilon: self.epsilon0,
            },
            RateMode::Decaying => {
                let t = trials as f32;
                let progress = if self.max_trials == 0 {
                    1.0
                } else {
                    (t / self.max_trials as f32).min(1.0)
                };
                Rates {
                    alpha: self.alpha0 / (1.0 + self.decay_rate * t),
                    gamma: self.gamma0 - (self.gamma0 - GAMMA_FLOOR) * progress,
                    epsilon: self.epsilon0 * (-self.decay_rate * t).exp(),
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct QLearner {
    table: QTable,
    config: LearnerConfig,
    trials: u64,
    rng: StdRng,
}

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl QLearner {
    pub fn new(config: LearnerConfig) -> Self {
        Self::with_table(config, QTable::new())
    }

    /// Starts from a table learned earlier, e.g. one loaded from disk.
    pub fn with_table(config: LearnerConfig, table: QTable) -> Self {
        QLearner {
            rng: build_rng(config.seed),
            table,
            config,
            trials: 0,
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn into_table(self) -> QTable {
        self.table
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn current_rates(&self) -> Rates {
        self.config.rates_at(self.trials)
    }

    /// ε-greedy choice among `legal_moves`. Counts as one trial.
    pub fn choose_action(
        &mut self,
        state: &StateKey,
        legal_moves: &[Move],
    ) -> Result<Move, DecisionError> {
        if legal_moves.is_empty() {
            return Err(DecisionError::EmptyLegalMoveSet);
        }
        self.trials += 1;
        let epsilon = self.current_rates().epsilon;
        let candidates = if self.rng.gen::<f32>() < epsilon {
            legal_moves.to_vec()
        } else {
            self.table.best_moves(state, legal_moves)
        };
        let mv = candidates
            .choose(&mut self.rng)
            .copied()
            .ok_or(DecisionError::EmptyLegalMoveSet)?;
        trace!("state {state} trial {} epsilon {epsilon:.4} -> move {mv}", self.trials);
        Ok(mv)
    }

    /// One-step TD update of `(state, action)`. An empty `next_legal_moves`
    /// marks `next_state` as terminal. Returns the new estimate.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: Move,
        reward: f32,
        next_state: &StateKey,
        next_legal_moves: &[Move],
    ) -> f32 {
        let Rates { alpha, gamma, .. } = self.current_rates();
        let target = reward + gamma * self.table.max_value(next_state, next_legal_moves);
        let value = self.table.update(*state, action, target, alpha);
        trace!("update {state}:{action} reward {reward} target {target:.4} -> {value:.4}");
        value
    }
}
