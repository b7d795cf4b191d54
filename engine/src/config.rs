use crate::board::Mark;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const NUM_GAMES: usize = 10_000_usize;
pub const PROGRESS_EVERY: usize = 1_000_usize;

/// How the learner's rates evolve with its trial counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    #[default]
    Constant,
    Decaying,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub rate_mode: RateMode,
    /// Learning rate (α), or its starting value when decaying.
    pub alpha0: f32,
    /// Discount rate (γ), or its starting value when decaying.
    pub gamma0: f32,
    /// Exploration rate (ε), or its starting value when decaying.
    pub epsilon0: f32,
    pub decay_rate: f32,
    /// Trials over which γ anneals down to its floor.
    pub max_trials: u64,
    /// Seed for the exploration RNG; `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// Rewards handed to the learner after each of its transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardMap {
    pub win: f32,
    pub loss: f32,
    pub draw: f32,
    /// Reward for a move that leaves the game in progress.
    pub step: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub games: usize,
    pub learner_mark: Mark,
    pub progress_every: usize,
    /// Give the learner a terminal update when the opponent ends the game.
    pub credit_opponent_terminal: bool,
    pub archive_dir: PathBuf,
}

/// Top-level configuration, loadable from TOML.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub learner: LearnerConfig,
    pub rewards: RewardMap,
    pub arena: ArenaConfig,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            rate_mode: RateMode::Constant,
            alpha0: 0.4,
            gamma0: 0.9,
            epsilon0: 0.5,
            decay_rate: 0.001,
            max_trials: 10_000,
            seed: None,
        }
    }
}

impl LearnerConfig {
    pub fn decaying() -> Self {
        LearnerConfig {
            rate_mode: RateMode::Decaying,
            alpha0: 0.9,
            gamma0: 0.95,
            epsilon0: 1.0,
            decay_rate: 0.001,
            max_trials: 10_000,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha0 > 0.0 && self.alpha0 <= 1.0) {
            return Err(ConfigError::Validation("learner.alpha0 must be in (0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.gamma0) {
            return Err(ConfigError::Validation("learner.gamma0 must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.epsilon0) {
            return Err(ConfigError::Validation("learner.epsilon0 must be in [0, 1]".into()));
        }
        if self.decay_rate < 0.0 || !self.decay_rate.is_finite() {
            return Err(ConfigError::Validation(
                "learner.decay_rate must be a finite value >= 0".into(),
            ));
        }
        if self.rate_mode == RateMode::Decaying && self.max_trials == 0 {
            return Err(ConfigError::Validation(
                "learner.max_trials must be > 0 with decaying rates".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RewardMap {
    fn default() -> Self {
        RewardMap {
            win: 1.0,
            loss: 0.0,
            draw: 0.4,
            step: 0.0,
        }
    }
}

impl RewardMap {
    /// Losses cost as much as wins pay.
    pub fn symmetric() -> Self {
        RewardMap {
            win: 1.0,
            loss: -1.0,
            draw: 0.5,
            step: 0.0,
        }
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            games: NUM_GAMES,
            learner_mark: Mark::Cross,
            progress_every: PROGRESS_EVERY,
            credit_opponent_terminal: true,
            archive_dir: PathBuf::from("./q_table_archive/"),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.learner.validate()?;
        if self.arena.games == 0 {
            return Err(ConfigError::Validation("arena.games must be > 0".into()));
        }
        if self.arena.progress_every == 0 {
            return Err(ConfigError::Validation("arena.progress_every must be > 0".into()));
        }
        let rewards = [self.rewards.win, self.rewards.loss, self.rewards.draw, self.rewards.step];
        if rewards.iter().any(|r| !r.is_finite()) {
            return Err(ConfigError::Validation("rewards must be finite".into()));
        }
        Ok(())
    }
}
