use crate::board::{Board, Mark, Move, Outcome, StateKey};
use crate::config::{AppConfig, RewardMap};
use crate::error::GameError;
use crate::learner::QLearner;
use crate::players::{LearnerPlayer, MinimaxPlayer, Player, Transition};
use crate::q_table::QTable;
use crate::stats::TrainingReport;
use log::{debug, info};
use std::mem;

pub mod board;
pub mod config;
pub mod error;
pub mod learner;
pub mod minimax;
pub mod players;
pub mod q_table;
pub mod stats;

/// One completed turn, as seen by whoever renders the game.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub player: String,
    pub mark: Mark,
    pub mv: Move,
    pub outcome: Outcome,
}

/// Drives games between two players. X always moves first.
///
/// Each [`Game::step`] is one whole turn: the move is chosen, applied, the
/// outcome recomputed and the mover's feedback delivered before it returns.
/// A finished game stays finished until [`Game::reset`].
pub struct Game {
    board: Board,
    current_player: Box<dyn Player>,
    other_player: Box<dyn Player>,
    rewards: RewardMap,
    credit_opponent_terminal: bool,
    // Last (state, move) of each side in the running game, X first.
    last_moves: [Option<(StateKey, Move)>; 2],
}

fn side(mark: Mark) -> usize {
    match mark {
        Mark::Cross => 0,
        Mark::Nought => 1,
    }
}

pub fn new_game() -> Board {
    Board::new()
}

impl Game {
    /// `player2` takes the mark `player1` does not have.
    pub fn new(player1: Box<dyn Player>, mut player2: Box<dyn Player>, rewards: RewardMap) -> Self {
        player2.set_mark(player1.get_mark().other());
        let (current_player, other_player) = if player1.get_mark() == Mark::Cross {
            (player1, player2)
        } else {
            (player2, player1)
        };
        Game {
            board: Board::new(),
            current_player,
            other_player,
            rewards,
            credit_opponent_terminal: true,
            last_moves: [None, None],
        }
    }

    /// Whether the learner is told about losses and draws caused by the
    /// opponent's final move. On by default.
    pub fn with_opponent_terminal_credit(mut self, enabled: bool) -> Self {
        self.credit_opponent_terminal = enabled;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }

    pub fn current_player(&self) -> &dyn Player {
        self.current_player.as_ref()
    }

    pub fn player(&self, mark: Mark) -> &dyn Player {
        if self.current_player.get_mark() == mark {
            self.current_player.as_ref()
        } else {
            self.other_player.as_ref()
        }
    }

    pub fn swap_players(&mut self) {
        mem::swap(&mut self.current_player, &mut self.other_player);
    }

    /// Clears the board and hands the first move back to X.
    pub fn reset(&mut self) {
        self.board.reset();
        self.last_moves = [None, None];
        if self.current_player.get_mark() != Mark::Cross {
            self.swap_players();
        }
    }

    fn reward_for(&self, mark: Mark, outcome: Outcome) -> f32 {
        match outcome {
            Outcome::InProgress => self.rewards.step,
            Outcome::Draw => self.rewards.draw,
            Outcome::Win(winner) if winner == mark => self.rewards.win,
            Outcome::Win(_) => self.rewards.loss,
        }
    }

    /// Plays one turn of the current player. An illegal move leaves the board
    /// and the turn unchanged.
    pub fn step(&mut self) -> Result<Turn, GameError> {
        if self.board.outcome().is_over() {
            return Err(GameError::GameOver);
        }
        let mark = self.current_player.get_mark();
        let state = self.board.state_key();
        let mv = self.current_player.choose_move(&self.board)?;
        self.board.apply_move(mv, mark)?;
        let outcome = self.board.outcome();
        let next_state = self.board.state_key();
        let next_legal_moves = if outcome.is_over() {
            vec![]
        } else {
            self.board.legal_moves()
        };
        let transition = Transition {
            state,
            action: mv,
            reward: self.reward_for(mark, outcome),
            next_state,
            next_legal_moves,
        };
        self.current_player.observe(&transition);
        self.last_moves[side(mark)] = Some((state, mv));

        if outcome.is_over() && self.credit_opponent_terminal {
            let opponent = mark.other();
            if let Some((state, action)) = self.last_moves[side(opponent)] {
                let transition = Transition {
                    state,
                    action,
                    reward: self.reward_for(opponent, outcome),
                    next_state,
                    next_legal_moves: vec![],
                };
                self.other_player.observe(&transition);
            }
        }

        let turn = Turn {
            player: self.current_player.get_name().to_owned(),
            mark,
            mv,
            outcome,
        };
        debug!("{} ({}) played {} -> {}", turn.player, mark, mv, next_state);
        if !outcome.is_over() {
            self.swap_players();
        }
        Ok(turn)
    }

    /// Plays the running game to its end.
    pub fn play(&mut self) -> Result<Outcome, GameError> {
        loop {
            let turn = self.step()?;
            if turn.outcome.is_over() {
                return Ok(turn.outcome);
            }
        }
    }

    /// Plays `games` fresh games, logging the tally every `progress_every`
    /// games.
    pub fn run_batch(&mut self, games: usize, progress_every: usize) -> Result<TrainingReport, GameError> {
        let mut report = TrainingReport::default();
        for episode in 1..=games {
            self.reset();
            let outcome = self.play()?;
            report.record(outcome);
            if progress_every > 0 && episode % progress_every == 0 {
                info!("episode {episode}/{games}: {}", report.tally);
            }
        }
        Ok(report)
    }
}

/// Trains a fresh learner against the minimax player for the configured
/// number of games. Returns the tally and the learned table.
pub fn train_rl_agent_with_minimax(config: &AppConfig) -> Result<(TrainingReport, QTable), GameError> {
    train_from_table(config, QTable::new())
}

/// Same as [`train_rl_agent_with_minimax`], starting from an existing table.
pub fn train_from_table(config: &AppConfig, table: QTable) -> Result<(TrainingReport, QTable), GameError> {
    let learner = QLearner::with_table(config.learner.clone(), table);
    let mut rl_player = Box::new(LearnerPlayer::new("Q AI", learner));
    rl_player.set_mark(config.arena.learner_mark);
    let minimax = Box::new(MinimaxPlayer::new("Minimax AI"));
    let mut game = Game::new(rl_player, minimax, config.rewards.clone())
        .with_opponent_terminal_credit(config.arena.credit_opponent_terminal);
    info!(
        "training {} games, learner plays {} with {:?} rates",
        config.arena.games, config.arena.learner_mark, config.learner.rate_mode
    );
    let report = game.run_batch(config.arena.games, config.arena.progress_every)?;
    let table = game
        .player(config.arena.learner_mark)
        .q_table()
        .cloned()
        .unwrap_or_default();
    info!("finished: {}, {} state-action pairs learned", report.tally, table.pairs());
    Ok((report, table))
}

/// Minimax against itself from the empty board. Returns every turn played.
pub fn minimax_self_play() -> Result<Vec<Turn>, GameError> {
    let mut player1 = Box::new(MinimaxPlayer::new("Minimax X"));
    player1.set_mark(Mark::Cross);
    let player2 = Box::new(MinimaxPlayer::new("Minimax O"));
    let mut game = Game::new(player1, player2, RewardMap::default());
    let mut turns = vec![];
    loop {
        let turn = game.step()?;
        let over = turn.outcome.is_over();
        turns.push(turn);
        if over {
            return Ok(turns);
        }
    }
}
