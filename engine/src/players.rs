use crate::board::{Board, Mark, Move, StateKey};
use crate::error::DecisionError;
use crate::learner::QLearner;
use crate::minimax;
use crate::q_table::QTable;
use log::debug;

/// What a player learns from one of its own moves, or from the opponent's
/// move that ended the game. An empty `next_legal_moves` marks `next_state`
/// as terminal.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: StateKey,
    pub action: Move,
    pub reward: f32,
    pub next_state: StateKey,
    pub next_legal_moves: Vec<Move>,
}

pub trait Player {
    fn set_mark(&mut self, mark: Mark);
    fn get_mark(&self) -> Mark;
    fn get_name(&self) -> &str;
    fn choose_move(&mut self, board: &Board) -> Result<Move, DecisionError>;
    /// Feedback after a move. Only learning players act on it.
    fn observe(&mut self, _transition: &Transition) {}
    /// The value table of a learning player.
    fn q_table(&self) -> Option<&QTable> {
        None
    }
}

/// Plays the game-theoretically optimal move every turn.
#[derive(Debug)]
pub struct MinimaxPlayer {
    pub name: String,
    pub mark: Mark,
}

/// Plays and learns with a [`QLearner`].
#[derive(Debug)]
pub struct LearnerPlayer {
    pub name: String,
    pub mark: Mark,
    learner: QLearner,
}

impl MinimaxPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        MinimaxPlayer {
            name: name.into(),
            mark: Mark::Nought,
        }
    }
}

impl Player for MinimaxPlayer {
    fn set_mark(&mut self, mark: Mark) {
        self.mark = mark;
    }
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, board: &Board) -> Result<Move, DecisionError> {
        let mv = minimax::search_move(board, self.mark)?;
        debug!("{} ({}) searched {} -> {}", self.name, self.mark, board.state_key(), mv);
        Ok(mv)
    }
}

impl LearnerPlayer {
    pub fn new(name: impl Into<String>, learner: QLearner) -> Self {
        LearnerPlayer {
            name: name.into(),
            mark: Mark::Cross,
            learner,
        }
    }
    pub fn learner(&self) -> &QLearner {
        &self.learner
    }
    pub fn into_learner(self) -> QLearner {
        self.learner
    }
}

impl Player for LearnerPlayer {
    fn set_mark(&mut self, mark: Mark) {
        self.mark = mark;
    }
    fn get_mark(&self) -> Mark {
        self.mark
    }
    fn get_name(&self) -> &str {
        &self.name
    }
    fn choose_move(&mut self, board: &Board) -> Result<Move, DecisionError> {
        self.learner
            .choose_action(&board.state_key(), &board.legal_moves())
    }
    fn observe(&mut self, transition: &Transition) {
        self.learner.update(
            &transition.state,
            transition.action,
            transition.reward,
            &transition.next_state,
            &transition.next_legal_moves,
        );
    }
    fn q_table(&self) -> Option<&QTable> {
        Some(self.learner.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LearnerConfig;

    #[test]
    fn minimax_player_wins_when_it_can() {
        let mut player = MinimaxPlayer::new("minimax");
        player.set_mark(Mark::Nought);
        let board: Board = "XX-OO----".parse().unwrap();
        assert_eq!(player.choose_move(&board), Ok(5));
        assert!(player.q_table().is_none());
    }

    #[test]
    fn minimax_player_reports_full_board() {
        let mut player = MinimaxPlayer::new("minimax");
        let board: Board = "XOXXOOOXX".parse().unwrap();
        assert_eq!(player.choose_move(&board), Err(DecisionError::EmptyLegalMoveSet));
    }

    #[test]
    fn learner_player_learns_from_observations() {
        let learner = QLearner::new(LearnerConfig {
            alpha0: 1.0,
            epsilon0: 0.0,
            seed: Some(1),
            ..LearnerConfig::default()
        });
        let mut player = LearnerPlayer::new("RL", learner);
        let board: Board = "XX-OO----".parse().unwrap();
        let after: Board = "XXXOO----".parse().unwrap();
        player.observe(&Transition {
            state: board.state_key(),
            action: 2,
            reward: 1.0,
            next_state: after.state_key(),
            next_legal_moves: vec![],
        });
        assert_eq!(player.choose_move(&board), Ok(2));
        assert_eq!(player.q_table().map(QTable::pairs), Some(1));
        assert_eq!(player.learner().trials(), 1);
    }
}
