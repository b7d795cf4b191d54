use ttt_engine::board::{Board, Cell, Mark, Move, Outcome, StateKey};
use ttt_engine::config::{AppConfig, LearnerConfig, RewardMap};
use ttt_engine::learner::QLearner;
use ttt_engine::minimax::{best_move, move_scores, search_move, WIN};
use ttt_engine::players::{LearnerPlayer, MinimaxPlayer, Player};
use ttt_engine::Game;
use std::collections::HashSet;

/// Every position reachable in exactly `plies` moves from the empty board,
/// with the mark to move next.
fn positions_after(plies: usize) -> Vec<(Board, Mark)> {
    let mut frontier = vec![(Board::new(), Mark::Cross)];
    for _ in 0..plies {
        frontier = frontier
            .into_iter()
            .filter(|(board, _)| board.outcome() == Outcome::InProgress)
            .flat_map(|(board, mark)| {
                board.legal_moves().into_iter().map(move |mv| {
                    let mut next = board.clone();
                    next.apply_move(mv, mark).unwrap();
                    (next, mark.other())
                })
            })
            .collect();
    }
    frontier
}

#[test]
fn search_returns_a_legal_optimal_move() {
    for plies in [2, 3] {
        for (board, mark) in positions_after(plies) {
            if board.outcome().is_over() {
                continue;
            }
            let mv = search_move(&board, mark).unwrap();
            assert_eq!(board.cell(mv), Some(Cell::Empty), "{board}");
            let scores = move_scores(&board, mark);
            let chosen = scores.iter().find(|(m, _)| *m == mv).map(|(_, s)| *s).unwrap();
            assert!(scores.iter().all(|(_, s)| chosen >= *s), "{board}\n{scores:?}");
        }
    }
}

/// Every distinct non-terminal position reachable from the empty board, with
/// the mark to move next.
fn reachable_positions() -> Vec<(Board, Mark)> {
    let mut seen = HashSet::new();
    let mut stack = vec![Board::new()];
    let mut positions = vec![];
    while let Some(board) = stack.pop() {
        if !seen.insert(board.state_key()) || board.outcome().is_over() {
            continue;
        }
        let mark = if board.move_count() % 2 == 0 { Mark::Cross } else { Mark::Nought };
        for mv in board.legal_moves() {
            let mut next = board.clone();
            next.apply_move(mv, mark).unwrap();
            stack.push(next);
        }
        positions.push((board, mark));
    }
    positions
}

#[test]
#[ignore = "searches all 4520 positions; run with --ignored (fast in release)"]
fn search_is_legal_and_optimal_everywhere() {
    let positions = reachable_positions();
    assert_eq!(positions.len(), 4520);
    for (board, mark) in positions {
        let scores = move_scores(&board, mark);
        let mv = search_move(&board, mark).unwrap();
        assert_eq!(board.cell(mv), Some(Cell::Empty), "{board}");
        let chosen = scores.iter().find(|(m, _)| *m == mv).map(|(_, s)| *s).unwrap();
        assert!(scores.iter().all(|(_, s)| chosen >= *s), "{board}\n{scores:?}");
    }
}

#[test]
fn oracle_against_itself_always_draws() {
    let mut board = Board::new();
    let mut mark = Mark::Cross;
    while board.outcome() == Outcome::InProgress {
        let mv = best_move(&board, mark).unwrap();
        board.apply_move(mv, mark).unwrap();
        mark = mark.other();
    }
    assert_eq!(board.outcome(), Outcome::Draw);
}

#[test]
fn centre_opening_is_answered_in_a_corner() {
    let mut board = Board::new();
    board.apply_move(4, Mark::Cross).unwrap();
    let mv = search_move(&board, Mark::Nought).unwrap();
    assert!([0, 2, 6, 8].contains(&mv));
}

#[test]
fn nought_completes_the_middle_row() {
    let board: Board = "XX OO    ".parse().unwrap();
    assert_eq!(search_move(&board, Mark::Nought), Ok(5));
    assert!(move_scores(&board, Mark::Nought).contains(&(5, WIN)));
}

#[test]
fn apply_then_reset_restores_empty_board() {
    let mut board = Board::new();
    for (mv, mark) in [(4, Mark::Cross), (0, Mark::Nought), (8, Mark::Cross)] {
        board.apply_move(mv, mark).unwrap();
    }
    assert!(board.apply_move(0, Mark::Cross).is_err());
    board.reset();
    assert_eq!(board, Board::new());
    assert_eq!(board.state_key().to_string(), "---------");
}

/// Plays a random learner as X against minimax until it loses, then returns
/// the stored value of the learner's final move.
fn value_of_losing_move(rewards: RewardMap, credit: bool) -> f32 {
    let learner = QLearner::new(LearnerConfig {
        alpha0: 1.0,
        gamma0: 0.9,
        epsilon0: 1.0,
        seed: Some(9),
        ..LearnerConfig::default()
    });
    let mut rl_player = Box::new(LearnerPlayer::new("Q AI", learner));
    rl_player.set_mark(Mark::Cross);
    let mut game = Game::new(rl_player, Box::new(MinimaxPlayer::new("Minimax AI")), rewards)
        .with_opponent_terminal_credit(credit);
    for _ in 0..100 {
        game.reset();
        let mut last: Option<(StateKey, Move)> = None;
        loop {
            let before = game.board().state_key();
            let turn = game.step().unwrap();
            if turn.mark == Mark::Cross {
                last = Some((before, turn.mv));
            }
            if turn.outcome == Outcome::Win(Mark::Nought) {
                let (state, mv) = last.unwrap();
                let table = game.player(Mark::Cross).q_table().unwrap();
                return table.value(&state, mv);
            }
            if turn.outcome.is_over() {
                break;
            }
        }
    }
    panic!("a random player never lost to minimax in 100 games");
}

fn rewards_with_loss(loss: f32) -> RewardMap {
    RewardMap {
        loss,
        step: 0.3,
        ..RewardMap::default()
    }
}

fn assert_close(actual: f32, expected: f32) {
    assert!((actual - expected).abs() < 1e-6, "{actual} != {expected}");
}

#[test]
fn loss_reward_reaches_the_learner_in_both_polarities() {
    assert_close(value_of_losing_move(rewards_with_loss(-1.0), true), -1.0);
    assert_close(value_of_losing_move(rewards_with_loss(0.0), true), 0.0);
}

#[test]
fn without_terminal_credit_only_the_step_reward_is_stored() {
    // The state after an X move is never in X's table, so the target is the
    // step reward alone.
    assert_close(value_of_losing_move(rewards_with_loss(-1.0), false), 0.3);
    assert_close(value_of_losing_move(rewards_with_loss(0.0), false), 0.3);
}

#[test]
fn trained_learner_never_beats_minimax() {
    let mut config = AppConfig::default();
    config.learner = LearnerConfig::decaying().with_seed(17);
    config.rewards = RewardMap::symmetric();
    config.arena.games = 25;
    config.arena.learner_mark = Mark::Cross;
    let (report, table) = ttt_engine::train_rl_agent_with_minimax(&config).unwrap();
    assert_eq!(report.tally.total_games, 25);
    assert_eq!(report.tally.wins(Mark::Cross), 0);
    assert_eq!(
        report.tally.wins(Mark::Nought) + report.tally.draws,
        report.tally.total_games
    );
    // The learner only ever decides on positions where X is to move.
    assert!(table.keys().all(|key| Board::from(*key).move_count() % 2 == 0));
}
