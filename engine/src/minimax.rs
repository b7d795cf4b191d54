//! Exhaustive minimax over the full game tree.
//!
//! Every line of play is followed to the end: a win for the optimizing mark
//! scores +1, a loss -1, a draw 0. The board is small enough that no pruning,
//! depth limit or transposition table is needed.
//!
//! Tie-break: among moves with the same score the search prefers the quickest
//! win (or the slowest loss), then the lowest cell index. The score itself is
//! never discounted by depth.

use crate::board::{Board, Mark, Move, Outcome};
use crate::error::DecisionError;
use std::cmp::Reverse;

pub const WIN: i32 = 1;
pub const DRAW: i32 = 0;
pub const LOSS: i32 = -1;

/// Longer than any game, so `HORIZON - depth` stays positive for every win.
const HORIZON: i32 = 10;

/// Optimal move for `mark`, or `None` when the board has no empty cell.
/// The caller's board is never modified.
pub fn best_move(board: &Board, mark: Mark) -> Option<Move> {
    move_ranks(board, mark)
        .into_iter()
        .min_by_key(|&(_, rank)| Reverse(rank))
        .map(|(mv, _)| mv)
}

/// Same as [`best_move`], reporting a full board as an error.
pub fn search_move(board: &Board, mark: Mark) -> Result<Move, DecisionError> {
    best_move(board, mark).ok_or(DecisionError::EmptyLegalMoveSet)
}

/// Minimax score of every legal move for `mark`, in ascending move order.
pub fn move_scores(board: &Board, mark: Mark) -> Vec<(Move, i32)> {
    move_ranks(board, mark)
        .into_iter()
        .map(|(mv, rank)| (mv, rank.signum()))
        .collect()
}

/// Minimax score of the position for `mark` when `to_move` plays next.
pub fn position_score(board: &Board, mark: Mark, to_move: Mark) -> i32 {
    let mut scratch = board.clone();
    search(&mut scratch, mark, to_move, 0).signum()
}

fn move_ranks(board: &Board, mark: Mark) -> Vec<(Move, i32)> {
    let mut scratch = board.clone();
    scratch
        .legal_moves()
        .into_iter()
        .filter_map(|mv| {
            scratch.apply_move(mv, mark).ok()?;
            let rank = search(&mut scratch, mark, mark.other(), 1);
            scratch.undo_move(mv);
            Some((mv, rank))
        })
        .collect()
}

/// Depth-aware rank: `HORIZON - depth` for a win, `depth - HORIZON` for a
/// loss, 0 for a draw. Its sign is the plain minimax score.
fn search(board: &mut Board, maximizer: Mark, to_move: Mark, depth: i32) -> i32 {
    match board.outcome() {
        Outcome::Win(mark) if mark == maximizer => HORIZON - depth,
        Outcome::Win(_) => depth - HORIZON,
        Outcome::Draw => 0,
        Outcome::InProgress => {
            let ranks = board.legal_moves().into_iter().filter_map(|mv| {
                board.apply_move(mv, to_move).ok()?;
                let rank = search(board, maximizer, to_move.other(), depth + 1);
                board.undo_move(mv);
                Some(rank)
            });
            let best = if to_move == maximizer {
                ranks.max()
            } else {
                ranks.min()
            };
            best.unwrap_or(0)
        }
    }
}
