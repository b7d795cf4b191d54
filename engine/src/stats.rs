use crate::board::{Mark, Outcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Running win/draw tally across completed games.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub cross_wins: usize,
    pub nought_wins: usize,
    pub draws: usize,
    pub total_games: usize,
}

/// Tally rates after a given number of games.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub games: usize,
    pub cross_win_rate: f64,
    pub nought_win_rate: f64,
    pub draw_rate: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub tally: Tally,
    pub history: Vec<RatePoint>,
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

impl Tally {
    /// Counts a finished game. Returns false, and counts nothing, for a game
    /// still in progress.
    pub fn record(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::InProgress => return false,
            Outcome::Win(Mark::Cross) => self.cross_wins += 1,
            Outcome::Win(Mark::Nought) => self.nought_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.total_games += 1;
        true
    }

    pub fn wins(&self, mark: Mark) -> usize {
        match mark {
            Mark::Cross => self.cross_wins,
            Mark::Nought => self.nought_wins,
        }
    }

    pub fn wins_by_side(&self) -> [(Mark, usize); 2] {
        [(Mark::Cross, self.cross_wins), (Mark::Nought, self.nought_wins)]
    }

    /// Wins of `mark` per win of its opponent; `None` while the opponent has
    /// not won.
    pub fn win_loss_ratio(&self, mark: Mark) -> Option<f64> {
        ratio(self.wins(mark), self.wins(mark.other()))
    }

    /// Draws per loss of `mark`; `None` while `mark` has not lost.
    pub fn draw_loss_ratio(&self, mark: Mark) -> Option<f64> {
        ratio(self.draws, self.wins(mark.other()))
    }

    pub fn win_rate(&self, mark: Mark) -> Option<f64> {
        ratio(self.wins(mark), self.total_games)
    }

    pub fn draw_rate(&self) -> Option<f64> {
        ratio(self.draws, self.total_games)
    }

    pub fn rate_point(&self) -> RatePoint {
        RatePoint {
            games: self.total_games,
            cross_win_rate: self.win_rate(Mark::Cross).unwrap_or(0.0),
            nought_win_rate: self.win_rate(Mark::Nought).unwrap_or(0.0),
            draw_rate: self.draw_rate().unwrap_or(0.0),
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "X wins: {} | O wins: {} | Draws: {} | Total: {}",
            self.cross_wins, self.nought_wins, self.draws, self.total_games
        )
    }
}

impl TrainingReport {
    pub fn record(&mut self, outcome: Outcome) {
        if self.tally.record(outcome) {
            self.history.push(self.tally.rate_point());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_outcome() {
        let mut tally = Tally::default();
        assert!(tally.record(Outcome::Win(Mark::Cross)));
        assert!(tally.record(Outcome::Draw));
        assert!(tally.record(Outcome::Draw));
        assert!(tally.record(Outcome::Win(Mark::Nought)));
        assert!(!tally.record(Outcome::InProgress));
        assert_eq!(tally.wins(Mark::Cross), 1);
        assert_eq!(tally.wins(Mark::Nought), 1);
        assert_eq!(tally.draws, 2);
        assert_eq!(tally.total_games, 4);
        assert_eq!(tally.to_string(), "X wins: 1 | O wins: 1 | Draws: 2 | Total: 4");
    }

    #[test]
    fn ratios_guard_zero_denominators() {
        let mut tally = Tally::default();
        assert_eq!(tally.draw_rate(), None);
        tally.record(Outcome::Draw);
        tally.record(Outcome::Win(Mark::Cross));
        assert_eq!(tally.win_loss_ratio(Mark::Cross), None);
        assert_eq!(tally.draw_loss_ratio(Mark::Cross), None);
        assert_eq!(tally.win_loss_ratio(Mark::Nought), Some(0.0));
        assert_eq!(tally.draw_loss_ratio(Mark::Nought), Some(1.0));
        assert_eq!(tally.draw_rate(), Some(0.5));
    }

    #[test]
    fn report_tracks_history() {
        let mut report = TrainingReport::default();
        report.record(Outcome::Draw);
        report.record(Outcome::InProgress);
        report.record(Outcome::Win(Mark::Nought));
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.history[0].draw_rate, 1.0);
        assert_eq!(report.history[1].draw_rate, 0.5);
        assert_eq!(report.history[1].nought_win_rate, 0.5);
    }
}
