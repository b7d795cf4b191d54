use crate::error::{MoveError, ParseError};
use itertools::Itertools;
use ndarray::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, ops::Deref, str::FromStr};

/// Index of a cell, row-major: cell `i` sits at row `i / 3`, column `i % 3`.
pub type Move = usize;

pub const CELLS: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "X")]
    Cross,
    #[serde(rename = "O")]
    Nought,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Mark),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Win(Mark),
    Draw,
}

/// Canonical, hashable copy of a board's cells. Two boards with the same
/// contents always produce the same key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateKey(pub [Cell; CELLS]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Array2<Cell>,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Mark::Nought,
            Self::Nought => Mark::Cross,
        }
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for Mark {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Mark::Cross),
            "O" | "o" | "0" => Ok(Mark::Nought),
            other => Err(ParseError::BadMark(other.to_owned())),
        }
    }
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Taken(mark) => Some(mark),
        }
    }
    pub fn as_char(self) -> char {
        self.mark().map_or('-', Mark::as_char)
    }
    fn from_char(c: char) -> Option<Self> {
        match c {
            '-' | ' ' | '.' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::Taken(Mark::Cross)),
            'O' | 'o' | '0' => Some(Cell::Taken(Mark::Nought)),
            _ => None,
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        Cell::Taken(mark)
    }
}

impl Outcome {
    pub fn is_over(self) -> bool {
        self != Outcome::InProgress
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|c| c.as_char()).collect::<String>())
    }
}

impl FromStr for StateKey {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let len = s.chars().count();
        if len != CELLS {
            return Err(ParseError::BadLength { len });
        }
        let mut cells = [Cell::Empty; CELLS];
        for (position, (slot, character)) in cells.iter_mut().zip(s.chars()).enumerate() {
            *slot = Cell::from_char(character).ok_or(ParseError::BadCell { character, position })?;
        }
        Ok(StateKey(cells))
    }
}

impl Serialize for StateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Deref for Board {
    type Target = Array2<Cell>;
    fn deref(&self) -> &Self::Target {
        &self.cells
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "* * * * *")?;
        for (a, b, c) in self.cells.iter().map(|c| c.as_char()).tuples::<(_, _, _)>() {
            writeln!(f, "* {} {} {} *", a, b, c)?;
        }
        write!(f, "* * * * *")
    }
}

impl FromStr for Board {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<StateKey>().map(Board::from)
    }
}

impl From<StateKey> for Board {
    fn from(key: StateKey) -> Self {
        Board {
            cells: Array2::from_shape_fn((3, 3), |(row, col)| key.0[row * 3 + col]),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            cells: Array::from_elem((3, 3), Cell::Empty),
        }
    }

    pub fn reset(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    pub fn cell(&self, index: Move) -> Option<Cell> {
        (index < CELLS).then(|| self.cells[[index / 3, index % 3]])
    }

    /// Indices of the empty cells, ascending. Empty when the board is full.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.cells.iter().positions(|&cell| cell == Cell::Empty).collect()
    }

    pub fn move_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell != Cell::Empty).count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&cell| cell != Cell::Empty)
    }

    pub fn apply_move(&mut self, index: Move, mark: Mark) -> Result<(), MoveError> {
        if index >= CELLS {
            return Err(MoveError::OutOfRange { index });
        }
        let cell = &mut self.cells[[index / 3, index % 3]];
        if *cell != Cell::Empty {
            return Err(MoveError::CellOccupied { index });
        }
        *cell = Cell::Taken(mark);
        Ok(())
    }

    /// Clears a cell set by `apply_move`. Only the search backtracking uses it;
    /// the public board is never un-played.
    pub(crate) fn undo_move(&mut self, index: Move) {
        self.cells[[index / 3, index % 3]] = Cell::Empty;
    }

    /// Owner of a complete line, checking all 3 rows, 3 columns and both
    /// diagonals regardless of which square was played last.
    pub fn winner(&self) -> Option<Mark> {
        let anti_diagonal = [self.cells[[0, 2]], self.cells[[1, 1]], self.cells[[2, 0]]];
        self.cells
            .rows()
            .into_iter()
            .chain(self.cells.columns())
            .chain(std::iter::once(self.cells.diag()))
            .find_map(|line| line_owner(line.iter().copied()))
            .or_else(|| line_owner(anti_diagonal.into_iter()))
    }

    pub fn is_draw(&self) -> bool {
        self.is_full() && self.winner().is_none()
    }

    pub fn outcome(&self) -> Outcome {
        match self.winner() {
            Some(mark) => Outcome::Win(mark),
            None if self.is_full() => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }

    pub fn state_key(&self) -> StateKey {
        let mut key = [Cell::Empty; CELLS];
        for (slot, cell) in key.iter_mut().zip(self.cells.iter()) {
            *slot = *cell;
        }
        StateKey(key)
    }
}

fn line_owner(mut line: impl Iterator<Item = Cell>) -> Option<Mark> {
    line.all_equal_value().ok()?.mark()
}
