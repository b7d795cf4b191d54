use crate::board::Move;

/// Errors raised when a move cannot be placed on the board.
/// The board is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("cell {index} is already occupied")]
    CellOccupied { index: Move },

    #[error("cell index {index} is outside the board (0-8)")]
    OutOfRange { index: Move },
}

/// Errors raised when a strategy is asked to decide on a finished position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("no legal moves to choose from")]
    EmptyLegalMoveSet,

    #[error("player abandoned the game")]
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("illegal move: {0}")]
    IllegalMove(#[from] MoveError),

    #[error("player could not decide: {0}")]
    Decision(#[from] DecisionError),

    #[error("the game is over, reset the board to play again")]
    GameOver,
}

/// Errors from parsing marks and boards written as text, e.g. `"XX-OO----"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected 9 cells, got {len}")]
    BadLength { len: usize },

    #[error("invalid cell character '{character}' at position {position}")]
    BadCell { character: char, position: usize },

    #[error("invalid mark '{0}' (expected 'X' or 'O')")]
    BadMark(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
