use std::io::{self, BufRead, Write};
use ttt_engine::board::{Board, Mark, Move};
use ttt_engine::error::DecisionError;
use ttt_engine::players::Player;

/// A player typing moves at the terminal as `row column` (each 1-3).
#[derive(Debug)]
pub struct HumanPlayer {
    pub name: String,
    pub mark: Mark,
}

impl HumanPlayer {
    pub fn new(name: String, mark: Mark) -> Self {
        HumanPlayer { name, mark }
    }
}

/// Parses `row column` (1-based, e.g. `2 3`) or a single cell number 1-9.
pub fn parse_move(input: &str) -> Option<Move> {
    let numbers: Vec<usize> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match numbers[..] {
        [cell] if (1..=9).contains(&cell) => Some(cell - 1),
        [row, col] if (1..=3).contains(&row) && (1..=3).contains(&col) => Some((row - 1) * 3 + col - 1),
        _ => None,
    }
}

/// Asks a yes/no question; anything but `y`/`yes` is no.
pub fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

impl Player for HumanPlayer {
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
        println!("{board}");
        let prompt = format!("{} ({}), your move as `row column` (1-3): ", self.name, self.mark);
        read_move(&mut io::stdin().lock(), &mut io::stdout(), &prompt, &board.legal_moves())
    }
}

/// Prompts until a legal move is read. A closed or failing terminal abandons
/// the game.
fn read_move(
    input: &mut impl BufRead,
    output: &mut impl Write,
    prompt: &str,
    legal: &[Move],
) -> Result<Move, DecisionError> {
    if legal.is_empty() {
        return Err(DecisionError::EmptyLegalMoveSet);
    }
    let mut line = String::new();
    loop {
        write!(output, "{prompt}")
            .and_then(|_| output.flush())
            .map_err(|_| DecisionError::Abandoned)?;
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) | Err(_) => return Err(DecisionError::Abandoned),
            Ok(_) => {}
        }
        let reply = match parse_move(&line) {
            Some(mv) if legal.contains(&mv) => return Ok(mv),
            Some(_) => "That square is taken, please choose another one.",
            None => "Unknown input, please try again (e.g. `2 2` for the centre).",
        };
        writeln!(output, "{reply}").map_err(|_| DecisionError::Abandoned)?;
    }
}
