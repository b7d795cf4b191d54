use crate::board::{Move, StateKey};
use chrono::offset::Local;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{prelude::*, BufReader, BufWriter};
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// Estimated values of the moves tried from one state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionValues {
    values: HashMap<Move, f32>,
}

/// State-action value table. Entries are created on first update and never
/// removed; an entry that was never written reads as 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    qtable: HashMap<StateKey, ActionValues>,
}

impl Deref for ActionValues {
    type Target = HashMap<Move, f32>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.values
    }
}

impl Deref for QTable {
    type Target = HashMap<StateKey, ActionValues>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            qtable: HashMap::with_capacity(6_000),
        }
    }

    pub fn value(&self, state: &StateKey, mv: Move) -> f32 {
        self.qtable
            .get(state)
            .and_then(|moves| moves.get(&mv))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest value among `moves` at `state`; 0 when `moves` is empty.
    pub fn max_value(&self, state: &StateKey, moves: &[Move]) -> f32 {
        moves
            .iter()
            .map(|&mv| self.value(state, mv))
            .max_by(|value1, value2| value1.total_cmp(value2))
            .unwrap_or(0.0)
    }

    /// Every move in `moves` that reaches the highest value at `state`.
    pub fn best_moves(&self, state: &StateKey, moves: &[Move]) -> Vec<Move> {
        moves
            .iter()
            .map(|&mv| (mv, self.value(state, mv)))
            .max_set_by(|(_, value1), (_, value2)| value1.total_cmp(value2))
            .into_iter()
            .map(|(mv, _)| mv)
            .collect()
    }

    /// Moves the stored value for `(state, mv)` a fraction `alpha` of the way
    /// towards `target`, creating a zero entry first if needed. Returns the new
    /// value.
    pub fn update(&mut self, state: StateKey, mv: Move, target: f32, alpha: f32) -> f32 {
        let value = self
            .qtable
            .entry(state)
            .or_default()
            .values
            .entry(mv)
            .or_insert(0.0);
        *value += alpha * (target - *value);
        *value
    }

    /// Number of stored state-action pairs.
    pub fn pairs(&self) -> usize {
        self.qtable.values().map(|moves| moves.len()).sum()
    }
}

/// Writes the table as dated `.json` and `.pickle` files into `dir`, returning
/// both paths.
pub fn q_table_to_disk(dir: &Path, q: &QTable) -> Result<(PathBuf, PathBuf), anyhow::Error> {
    let today = Local::now().date_naive();
    let filename_json = format!("qtable-{today}.json");
    let filename_pickle = format!("qtable-{today}.pickle");
    let q_json: PathBuf = [dir, Path::new(&filename_json)].iter().collect();
    let q_pickle: PathBuf = [dir, Path::new(&filename_pickle)].iter().collect();
    std::fs::create_dir_all(dir)?;
    let mut file_json = BufWriter::new(File::create(&q_json)?);
    serde_json::to_writer(&mut file_json, q)?;
    file_json.flush()?;
    let mut file_pickle = BufWriter::new(File::create(&q_pickle)?);
    serde_pickle::to_writer(&mut file_pickle, q, serde_pickle::SerOptions::new())?;
    file_pickle.flush()?;
    Ok((q_json, q_pickle))
}

pub fn q_table_from_disk_pickle(file: &Path) -> Result<QTable, anyhow::Error> {
    let mut reader = BufReader::new(File::open(file)?);
    let mut buf: Vec<u8> = vec![];
    reader.read_to_end(&mut buf)?;
    let decoded: QTable = serde_pickle::from_slice(&buf, serde_pickle::DeOptions::new())?;
    Ok(decoded)
}

pub fn q_table_from_disk_json(file: &Path) -> Result<QTable, anyhow::Error> {
    let reader = BufReader::new(File::open(file)?);
    let decoded: QTable = serde_json::from_reader(reader)?;
    Ok(decoded)
}

/// Loads a table saved by [`q_table_to_disk`], choosing the format from the
/// file extension.
pub fn q_table_from_disk(file: &Path) -> Result<QTable, anyhow::Error> {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("json") => q_table_from_disk_json(file),
        Some("pickle") => q_table_from_disk_pickle(file),
        _ => Err(anyhow::anyhow!(
            "unknown table format for {} (expected .json or .pickle)",
            file.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn key(s: &str) -> StateKey {
        s.parse().unwrap()
    }

    #[test]
    fn unseen_pairs_read_as_zero() {
        let q = QTable::new();
        assert_eq!(q.value(&key("---------"), 4), 0.0);
        assert_eq!(q.max_value(&key("---------"), &[0, 4, 8]), 0.0);
        assert_eq!(q.max_value(&key("---------"), &[]), 0.0);
        assert!(q.is_empty());
    }

    #[test]
    fn update_creates_entry_and_moves_towards_target() {
        let mut q = QTable::new();
        let state = Board::new().state_key();
        assert_eq!(q.update(state, 4, 1.0, 0.5), 0.5);
        assert_eq!(q.update(state, 4, 1.0, 0.5), 0.75);
        assert_eq!(q.value(&state, 4), 0.75);
        assert_eq!(q.pairs(), 1);
        q.update(state, 0, -1.0, 1.0);
        assert_eq!(q.pairs(), 2);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn best_moves_keeps_every_maximizer() {
        let mut q = QTable::new();
        let state = key("X--------");
        q.update(state, 4, 0.5, 1.0);
        q.update(state, 8, 0.5, 1.0);
        q.update(state, 2, -0.5, 1.0);
        assert_eq!(q.best_moves(&state, &[1, 2, 4, 8]), vec![4, 8]);
        // Unseen moves count as 0, which beats a negative estimate.
        assert_eq!(q.best_moves(&state, &[1, 2, 3]), vec![1, 3]);
        assert_eq!(q.max_value(&state, &[2, 3]), 0.0);
    }

    #[test]
    fn table_survives_disk_round_trip() {
        let mut q = QTable::new();
        q.update(key("XX-OO----"), 5, 1.0, 1.0);
        q.update(key("X--------"), 4, 0.25, 1.0);
        let dir = tempfile::tempdir().unwrap();
        let (json, pickle) = q_table_to_disk(dir.path(), &q).unwrap();
        assert_eq!(q_table_from_disk_json(&json).unwrap(), q);
        assert_eq!(q_table_from_disk_pickle(&pickle).unwrap(), q);
        assert_eq!(q_table_from_disk(&json).unwrap(), q);
        assert!(q_table_from_disk(Path::new("table.csv")).is_err());
    }
}
