use crate::models::Turn;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_SIZE: usize = 6;
pub const MIN_HISTORY_SIZE: usize = 1;
pub const MAX_HISTORY_SIZE: usize = 10;

/// Fixed-capacity conversation log. Once full, each append evicts the oldest turn.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl HistoryBuffer {
    /// Range checking of user-supplied sizes happens during session setup;
    /// a zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_HISTORY_SIZE);
        Self {
            capacity,
            turns: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, turn: Turn) {
        if self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Copy of the stored turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
