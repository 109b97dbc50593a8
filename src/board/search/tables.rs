//! Move-ordering heuristic tables: killers, history, counter moves, and the
//! continuation/capture history used to score quiet and tactical moves.

use super::super::{Move, Piece, EMPTY_MOVE, MAX_PLY};

/// Killer moves: up to 3 quiet moves per ply that caused a beta cutoff.
/// Tried early in sibling nodes at the same ply, since a refutation at one
/// node is often a refutation at a sibling with the same position shape.
pub struct KillerTable {
    slots: Box<[[Move; 3]; MAX_PLY]>,
}

impl KillerTable {
    #[must_use]
    pub fn new() -> Self {
        KillerTable {
            slots: Box::new([[EMPTY_MOVE; 3]; MAX_PLY]),
        }
    }

    #[must_use]
    pub fn primary(&self, ply: usize) -> Move {
        self.slots.get(ply).map_or(EMPTY_MOVE, |k| k[0])
    }

    #[must_use]
    pub fn secondary(&self, ply: usize) -> Move {
        self.slots.get(ply).map_or(EMPTY_MOVE, |k| k[1])
    }

    #[must_use]
    pub fn tertiary(&self, ply: usize) -> Move {
        self.slots.get(ply).map_or(EMPTY_MOVE, |k| k[2])
    }

    pub fn update(&mut self, ply: usize, mv: Move) {
        let Some(killers) = self.slots.get_mut(ply) else {
            return;
        };
        if killers[0] == mv {
            return;
        }
        killers[2] = killers[1];
        killers[1] = killers[0];
        killers[0] = mv;
    }

    pub fn reset(&mut self) {
        for killers in self.slots.iter_mut() {
            *killers = [EMPTY_MOVE; 3];
        }
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Butterfly history table indexed by from/to square, tracking how often a
/// quiet move has caused a beta cutoff.
pub struct HistoryTable {
    scores: Box<[i32; 4096]>,
}

impl HistoryTable {
    #[must_use]
    pub fn new() -> Self {
        HistoryTable {
            scores: Box::new([0; 4096]),
        }
    }

    fn index(mv: &Move) -> usize {
        mv.from().index() * 64 + mv.to().index()
    }

    #[must_use]
    pub fn score(&self, mv: &Move) -> i32 {
        self.scores[Self::index(mv)]
    }

    /// Reward a move that caused a beta cutoff. The trailing `_ply` argument
    /// is reserved for ply-scaled bonuses and currently unused.
    pub fn update(&mut self, mv: &Move, depth: u32, _ply: usize) {
        let idx = Self::index(mv);
        let bonus = (depth * depth) as i32;
        self.scores[idx] = self.scores[idx].saturating_add(bonus);
    }

    /// Penalize a quiet move that was tried but did not cause the cutoff.
    pub fn penalize(&mut self, mv: &Move, depth: u32) {
        let idx = Self::index(mv);
        let malus = (depth * depth) as i32;
        self.scores[idx] = self.scores[idx].saturating_sub(malus);
    }

    pub fn decay(&mut self) {
        for score in self.scores.iter_mut() {
            *score >>= 2;
        }
    }

    pub fn reset(&mut self) {
        self.scores = Box::new([0; 4096]);
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter-move table: the quiet reply that most often refutes a given
/// opponent move.
pub struct CounterMoveTable {
    table: Box<[[Move; 64]; 64]>,
}

impl CounterMoveTable {
    #[must_use]
    pub fn new() -> Self {
        CounterMoveTable {
            table: Box::new([[EMPTY_MOVE; 64]; 64]),
        }
    }

    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> Move {
        self.table
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(EMPTY_MOVE)
    }

    pub fn set(&mut self, from: usize, to: usize, mv: Move) {
        if let Some(slot) = self.table.get_mut(from).and_then(|row| row.get_mut(to)) {
            *slot = mv;
        }
    }

    pub fn reset(&mut self) {
        for row in self.table.iter_mut() {
            *row = [EMPTY_MOVE; 64];
        }
    }
}

impl Default for CounterMoveTable {
    fn default() -> Self {
        Self::new()
    }
}

const CONT_HIST_LEN: usize = 6 * 64 * 64 * 64;

/// Continuation history: scores a quiet move by how well it has followed a
/// given (piece, destination) pair in the past, i.e. "what works well after
/// the opponent's last move landed here".
pub struct ContinuationHistory {
    table: Box<[i32]>,
}

impl ContinuationHistory {
    #[must_use]
    pub fn new() -> Self {
        ContinuationHistory {
            table: vec![0i32; CONT_HIST_LEN].into_boxed_slice(),
        }
    }

    fn index(piece: Piece, prev_to: usize, mv: &Move) -> usize {
        let cur_from = mv.from().index();
        let cur_to = mv.to().index();
        ((piece.index() * 64 + prev_to) * 64 + cur_from) * 64 + cur_to
    }

    #[must_use]
    pub fn score(&self, piece: Piece, prev_to: usize, mv: &Move) -> i32 {
        self.table[Self::index(piece, prev_to, mv)]
    }

    pub fn update(&mut self, piece: Piece, prev_to: usize, mv: &Move, depth: u32) {
        let idx = Self::index(piece, prev_to, mv);
        let bonus = (depth * depth) as i32;
        self.table[idx] = self.table[idx].saturating_add(bonus);
    }

    pub fn decay(&mut self) {
        for score in self.table.iter_mut() {
            *score >>= 2;
        }
    }

    pub fn reset(&mut self) {
        for score in self.table.iter_mut() {
            *score = 0;
        }
    }
}

impl Default for ContinuationHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture history: scores a capture by (attacker, victim) piece pair,
/// independent of the squares involved.
pub struct CaptureHistory {
    table: [[i32; 6]; 6],
}

impl CaptureHistory {
    #[must_use]
    pub fn new() -> Self {
        CaptureHistory { table: [[0; 6]; 6] }
    }

    #[must_use]
    pub fn score(&self, attacker: Piece, victim: Piece) -> i32 {
        self.table[attacker.index()][victim.index()]
    }

    pub fn update(&mut self, attacker: Piece, victim: Piece, depth: u32) {
        let bonus = (depth * depth) as i32;
        let entry = &mut self.table[attacker.index()][victim.index()];
        *entry = entry.saturating_add(bonus);
    }

    pub fn decay(&mut self) {
        for row in self.table.iter_mut() {
            for score in row.iter_mut() {
                *score >>= 2;
            }
        }
    }

    pub fn reset(&mut self) {
        self.table = [[0; 6]; 6];
    }
}

impl Default for CaptureHistory {
    fn default() -> Self {
        Self::new()
    }
}
