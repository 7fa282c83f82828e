//! Per-card undo history.
//!
//! Each committed frame maps card identity to a serialized snapshot. Frames
//! hold strings only, never cards, so undoing a deletion rebuilds the card
//! with its old identity.

use std::collections::BTreeMap;
use uuid::Uuid;

use super::board::Board;
use super::card::{Card, CardId};
use super::record::CardRecord;

/// Snapshot of one card inside a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoState {
    pub board: Uuid,
    pub card: CardId,
    pub payload: String,
    pub creation: bool,
    pub deletion: bool,
}

impl UndoState {
    fn plain(&self) -> bool {
        !self.creation && !self.deletion
    }

    fn record(&self) -> Option<CardRecord> {
        match CardRecord::from_json(&self.payload) {
            Ok(rec) => Some(rec),
            Err(e) => {
                log::error!("Undo state for card {} is unreadable: {}", self.card, e);
                None
            }
        }
    }
}

/// One atomic user action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoFrame {
    states: BTreeMap<CardId, UndoState>,
}

impl UndoFrame {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn get(&self, card: CardId) -> Option<&UndoState> {
        self.states.get(&card)
    }

    pub fn states(&self) -> impl Iterator<Item = &UndoState> {
        self.states.values()
    }
}

#[derive(Debug, Clone)]
pub struct UndoHistory {
    frames: Vec<UndoFrame>,
    current: UndoFrame,
    index: usize,
    /// Frames below this index are the loaded baseline and cannot be undone.
    base: usize,
    enabled: bool,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Back,
    Forward,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            current: UndoFrame::default(),
            index: 0,
            base: 0,
            enabled: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, i: usize) -> Option<&UndoFrame> {
        self.frames.get(i)
    }

    pub fn current(&self) -> &UndoFrame {
        &self.current
    }

    pub fn can_undo(&self) -> bool {
        self.index > self.base || !self.current.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.current = UndoFrame::default();
        self.index = 0;
        self.base = 0;
    }

    /// Start over with every card's present state as the baseline, so the
    /// first edit after a load has an earlier state to return to.
    pub fn seed(&mut self, boards: &[Board]) {
        self.clear();
        for board in boards {
            for card in &board.cards {
                self.capture(board.id, card);
            }
        }
        self.commit();
        self.base = self.index;
    }

    /// Record the card's present state.
    pub fn capture(&mut self, board: Uuid, card: &Card) {
        self.push(board, card, false, false);
    }

    pub fn capture_creation(&mut self, board: Uuid, card: &Card) {
        self.push(board, card, true, false);
    }

    pub fn capture_deletion(&mut self, board: Uuid, card: &Card) {
        self.push(board, card, false, true);
    }

    fn push(&mut self, board: Uuid, card: &Card, creation: bool, deletion: bool) {
        if !self.enabled {
            return;
        }
        let payload = match card.serialize().without_volatile().to_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("Could not serialize card {} for undo: {}", card.id, e);
                return;
            }
        };
        let state = UndoState {
            board,
            card: card.id,
            payload,
            creation,
            deletion,
        };

        if let Some(existing) = self.current.states.get_mut(&card.id) {
            if existing.creation && deletion {
                // Created and deleted within one frame: nothing happened.
                self.current.states.remove(&card.id);
                return;
            }
            if existing.payload == state.payload && state.plain() {
                return;
            }
            existing.payload = state.payload;
            existing.board = state.board;
            existing.creation |= creation;
            existing.deletion |= deletion;
            if existing.plain() && self.matches_committed(card.id) {
                // Edited back to where the frame started.
                self.current.states.remove(&card.id);
            }
            return;
        }

        if state.plain() {
            if let Some(at) = self.nearest_committed(card.id) {
                let earlier = &mut self.frames[at];
                if let Some(prev) = earlier.states.get_mut(&card.id) {
                    if prev.payload == state.payload && !prev.deletion {
                        prev.board = state.board;
                        return;
                    }
                }
            }
        }

        self.current.states.insert(card.id, state);
    }

    /// Whether the current state of `card` equals its nearest committed one.
    fn matches_committed(&self, card: CardId) -> bool {
        let Some(now) = self.current.get(card) else {
            return false;
        };
        self.nearest_committed(card)
            .and_then(|at| self.frames[at].get(card))
            .is_some_and(|prev| !prev.deletion && prev.payload == now.payload)
    }

    /// Index of the latest committed frame at or before `index` holding the card.
    fn nearest_committed(&self, card: CardId) -> Option<usize> {
        (0..self.index)
            .rev()
            .find(|i| self.frames[*i].states.contains_key(&card))
    }

    /// Flush the current frame. Returns true when a frame was appended.
    pub fn commit(&mut self) -> bool {
        if self.current.is_empty() {
            return false;
        }
        self.frames.truncate(self.index);
        self.frames.push(std::mem::take(&mut self.current));
        self.index = self.frames.len();
        true
    }

    pub fn undo(&mut self, boards: &mut [Board]) -> bool {
        self.commit();
        if self.index <= self.base {
            return false;
        }
        self.enabled = false;

        let undone = self.frames[self.index - 1].clone();
        for state in undone.states() {
            exit(state, Direction::Back, boards);
        }
        self.index -= 1;

        // Every card touched by the undone frame goes back to its nearest
        // earlier state, along with the rest of the new top frame.
        let mut restore: BTreeMap<CardId, UndoState> = BTreeMap::new();
        if self.index > 0 {
            for state in self.frames[self.index - 1].states() {
                restore.insert(state.card, state.clone());
            }
        }
        for state in undone.states().filter(|s| !s.creation) {
            if restore.contains_key(&state.card) {
                continue;
            }
            if let Some(at) = self.nearest_committed(state.card) {
                if let Some(earlier) = self.frames[at].get(state.card) {
                    restore.insert(state.card, earlier.clone());
                }
            }
        }
        for state in restore.values().filter(|s| !s.deletion) {
            apply(state, boards);
        }

        self.enabled = true;
        true
    }

    pub fn redo(&mut self, boards: &mut [Board]) -> bool {
        if self.index >= self.frames.len() {
            return false;
        }
        self.enabled = false;

        let frame = self.frames[self.index].clone();
        for state in frame.states() {
            exit(state, Direction::Forward, boards);
        }
        self.index += 1;
        for state in frame.states().filter(|s| !s.deletion) {
            apply(state, boards);
        }

        self.enabled = true;
        true
    }
}

fn board_for(boards: &mut [Board], id: Uuid) -> Option<&mut Board> {
    let found = boards.iter_mut().find(|b| b.id == id);
    if found.is_none() {
        log::warn!("Undo refers to missing board {}", id);
    }
    found
}

/// Signed creation / deletion handling for one state.
fn exit(state: &UndoState, direction: Direction, boards: &mut [Board]) {
    let restore = match (direction, state.creation, state.deletion) {
        (Direction::Forward, true, _) | (Direction::Back, _, true) => true,
        (Direction::Forward, _, true) | (Direction::Back, true, _) => false,
        _ => return,
    };
    let Some(board) = board_for(boards, state.board) else {
        return;
    };
    if restore {
        if let Some(rec) = state.record() {
            board.restore_card(state.card, &rec);
        }
    } else {
        board.remove_card_now(state.card);
    }
}

fn apply(state: &UndoState, boards: &mut [Board]) {
    let Some(rec) = state.record() else {
        return;
    };
    if let Some(board) = board_for(boards, state.board) {
        board.apply_record(state.card, &rec);
    }
}
