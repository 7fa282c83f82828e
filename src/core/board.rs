//! A page of cards.
//!
//! The board owns its cards and the grid index over them. Edits that change
//! a card go through the undo history; derived stack links are refreshed in
//! `resolve` once per frame.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use glam::Vec2;
use uuid::Uuid;

use super::card::{Card, CardId, CardIds};
use super::completion::{self, Completion};
use super::contents::{CardKind, Contents};
use super::geometry::{Rect, centroid, snap_point};
use super::grid::{Cell, GridIndex};
use super::record::CardRecord;
use super::stack;
use super::undo::UndoHistory;
use crate::error::PlanResult;
use crate::message::{Message, Notification};

/// Selection movement relative to the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStep {
    Up,
    Down,
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    /// Board order after `reorder`: y ascending, then x.
    pub cards: Vec<Card>,
    /// Kind used by "new card of the previous type".
    pub last_kind: CardKind,
    grid: GridIndex,
    cells: HashMap<CardId, Vec<Cell>>,
    /// Index of each card in `cards`, refreshed whenever `cards` is
    /// reordered or shrinks.
    slots: HashMap<CardId, usize>,
    pending_deletion: Vec<CardId>,
}

impl Board {
    pub fn new(name: impl Into<String>, grid_size: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cards: Vec::new(),
            last_kind: CardKind::Checkbox,
            grid: GridIndex::new(grid_size),
            cells: HashMap::new(),
            slots: HashMap::new(),
            pending_deletion: Vec::new(),
        }
    }

    pub fn grid_size(&self) -> f32 {
        self.grid.cell_size()
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn set_grid_size(&mut self, grid_size: f32) {
        self.grid = GridIndex::new(grid_size);
        self.reindex_grid();
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.index_of(id).map(|i| &self.cards[i])
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.index_of(id).map(|i| &mut self.cards[i])
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.index_of(id).is_some()
    }

    /// Position of a card in `cards`. Falls back to a scan when `cards` was
    /// rearranged from outside the board.
    pub fn index_of(&self, id: CardId) -> Option<usize> {
        match self.slots.get(&id) {
            Some(i) if self.cards.get(*i).is_some_and(|c| c.id == id) => Some(*i),
            _ => self.cards.iter().position(|c| c.id == id),
        }
    }

    fn refresh_slots(&mut self) {
        self.slots = self.cards.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
    }

    pub fn is_pending(&self, id: CardId) -> bool {
        self.pending_deletion.contains(&id)
    }

    fn register(&mut self, id: CardId) {
        self.unregister(id);
        if let Some(rect) = self.card(id).map(Card::rect) {
            let cells = self.grid.add(id, &rect);
            self.cells.insert(id, cells);
        }
    }

    fn unregister(&mut self, id: CardId) {
        if let Some(cells) = self.cells.remove(&id) {
            self.grid.remove(id, &cells);
        }
    }

    fn relocate(&mut self, id: CardId, position: Vec2) {
        if let Some(card) = self.card_mut(id) {
            card.move_to(position);
        }
        self.register(id);
    }

    fn capture(&self, history: &mut UndoHistory, id: CardId) {
        if let Some(card) = self.card(id) {
            history.capture(self.id, card);
        }
    }

    /// Add a card built elsewhere (load, undo restore).
    pub fn insert(&mut self, card: Card) {
        let id = card.id;
        self.slots.insert(id, self.cards.len());
        self.cards.push(card);
        self.register(id);
    }

    /// Create a card at `position`, snapped to the grid.
    ///
    /// With a selection, the card goes directly below the topmost selected
    /// card at its x and everything stacked below that card moves down to
    /// make room. Cards that cannot have neighbours always land at
    /// `position`.
    pub fn create_card(
        &mut self,
        ids: &mut CardIds,
        history: &mut UndoHistory,
        position: Vec2,
        kind: CardKind,
    ) -> CardId {
        let g = self.grid_size();
        let id = ids.allocate();
        let mut card = Card::new(id, kind, snap_point(position, g), g);

        let source = self
            .topmost_selected()
            .filter(|s| s.allows_neighbors() && kind.allows_neighbors())
            .map(|s| (s.id, s.position, s.size));
        if let Some((source_id, pos, size)) = source {
            card.move_to(Vec2::new(pos.x, pos.y + size.y));
            let push = Vec2::new(0.0, card.size.y);
            for below in self.chain_below(source_id) {
                if self.is_pending(below) {
                    continue;
                }
                if let Some(at) = self.card(below).map(|b| b.position) {
                    self.relocate(below, at + push);
                    self.capture(history, below);
                }
            }
        }

        self.deselect_all();
        card.selected = true;
        history.capture_creation(self.id, &card);
        log::debug!("Created {} card {} at {:?} on {}", kind, id, card.position, self.name);
        self.insert(card);
        self.last_kind = kind;
        id
    }

    pub fn delete_selected(&mut self, history: &mut UndoHistory) -> usize {
        let doomed = self.selected();
        self.delete_cards(history, &doomed)
    }

    /// Mark cards for deletion and pull each stack below them up by the
    /// deleted card's height. Cards leave the board in `handle_deletions`.
    pub fn delete_cards(&mut self, history: &mut UndoHistory, ids: &[CardId]) -> usize {
        let g = self.grid_size();
        let mut doomed: Vec<CardId> = ids
            .iter()
            .copied()
            .filter(|id| self.contains(*id) && !self.is_pending(*id))
            .collect();
        doomed.sort_by_key(|id| self.index_of(*id));
        doomed.dedup();

        // Deletion states are taken before anything moves so undo puts every
        // card back where it was.
        for id in &doomed {
            if let Some(card) = self.card_mut(*id) {
                card.receive(&Message::Delete(*id), g);
                card.selected = false;
            }
            self.pending_deletion.push(*id);
            if let Some(card) = self.card(*id) {
                history.capture_deletion(self.id, card);
            }
        }

        let chains: Vec<(f32, Vec<CardId>)> = doomed
            .iter()
            .filter_map(|id| {
                let card = self.card(*id).filter(|c| c.allows_neighbors())?;
                Some((card.size.y, self.chain_below(*id)))
            })
            .collect();
        for (height, chain) in chains {
            for below in chain {
                if self.is_pending(below) {
                    continue;
                }
                if let Some(at) = self.card(below).map(|b| b.position) {
                    self.relocate(below, at - Vec2::new(0.0, height));
                    self.capture(history, below);
                }
            }
        }

        doomed.len()
    }

    /// Drop every card marked for deletion. Returns the removed ids.
    ///
    /// Links of the remaining cards stop naming removed cards here, so they
    /// stay valid even if the following resolve fails.
    pub fn handle_deletions(&mut self) -> Vec<CardId> {
        let removed = std::mem::take(&mut self.pending_deletion);
        if removed.is_empty() {
            return removed;
        }
        for id in &removed {
            self.unregister(*id);
        }
        self.cards.retain(|c| !removed.contains(&c.id));
        for card in &mut self.cards {
            card.stack.forget(&removed);
        }
        self.reorder();
        log::debug!("Removed {} card(s) from {}", removed.len(), self.name);
        removed
    }

    /// Remove a card right away, skipping the stack collapse.
    pub fn remove_card_now(&mut self, id: CardId) {
        self.pending_deletion.retain(|p| *p != id);
        self.unregister(id);
        self.cards.retain(|c| c.id != id);
        for card in &mut self.cards {
            card.stack.forget(&[id]);
        }
        self.refresh_slots();
    }

    /// Bring a card back with its old identity.
    pub fn restore_card(&mut self, id: CardId, record: &CardRecord) {
        self.pending_deletion.retain(|p| *p != id);
        self.apply_record(id, record);
    }

    /// Load a record into the live card with this id, creating it when
    /// absent. Selection is left as it is.
    pub fn apply_record(&mut self, id: CardId, record: &CardRecord) {
        let g = self.grid_size();
        if let Some(card) = self.card_mut(id) {
            let selected = card.selected;
            card.deserialize(record, g);
            card.selected = selected;
            self.register(id);
        } else {
            let mut card = Card::from_record(id, record, g);
            card.selected = false;
            self.insert(card);
        }
    }

    pub fn reorder(&mut self) {
        self.cards.sort_by(|a, b| {
            a.position
                .y
                .total_cmp(&b.position.y)
                .then(a.position.x.total_cmp(&b.position.x))
        });
        self.refresh_slots();
    }

    pub fn reindex_grid(&mut self) {
        self.grid.clear();
        self.cells.clear();
        for card in &self.cards {
            let cells = self.grid.add(card.id, &card.rect());
            self.cells.insert(card.id, cells);
        }
    }

    /// Resolve phase for this board. On error the previous links stay.
    pub fn resolve(&mut self, index: usize) -> PlanResult<Vec<Message>> {
        self.handle_deletions();
        self.reorder();
        self.reindex_grid();

        let mut links = stack::resolve(&self.cards, &self.grid, index)?;
        let mut messages = Vec::new();
        for card in &mut self.cards {
            let Some(resolved) = links.remove(&card.id) else {
                continue;
            };
            if resolved.children != card.stack.children {
                messages.push(Message::ChildrenChanged(card.id));
            }
            if resolved.prefix != card.stack.prefix {
                messages.push(Message::NumberingChanged(card.id));
            }
            card.stack = resolved;
        }
        Ok(messages)
    }

    /// Advance running timers.
    pub fn tick(&mut self, dt: f64) {
        for card in &mut self.cards {
            if let Contents::Timer(timer) = &mut card.contents {
                timer.tick(dt);
            }
        }
    }

    /// Aggregate phase: fire elapsed timers, then refresh completion and
    /// completion times. Completion-time changes are captured so undo
    /// brings them back with the edit that caused them.
    pub fn aggregate(&mut self, now: NaiveDateTime, history: &mut UndoHistory) -> Vec<Notification> {
        let mut notifications = Vec::new();

        for id in completion::elapsed_timers(&self.cards) {
            let mut below = None;
            if let Some(card) = self.card_mut(id) {
                if let Contents::Timer(timer) = &mut card.contents {
                    log::info!("Timer {} elapsed", timer.name);
                    notifications.push(Notification::TimerElapsed {
                        card: id,
                        name: timer.name.clone(),
                    });
                    timer.reset();
                }
                below = card.stack.below;
            }
            if let Some(next) = below.and_then(|b| self.card_mut(b)) {
                if let Contents::Timer(timer) = &mut next.contents {
                    timer.reset();
                    timer.running = true;
                }
            }
        }

        let results: Vec<Completion> = {
            let cards = completion::lookup(&self.cards);
            self.cards
                .iter()
                .map(|c| completion::evaluate(c, &cards))
                .collect()
        };
        let board = self.id;
        for (card, result) in self.cards.iter_mut().zip(results) {
            card.completion = result;
            let changed = match (result.complete, card.completed) {
                (true, None) => {
                    card.completed = Some(now);
                    true
                }
                (false, Some(_)) => {
                    card.completed = None;
                    true
                }
                _ => false,
            };
            if changed {
                history.capture(board, card);
            }
        }

        notifications
    }

    /// Deliver a message to every card. Dropped cards are re-registered and
    /// captured after they snap.
    pub fn broadcast(&mut self, message: &Message, history: &mut UndoHistory) {
        let g = self.grid_size();
        for card in &mut self.cards {
            card.receive(message, g);
        }
        if let Message::Dropped(id) = message {
            if self.contains(*id) {
                self.register(*id);
                self.capture(history, *id);
            }
        }
    }

    // Selection

    pub fn selected(&self) -> Vec<CardId> {
        self.cards
            .iter()
            .filter(|c| c.selected && !self.is_pending(c.id))
            .map(|c| c.id)
            .collect()
    }

    fn topmost_selected(&self) -> Option<&Card> {
        self.cards
            .iter()
            .filter(|c| c.selected && !self.is_pending(c.id))
            .min_by(|a, b| {
                a.position
                    .y
                    .total_cmp(&b.position.y)
                    .then(a.position.x.total_cmp(&b.position.x))
            })
    }

    pub fn select_only(&mut self, id: CardId) {
        for card in &mut self.cards {
            card.selected = card.id == id;
        }
    }

    pub fn set_selected(&mut self, id: CardId, selected: bool) {
        if let Some(card) = self.card_mut(id) {
            card.selected = selected;
        }
    }

    pub fn select_all(&mut self) {
        for card in &mut self.cards {
            card.selected = true;
        }
    }

    pub fn deselect_all(&mut self) {
        for card in &mut self.cards {
            card.selected = false;
        }
    }

    /// Marquee selection. Returns the cards inside `rect`.
    pub fn select_in_rect(&mut self, rect: &Rect, additive: bool) -> Vec<CardId> {
        let hits: Vec<CardId> = self
            .grid
            .in_rect(rect)
            .into_iter()
            .filter(|id| {
                self.card(*id)
                    .is_some_and(|c| !self.is_pending(c.id) && rect.intersects(&c.rect()))
            })
            .collect();
        if !additive {
            self.deselect_all();
        }
        for id in &hits {
            self.set_selected(*id, true);
        }
        hits
    }

    /// Ids of the cards stacked below `id`, found from present positions
    /// through the grid, so cards placed earlier in this frame count.
    pub fn chain_below(&self, id: CardId) -> Vec<CardId> {
        let g = self.grid_size();
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(next) = self.neighbor_below(current, g) {
            if next == id || chain.contains(&next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    fn neighbor_below(&self, id: CardId, g: f32) -> Option<CardId> {
        let a = self.card(id).filter(|c| c.allows_neighbors())?;
        let probe = a.rect().translated(Vec2::new(0.0, g * stack::NEIGHBOR_TOLERANCE));
        self.grid
            .in_rect(&probe)
            .into_iter()
            .filter_map(|b| self.card(b))
            .filter(|b| b.id != a.id && b.allows_neighbors())
            .filter(|b| b.position.y > a.position.y && probe.intersects(&b.rect()))
            .min_by(|p, q| {
                p.position
                    .y
                    .total_cmp(&q.position.y)
                    .then(p.position.x.total_cmp(&q.position.x))
            })
            .map(|b| b.id)
    }

    /// Follow resolved links from `id` to the end of its stack.
    fn stack_end(&self, id: CardId, step: impl Fn(&Card) -> Option<CardId>) -> CardId {
        let mut current = id;
        for _ in 0..self.cards.len() {
            match self.card(current).and_then(&step) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Topmost card under a point.
    pub fn hit_test(&self, point: Vec2) -> Option<CardId> {
        self.grid
            .at(point.x, point.y)
            .iter()
            .filter_map(|id| self.card(*id))
            .filter(|c| !self.is_pending(c.id) && c.rect().contains(point))
            .max_by_key(|c| self.index_of(c.id))
            .map(|c| c.id)
    }

    /// The card a selection step from `id` lands on.
    pub fn navigate(&self, id: CardId, step: StackStep) -> Option<CardId> {
        let card = self.card(id)?;
        let target = match step {
            StackStep::Up => card.stack.above,
            StackStep::Down => card.stack.below,
            StackStep::Top => Some(self.stack_end(id, |c| c.stack.above)),
            StackStep::Bottom => Some(self.stack_end(id, |c| c.stack.below)),
            StackStep::Left | StackStep::Right => {
                let rect = card.rect();
                let from = rect.center();
                self.cards
                    .iter()
                    .filter(|c| c.id != id && !self.is_pending(c.id))
                    .filter(|c| c.position.y < rect.bottom() && c.rect().bottom() > rect.y)
                    .filter(|c| {
                        let dx = c.rect().center().x - from.x;
                        if step == StackStep::Left { dx < 0.0 } else { dx > 0.0 }
                    })
                    .min_by(|a, b| {
                        a.rect()
                            .center()
                            .distance_squared(from)
                            .total_cmp(&b.rect().center().distance_squared(from))
                    })
                    .map(|c| c.id)
            }
        };
        target.filter(|t| *t != id)
    }

    /// Move the selection one cell. A single card moving vertically inside a
    /// stack trades places with its neighbour instead.
    pub fn move_selected(&mut self, history: &mut UndoHistory, step: (i32, i32)) {
        let g = self.grid_size();
        let selected = self.selected();
        if selected.len() == 1 && step.0 == 0 && step.1 != 0 {
            let id = selected[0];
            let other = self.card(id).and_then(|c| {
                if step.1 < 0 { c.stack.above } else { c.stack.below }
            });
            if let Some(other) = other {
                if step.1 < 0 {
                    self.swap(history, other, id);
                } else {
                    self.swap(history, id, other);
                }
                return;
            }
        }

        let delta = Vec2::new(step.0 as f32 * g, step.1 as f32 * g);
        for id in selected {
            if let Some(at) = self.card(id).map(|c| c.position) {
                self.relocate(id, at + delta);
                self.capture(history, id);
            }
        }
    }

    fn swap(&mut self, history: &mut UndoHistory, upper: CardId, lower: CardId) {
        let (Some(u), Some(l)) = (self.card(upper), self.card(lower)) else {
            return;
        };
        let lower_at = Vec2::new(l.position.x, u.position.y);
        let upper_at = Vec2::new(u.position.x, u.position.y + l.size.y);
        self.relocate(lower, lower_at);
        self.relocate(upper, upper_at);
        self.capture(history, lower);
        self.capture(history, upper);
    }

    /// Shift the selection while dragging. Cards snap when dropped.
    pub fn drag_selected(&mut self, delta: Vec2) {
        for id in self.selected() {
            if let Some(at) = self.card(id).map(|c| c.position) {
                self.relocate(id, at + delta);
            }
        }
    }

    /// Apply an edit to every selected card and capture the result.
    pub fn edit_selected(
        &mut self,
        history: &mut UndoHistory,
        mut edit: impl FnMut(&mut Card, f32),
    ) -> usize {
        let ids = self.selected();
        for id in &ids {
            self.edit_card(history, *id, &mut edit);
        }
        ids.len()
    }

    pub fn edit_card(
        &mut self,
        history: &mut UndoHistory,
        id: CardId,
        edit: impl FnOnce(&mut Card, f32),
    ) -> bool {
        let g = self.grid_size();
        let Some(card) = self.card_mut(id) else {
            return false;
        };
        edit(card, g);
        self.register(id);
        self.capture(history, id);
        true
    }

    /// Clone records onto this board so their centroid lands on `at`,
    /// keeping relative offsets. The clones end up selected.
    pub fn paste_records(
        &mut self,
        ids: &mut CardIds,
        history: &mut UndoHistory,
        records: &[CardRecord],
        at: Vec2,
    ) -> Vec<CardId> {
        let Some(center) = centroid(records.iter().map(|r| Vec2::new(r.x, r.y))) else {
            return Vec::new();
        };
        let g = self.grid_size();
        let offset = at - center;

        self.deselect_all();
        let mut pasted = Vec::with_capacity(records.len());
        for record in records {
            let id = ids.allocate();
            let mut card = Card::from_record(id, record, g);
            card.move_to(snap_point(card.position + offset, g));
            card.selected = true;
            history.capture_creation(self.id, &card);
            self.insert(card);
            pasted.push(id);
        }
        pasted
    }

    /// Centroid of the cards' rectangles.
    pub fn focus_point(&self, ids: &[CardId]) -> Option<Vec2> {
        centroid(ids.iter().filter_map(|id| self.card(*id)).map(|c| c.rect().center()))
    }

    /// Cards whose description contains `query`, ignoring case.
    pub fn find(&self, query: &str) -> Vec<CardId> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.cards
            .iter()
            .filter(|c| c.description.to_lowercase().contains(&needle))
            .map(|c| c.id)
            .collect()
    }

    /// Check the per-frame properties that must hold after resolve.
    pub fn audit(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, card) in self.cards.iter().enumerate() {
            if let Some(b) = card.stack.below {
                if self.card(b).and_then(|o| o.stack.above) != Some(card.id) {
                    problems.push(format!("card {} below {} does not point back", b, card.id));
                }
            }
            if let Some(a) = card.stack.above {
                if self.card(a).and_then(|o| o.stack.below) != Some(card.id) {
                    problems.push(format!("card {} above {} does not point back", a, card.id));
                }
            }
            let alone = card.stack.above.is_none() && card.stack.below.is_none();
            if alone && !card.stack.prefix.is_empty() {
                problems.push(format!("card {} is alone but numbered", card.id));
            }

            let mut expected = self.grid.footprint(&card.rect());
            expected.sort();
            if self.grid.cells_of(card.id) != expected {
                problems.push(format!("card {} grid cells do not match its rectangle", card.id));
            }

            if let Some(next) = self.cards.get(i + 1) {
                let p = card.position;
                let q = next.position;
                if p.y > q.y || (p.y == q.y && p.x > q.x) {
                    problems.push(format!("cards {} and {} are out of order", card.id, next.id));
                }
            }

            if card.completion.complete != card.completed.is_some() {
                problems.push(format!("card {} completion time is stale", card.id));
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn board_with(spots: &[(f32, f32)]) -> (Board, CardIds, UndoHistory) {
        let mut board = Board::new("Test", 16.0);
        let mut ids = CardIds::default();
        let mut history = UndoHistory::new();
        for (x, y) in spots {
            board.deselect_all();
            board.create_card(&mut ids, &mut history, Vec2::new(*x, *y), CardKind::Checkbox);
        }
        board.deselect_all();
        board.resolve(0).unwrap();
        history.commit();
        (board, ids, history)
    }

    fn positions(board: &Board) -> Vec<(f32, f32)> {
        board.cards.iter().map(|c| (c.position.x, c.position.y)).collect()
    }

    #[test]
    fn create_snaps_to_grid() {
        let (mut board, mut ids, mut history) = board_with(&[]);
        let id = board.create_card(&mut ids, &mut history, Vec2::new(21.0, 39.0), CardKind::Note);
        assert_eq!(board.card(id).unwrap().position, Vec2::new(16.0, 32.0));
        assert_eq!(board.selected(), vec![id]);
        assert_eq!(board.last_kind, CardKind::Note);
    }

    #[test]
    fn create_below_selection_pushes_stack() {
        let (mut board, mut ids, mut history) = board_with(&[(0.0, 0.0), (0.0, 16.0), (0.0, 32.0), (64.0, 32.0)]);
        let top = board.cards[0].id;
        board.select_only(top);
        board.create_card(&mut ids, &mut history, Vec2::new(200.0, 200.0), CardKind::Checkbox);
        board.resolve(0).unwrap();
        assert_eq!(
            positions(&board),
            vec![(0.0, 0.0), (0.0, 16.0), (0.0, 32.0), (64.0, 32.0), (0.0, 48.0)]
        );
    }

    #[test]
    fn deleting_middle_card_closes_the_gap() {
        let (mut board, _, mut history) = board_with(&[(0.0, 0.0), (0.0, 16.0), (0.0, 32.0)]);
        let middle = board.cards[1].id;
        board.select_only(middle);
        assert_eq!(board.delete_selected(&mut history), 1);
        assert!(board.contains(middle), "removal waits for the resolve phase");

        board.resolve(0).unwrap();
        assert_eq!(positions(&board), vec![(0.0, 0.0), (0.0, 16.0)]);
        assert_eq!(board.cards[0].stack.prefix, vec![1]);
        assert_eq!(board.cards[1].stack.prefix, vec![2]);
        assert!(board.audit().is_empty());
    }

    #[test]
    fn reorder_sorts_by_row_then_column() {
        let (mut board, mut ids, mut history) = board_with(&[]);
        for (x, y) in [(32.0, 16.0), (0.0, 16.0), (0.0, 0.0)] {
            board.deselect_all();
            board.create_card(&mut ids, &mut history, Vec2::new(x, y), CardKind::Note);
        }
        board.reorder();
        assert_eq!(positions(&board), vec![(0.0, 0.0), (0.0, 16.0), (32.0, 16.0)]);
    }

    #[test]
    fn marquee_and_hit_test() {
        let (mut board, _, _) = board_with(&[(0.0, 0.0), (0.0, 16.0), (0.0, 160.0)]);
        let hits = board.select_in_rect(&Rect::new(0.0, 0.0, 32.0, 32.0), false);
        assert_eq!(hits.len(), 2);
        assert_eq!(board.selected().len(), 2);
        assert_eq!(board.hit_test(Vec2::new(5.0, 165.0)), Some(board.cards[2].id));
        assert_eq!(board.hit_test(Vec2::new(500.0, 500.0)), None);
    }

    #[test]
    fn move_up_swaps_with_neighbour() {
        let (mut board, _, mut history) = board_with(&[(0.0, 0.0), (0.0, 16.0)]);
        let (a, b) = (board.cards[0].id, board.cards[1].id);
        board.select_only(b);
        board.move_selected(&mut history, (0, -1));
        assert_eq!(board.card(b).unwrap().position, Vec2::new(0.0, 0.0));
        assert_eq!(board.card(a).unwrap().position, Vec2::new(0.0, 16.0));
    }

    #[test]
    fn navigate_the_stack() {
        let (board, _, _) = board_with(&[(0.0, 0.0), (0.0, 16.0), (0.0, 32.0), (160.0, 16.0)]);
        let ids: Vec<CardId> = board.cards.iter().map(|c| c.id).collect();
        // Board order: (0,0) (0,16) (160,16) (0,32)
        assert_eq!(board.navigate(ids[1], StackStep::Up), Some(ids[0]));
        assert_eq!(board.navigate(ids[0], StackStep::Bottom), Some(ids[3]));
        assert_eq!(board.navigate(ids[3], StackStep::Top), Some(ids[0]));
        assert_eq!(board.navigate(ids[0], StackStep::Top), None);
        assert_eq!(board.navigate(ids[1], StackStep::Right), Some(ids[2]));
    }

    #[test]
    fn paste_keeps_offsets_around_target() {
        let (mut board, mut ids, mut history) = board_with(&[]);
        let records: Vec<CardRecord> = [(0.0, 0.0), (16.0, 0.0)]
            .iter()
            .map(|(x, y)| Card::new(99, CardKind::Checkbox, Vec2::new(*x, *y), 16.0).serialize())
            .collect();
        let pasted = board.paste_records(&mut ids, &mut history, &records, Vec2::new(64.0, 64.0));
        assert_eq!(pasted.len(), 2);
        let at: Vec<Vec2> = pasted.iter().map(|id| board.card(*id).unwrap().position).collect();
        assert_eq!(at, vec![Vec2::new(48.0, 64.0), Vec2::new(64.0, 64.0)]);
        assert_eq!(history.current().len(), 2);
    }

    #[test]
    fn timer_chain_starts_the_next_timer() {
        let (mut board, mut ids, mut history) = board_with(&[]);
        let first = board.create_card(&mut ids, &mut history, Vec2::ZERO, CardKind::Timer);
        let second = board.create_card(&mut ids, &mut history, Vec2::ZERO, CardKind::Timer);
        board.resolve(0).unwrap();
        assert_eq!(board.card(first).unwrap().stack.below, Some(second));

        if let Some(Contents::Timer(t)) = board.card_mut(first).map(|c| &mut c.contents) {
            t.running = true;
        }
        board.tick(10_000.0);
        let notes = board.aggregate(Local::now().naive_local(), &mut history);
        assert!(matches!(notes.as_slice(), [Notification::TimerElapsed { card, .. }] if *card == first));
        assert!(matches!(&board.card(second).unwrap().contents, Contents::Timer(t) if t.running));
        assert!(matches!(&board.card(first).unwrap().contents, Contents::Timer(t) if !t.running));
    }

    #[test]
    fn dropped_cards_snap_and_are_captured() {
        let (mut board, _, mut history) = board_with(&[(0.0, 0.0)]);
        let id = board.cards[0].id;
        board.select_only(id);
        board.drag_selected(Vec2::new(21.0, 7.0));
        board.broadcast(&Message::Dropped(id), &mut history);
        assert_eq!(board.card(id).unwrap().position, Vec2::new(16.0, 0.0));
        assert_eq!(history.current().len(), 1);
        assert!(board.grid().at(17.0, 1.0).contains(&id));
    }

    #[test]
    fn lookups_follow_reordering() {
        let (mut board, _, _) = board_with(&[(0.0, 32.0), (0.0, 0.0), (0.0, 16.0)]);
        let order: Vec<CardId> = board.cards.iter().map(|c| c.id).collect();
        for (i, id) in order.iter().enumerate() {
            assert_eq!(board.index_of(*id), Some(i));
            assert_eq!(board.card(*id).map(|c| c.id), Some(*id));
        }
        assert_eq!(board.chain_below(order[0]), vec![order[1], order[2]]);
        assert_eq!(board.hit_test(Vec2::new(4.0, 20.0)), Some(order[1]));

        // Direct edits of the card list fall back to a scan.
        board.cards.swap(0, 2);
        assert_eq!(board.index_of(order[0]), Some(2));
        assert!(board.contains(order[2]));
        board.reorder();
        assert_eq!(board.index_of(order[0]), Some(0));
    }

    #[test]
    fn removed_cards_leave_no_links_behind() {
        let (mut board, _, mut history) = board_with(&[(0.0, 0.0), (16.0, 16.0), (0.0, 32.0)]);
        let child = board.cards[1].id;
        assert!(board.cards[0].stack.children.contains(&child));

        board.delete_cards(&mut history, &[child]);
        assert_eq!(board.handle_deletions(), vec![child]);
        for card in &board.cards {
            assert_ne!(card.stack.above, Some(child));
            assert_ne!(card.stack.below, Some(child));
            assert!(!card.stack.children.contains(&child));
        }
    }
}
