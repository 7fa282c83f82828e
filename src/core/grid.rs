use std::collections::HashMap;

use super::card::CardId;
use super::geometry::Rect;

/// Integer cell coordinate in the spatial index.
pub type Cell = (i32, i32);

/// Spatial hash from grid cells to the cards occupying them.
///
/// Holds ids only; the board owns the cards.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell_size: f32,
    cells: HashMap<Cell, Vec<CardId>>,
}

impl GridIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_at(&self, x: f32, y: f32) -> Cell {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Cells a card rectangle registers in: `[floor(x/g), floor((x+w)/g))` on
    /// each axis, never fewer than one cell.
    pub fn footprint(&self, rect: &Rect) -> Vec<Cell> {
        let (sx, sy) = self.cell_at(rect.x, rect.y);
        let (mut ex, mut ey) = self.cell_at(rect.right(), rect.bottom());
        ex = ex.max(sx + 1);
        ey = ey.max(sy + 1);

        let mut out = Vec::with_capacity(((ex - sx) * (ey - sy)) as usize);
        for cy in sy..ey {
            for cx in sx..ex {
                out.push((cx, cy));
            }
        }
        out
    }

    /// Register a card under every cell of its footprint.
    pub fn add(&mut self, id: CardId, rect: &Rect) -> Vec<Cell> {
        let cells = self.footprint(rect);
        for cell in &cells {
            self.cells.entry(*cell).or_default().push(id);
        }
        cells
    }

    pub fn remove(&mut self, id: CardId, cells: &[Cell]) {
        for cell in cells {
            if let Some(list) = self.cells.get_mut(cell) {
                if let Some(pos) = list.iter().position(|c| *c == id) {
                    list.remove(pos);
                }
                if list.is_empty() {
                    self.cells.remove(cell);
                }
            }
        }
    }

    /// Cards registered in the cell containing a world point.
    pub fn at(&self, x: f32, y: f32) -> &[CardId] {
        self.cells
            .get(&self.cell_at(x, y))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cards registered in any cell the rectangle touches, first-seen order.
    pub fn in_rect(&self, rect: &Rect) -> Vec<CardId> {
        let (sx, sy) = self.cell_at(rect.x, rect.y);
        let ex = ((rect.right() / self.cell_size).ceil() as i32).max(sx + 1);
        let ey = ((rect.bottom() / self.cell_size).ceil() as i32).max(sy + 1);

        let mut out: Vec<CardId> = Vec::new();
        for cy in sy..ey {
            for cx in sx..ex {
                if let Some(list) = self.cells.get(&(cx, cy)) {
                    for id in list {
                        if !out.contains(id) {
                            out.push(*id);
                        }
                    }
                }
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.len()
    }

    /// Every cell that lists the card.
    pub fn cells_of(&self, id: CardId) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self
            .cells
            .iter()
            .filter(|(_, list)| list.contains(&id))
            .map(|(cell, _)| *cell)
            .collect();
        cells.sort();
        cells
    }
}
