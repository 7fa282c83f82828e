use std::collections::VecDeque;

/// Drawing tool applied to a map card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapTool {
    #[default]
    Pointer,
    Pencil,
    Eraser,
    Fill,
    Line,
    QuickLine,
}

/// Number of colours in the map palette, excluding the empty value 0.
pub const PALETTE_SIZE: i32 = 8;

/// Free-form pixel grid stored `[row][column]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapData {
    data: Vec<Vec<i32>>,
    /// Pending first point of a two-click line.
    line_anchor: Option<(usize, usize)>,
    /// Last painted cell, start of a quick line.
    last_painted: Option<(usize, usize)>,
}

impl MapData {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![vec![0; width]; height],
            line_anchor: None,
            last_painted: None,
        }
    }

    pub fn from_rows(data: Vec<Vec<i32>>) -> Self {
        let width = data.iter().map(Vec::len).max().unwrap_or(0);
        let mut map = Self {
            data,
            line_anchor: None,
            last_painted: None,
        };
        for row in &mut map.data {
            row.resize(width, 0);
        }
        map
    }

    pub fn rows(&self) -> &[Vec<i32>] {
        &self.data
    }

    pub fn width(&self) -> usize {
        self.data.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<i32> {
        self.data.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, value: i32) -> bool {
        match self.data.get_mut(y).and_then(|row| row.get_mut(x)) {
            Some(cell) if *cell != value => {
                *cell = value;
                true
            }
            _ => false,
        }
    }

    /// Resize, keeping the overlapping top-left region.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.data.resize(height, vec![0; width]);
        for row in &mut self.data {
            row.resize(width, 0);
        }
        self.line_anchor = None;
        self.last_painted = None;
    }

    /// Four-way flood fill from a cell. Returns the number of cells changed.
    pub fn flood_fill(&mut self, x: usize, y: usize, value: i32) -> usize {
        let Some(target) = self.get(x, y) else {
            return 0;
        };
        if target == value {
            return 0;
        }

        let (w, h) = (self.width(), self.height());
        let mut changed = 0;
        let mut queue = VecDeque::from([(x, y)]);
        while let Some((cx, cy)) = queue.pop_front() {
            if self.get(cx, cy) != Some(target) {
                continue;
            }
            self.data[cy][cx] = value;
            changed += 1;
            if cx > 0 {
                queue.push_back((cx - 1, cy));
            }
            if cx + 1 < w {
                queue.push_back((cx + 1, cy));
            }
            if cy > 0 {
                queue.push_back((cx, cy - 1));
            }
            if cy + 1 < h {
                queue.push_back((cx, cy + 1));
            }
        }
        changed
    }

    /// Bresenham line between two cells, inclusive.
    pub fn line(&mut self, from: (usize, usize), to: (usize, usize), value: i32) -> usize {
        let (mut x0, mut y0) = (from.0 as i64, from.1 as i64);
        let (x1, y1) = (to.0 as i64, to.1 as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut changed = 0;

        loop {
            if x0 >= 0 && y0 >= 0 && self.set(x0 as usize, y0 as usize, value) {
                changed += 1;
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
        changed
    }

    /// Shift contents horizontally, wrapping around.
    pub fn shift(&mut self, amount: i32) {
        let w = self.width();
        if w == 0 {
            return;
        }
        let k = amount.rem_euclid(w as i32) as usize;
        for row in &mut self.data {
            row.rotate_right(k);
        }
    }

    /// Apply a tool at a cell. Returns true if any cell changed.
    pub fn apply_tool(&mut self, tool: MapTool, cell: (usize, usize), color: i32) -> bool {
        let (x, y) = cell;
        if self.get(x, y).is_none() {
            return false;
        }
        let changed = match tool {
            MapTool::Pointer => false,
            MapTool::Pencil => self.set(x, y, color),
            MapTool::Eraser => self.set(x, y, 0),
            MapTool::Fill => self.flood_fill(x, y, color) > 0,
            MapTool::Line => match self.line_anchor.take() {
                Some(anchor) => self.line(anchor, cell, color) > 0,
                None => {
                    self.line_anchor = Some(cell);
                    false
                }
            },
            MapTool::QuickLine => match self.last_painted {
                Some(start) => self.line(start, cell, color) > 0,
                None => self.set(x, y, color),
            },
        };
        if tool != MapTool::Pointer && tool != MapTool::Line {
            self.last_painted = Some(cell);
        }
        changed
    }
}

/// Next palette colour, wrapping within `1..=PALETTE_SIZE`.
pub fn cycle_color(color: i32, step: i32) -> i32 {
    (color - 1 + step).rem_euclid(PALETTE_SIZE) + 1
}
