//! Uniform spatial grid over the field.
//!
//! Cells hold pool slots. The grid is cleared and refilled every tick;
//! moves made during a tick go through `relocate` so it stays exact.

use crate::pool::Slot;

#[derive(Clone, Debug, Default)]
pub struct GridCell {
    pub slots: Vec<Slot>,
    /// Set whenever the cell's contents change; only a hint.
    pub dirty: bool,
}

pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<GridCell>,
}

impl SpatialGrid {
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        let cols = ((width as f32 / cell_size).ceil() as usize).max(1);
        let rows = ((height as f32 / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![GridCell::default(); cols * rows],
        }
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinates for a position, `None` outside the grid.
    pub fn cell_coords(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        let cx = (x / self.cell_size).floor();
        let cy = (y / self.cell_size).floor();
        // NaN fails both comparisons
        if !(cx >= 0.0 && cy >= 0.0) {
            return None;
        }
        let (cx, cy) = (cx as usize, cy as usize);
        (cx < self.cols && cy < self.rows).then_some((cx, cy))
    }

    #[inline]
    pub fn cell_index(&self, x: f32, y: f32) -> Option<usize> {
        self.cell_coords(x, y).map(|(cx, cy)| cy * self.cols + cx)
    }

    pub fn cell(&self, index: usize) -> Option<&GridCell> {
        self.cells.get(index)
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.slots.clear();
            cell.dirty = false;
        }
    }

    /// Index `slot` at (x, y). Out-of-grid positions are not indexed.
    pub fn insert(&mut self, slot: Slot, x: f32, y: f32) -> bool {
        match self.cell_index(x, y) {
            Some(i) => {
                let cell = &mut self.cells[i];
                cell.slots.push(slot);
                cell.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Drop `slot` from the cell covering (x, y).
    pub fn remove(&mut self, slot: Slot, x: f32, y: f32) -> bool {
        let Some(i) = self.cell_index(x, y) else {
            return false;
        };
        let cell = &mut self.cells[i];
        match cell.slots.iter().position(|&s| s == slot) {
            Some(pos) => {
                cell.slots.swap_remove(pos);
                cell.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Move `slot` from the cell covering `from` to the one covering `to`.
    pub fn relocate(&mut self, slot: Slot, from: (f32, f32), to: (f32, f32)) {
        let old = self.cell_index(from.0, from.1);
        let new = self.cell_index(to.0, to.1);
        if old == new {
            return;
        }
        self.remove(slot, from.0, from.1);
        self.insert(slot, to.0, to.1);
    }

    /// Collect every slot in the 3x3 block of cells around (x, y), except
    /// `slot` itself, into `out`. Order is unspecified.
    pub fn neighbors(&self, slot: Slot, x: f32, y: f32, out: &mut Vec<Slot>) {
        out.clear();
        let Some((cx, cy)) = self.cell_coords(x, y) else {
            return;
        };
        let x0 = cx.saturating_sub(1);
        let y0 = cy.saturating_sub(1);
        let x1 = (cx + 1).min(self.cols - 1);
        let y1 = (cy + 1).min(self.rows - 1);
        for gy in y0..=y1 {
            for gx in x0..=x1 {
                let cell = &self.cells[gy * self.cols + gx];
                out.extend(cell.slots.iter().copied().filter(|&s| s != slot));
            }
        }
    }

    /// Total number of indexed entries.
    pub fn len(&self) -> usize {
        self.cells.iter().map(|c| c.slots.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.slots.is_empty())
    }

    /// Iterate `(cell index, slot)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (usize, Slot)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.slots.iter().map(move |&s| (i, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_round_up() {
        let g = SpatialGrid::new(800, 600, 8.0);
        assert_eq!((g.cols(), g.rows()), (100, 75));
        let g = SpatialGrid::new(801, 5, 8.0);
        assert_eq!((g.cols(), g.rows()), (101, 1));
    }

    #[test]
    fn insert_uses_floor_of_position() {
        let mut g = SpatialGrid::new(64, 64, 8.0);
        assert!(g.insert(4, 15.9, 8.0));
        assert_eq!(g.cell_index(15.9, 8.0), Some(1 * 8 + 1));
        assert_eq!(g.cell(9).unwrap().slots, vec![4]);
        assert!(g.cell(9).unwrap().dirty);
    }

    #[test]
    fn out_of_bounds_insert_is_ignored() {
        let mut g = SpatialGrid::new(64, 64, 8.0);
        assert!(!g.insert(0, -0.5, 3.0));
        assert!(!g.insert(0, 3.0, 64.0));
        assert!(!g.insert(0, f32::NAN, 3.0));
        assert!(g.is_empty());
    }

    #[test]
    fn neighbors_cover_three_by_three_and_skip_self() {
        let mut g = SpatialGrid::new(64, 64, 8.0);
        g.insert(0, 20.0, 20.0); // cell (2,2)
        g.insert(1, 12.0, 12.0); // (1,1)
        g.insert(2, 28.0, 28.0); // (3,3)
        g.insert(3, 36.0, 20.0); // (4,2), too far
        g.insert(4, 21.0, 21.0); // (2,2)
        let mut out = Vec::new();
        g.neighbors(0, 20.0, 20.0, &mut out);
        out.sort_unstable();
        assert_eq!(out, vec![1, 2, 4]);
    }

    #[test]
    fn neighbors_at_corner_stay_in_bounds() {
        let mut g = SpatialGrid::new(16, 16, 8.0);
        g.insert(0, 0.0, 0.0);
        g.insert(1, 15.0, 15.0);
        let mut out = Vec::new();
        g.neighbors(0, 0.0, 0.0, &mut out);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn relocate_moves_between_cells() {
        let mut g = SpatialGrid::new(64, 64, 8.0);
        g.insert(7, 1.0, 1.0);
        g.relocate(7, (1.0, 1.0), (40.0, 1.0));
        assert!(g.cell(0).unwrap().slots.is_empty());
        assert_eq!(g.cell(5).unwrap().slots, vec![7]);
        g.relocate(7, (40.0, 1.0), (41.0, 2.0));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn clear_empties_every_cell() {
        let mut g = SpatialGrid::new(64, 64, 8.0);
        for i in 0..20 {
            g.insert(i, i as f32 * 3.0, i as f32 * 2.0);
        }
        g.clear();
        assert!(g.is_empty());
        assert_eq!(g.entries().count(), 0);
    }
}
