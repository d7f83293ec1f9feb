//! Grid store: the 2-D bubble array and the (row, col) <-> (x, y) math.

use clap::ValueEnum;
use rand::Rng;
use thiserror::Error;

/// Bubble colours. Theme index 0..6 via [`BubbleColor::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum BubbleColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Cyan,
}

impl BubbleColor {
    /// Colour index 0..6 for theme.bubble_color().
    pub fn index(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Yellow => 3,
            Self::Purple => 4,
            Self::Cyan => 5,
        }
    }
}

/// One settled bubble. Pixel coordinates are derived from row/col by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub color: BubbleColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceError {
    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },
    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },
}

/// Fixed-size bubble grid. Row 0 is the ceiling.
///
/// Removed bubbles are compacted to `None`, so "absent" is the only
/// representation of "no bubble here".
#[derive(Debug, Clone)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    radius: f32,
    /// cells[row * cols + col].
    cells: Vec<Option<Cell>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, radius: f32) -> Self {
        Self {
            rows,
            cols,
            radius,
            cells: vec![None; rows * cols],
        }
    }

    /// Fill rows `[0, top_filled_rows)` with random colours from `palette`;
    /// everything below is cleared.
    pub fn initialize<R: Rng>(
        &mut self,
        top_filled_rows: usize,
        palette: &[BubbleColor],
        rng: &mut R,
    ) {
        self.cells.fill(None);
        if palette.is_empty() {
            return;
        }
        for row in 0..top_filled_rows.min(self.rows) {
            for col in 0..self.cols {
                let color = palette[rng.gen_range(0..palette.len())];
                self.cells[row * self.cols + col] = Some(Cell { row, col, color });
            }
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then_some(row * self.cols + col)
    }

    /// Bubble at (row, col); `None` for empty or out-of-range slots.
    #[inline]
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).and_then(|i| self.cells[i].as_ref())
    }

    /// Signed lookup for neighbour walks; negative coordinates are absent.
    #[inline]
    pub fn cell_at_signed(&self, row: i64, col: i64) -> Option<&Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.cell_at(row as usize, col as usize)
    }

    #[inline]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.cell_at(row, col).is_some()
    }

    pub fn place(&mut self, row: usize, col: usize, color: BubbleColor) -> Result<(), PlaceError> {
        let i = self.index(row, col).ok_or(PlaceError::OutOfBounds { row, col })?;
        if self.cells[i].is_some() {
            return Err(PlaceError::Occupied { row, col });
        }
        self.cells[i] = Some(Cell { row, col, color });
        Ok(())
    }

    /// Remove the bubble at (row, col), returning it. No-op when absent.
    pub fn remove(&mut self, row: usize, col: usize) -> Option<Cell> {
        let i = self.index(row, col)?;
        self.cells[i].take()
    }

    /// All bubbles in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().flatten()
    }

    pub fn live_count(&self) -> usize {
        self.cells().count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells().next().is_none()
    }

    /// True if any bubble sits in the last row.
    pub fn bottom_row_occupied(&self) -> bool {
        self.rows > 0 && (0..self.cols).any(|col| self.is_occupied(self.rows - 1, col))
    }

    /// Pixel centre of (row, col).
    #[inline]
    pub fn coordinates_of(&self, row: usize, col: usize) -> (f32, f32) {
        let d = self.radius * 2.0;
        (col as f32 * d + self.radius, row as f32 * d + self.radius)
    }

    /// Nearest cell to pixel (x, y), clamped into the grid. Ties round toward
    /// the lower index.
    pub fn cell_index_of(&self, x: f32, y: f32) -> (usize, usize) {
        let d = self.radius * 2.0;
        let row = nearest_index((y - self.radius) / d, self.rows);
        let col = nearest_index((x - self.radius) / d, self.cols);
        (row, col)
    }
}

/// Round half toward lower, clamp to `[0, len)`.
fn nearest_index(v: f32, len: usize) -> usize {
    let rounded = (v - 0.5).ceil();
    if !rounded.is_finite() || rounded <= 0.0 {
        return 0;
    }
    (rounded as usize).min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn coordinates_round_trip_for_every_cell() {
        let grid = Grid::new(12, 20, 20.0);
        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let (x, y) = grid.coordinates_of(row, col);
                assert_eq!(grid.cell_index_of(x, y), (row, col));
            }
        }
    }

    #[test]
    fn cell_index_ties_round_down() {
        let grid = Grid::new(4, 4, 10.0);
        // Halfway between col 1 (x=30) and col 2 (x=50).
        assert_eq!(grid.cell_index_of(40.0, 10.0), (0, 1));
        assert_eq!(grid.cell_index_of(40.1, 10.0), (0, 2));
    }

    #[test]
    fn cell_index_clamps_outside_positions() {
        let grid = Grid::new(4, 5, 10.0);
        assert_eq!(grid.cell_index_of(-50.0, -50.0), (0, 0));
        assert_eq!(grid.cell_index_of(1_000.0, 1_000.0), (3, 4));
    }

    #[test]
    fn initialize_fills_only_top_rows() {
        let mut grid = Grid::new(6, 4, 10.0);
        let mut rng = StdRng::seed_from_u64(7);
        grid.initialize(2, &[BubbleColor::Red, BubbleColor::Blue], &mut rng);
        assert_eq!(grid.live_count(), 8);
        assert!(grid.cells().all(|c| c.row < 2));
        assert!(grid
            .cells()
            .all(|c| matches!(c.color, BubbleColor::Red | BubbleColor::Blue)));
    }

    #[test]
    fn place_rejects_occupied_and_out_of_range() {
        let mut grid = Grid::new(3, 3, 10.0);
        assert_eq!(grid.place(1, 1, BubbleColor::Green), Ok(()));
        assert_eq!(
            grid.place(1, 1, BubbleColor::Red),
            Err(PlaceError::Occupied { row: 1, col: 1 })
        );
        assert_eq!(
            grid.place(3, 0, BubbleColor::Red),
            Err(PlaceError::OutOfBounds { row: 3, col: 0 })
        );
        assert_eq!(grid.cell_at(1, 1).map(|c| c.color), Some(BubbleColor::Green));
    }

    #[test]
    fn out_of_range_queries_are_absent() {
        let grid = Grid::new(2, 2, 10.0);
        assert!(grid.cell_at(5, 0).is_none());
        assert!(grid.cell_at_signed(-1, 0).is_none());
        assert!(grid.cell_at_signed(0, -1).is_none());
    }

    #[test]
    fn removed_slot_can_be_refilled() {
        let mut grid = Grid::new(2, 2, 10.0);
        grid.place(0, 0, BubbleColor::Red).unwrap();
        assert!(grid.remove(0, 0).is_some());
        assert!(grid.cell_at(0, 0).is_none());
        assert!(grid.place(0, 0, BubbleColor::Blue).is_ok());
    }
}
