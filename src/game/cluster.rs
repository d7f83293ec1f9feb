//! Flood fill over the grid: same-colour clusters and ceiling anchoring.

use super::grid::{BubbleColor, Cell, Grid};
use std::collections::HashSet;

const NEIGHBOURS_4: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Cells reachable from (row, col) through 4-neighbours that satisfy `accept`.
/// Empty when the start cell is absent or rejected.
fn flood<F>(
    grid: &Grid,
    row: usize,
    col: usize,
    visited: &mut HashSet<(usize, usize)>,
    accept: F,
) -> Vec<(usize, usize)>
where
    F: Fn(&Cell) -> bool,
{
    let mut component = Vec::new();
    match grid.cell_at(row, col) {
        Some(cell) if accept(cell) => {}
        _ => return component,
    }
    if !visited.insert((row, col)) {
        return component;
    }

    let mut stack = vec![(row, col)];
    while let Some((r, c)) = stack.pop() {
        component.push((r, c));
        for (dr, dc) in NEIGHBOURS_4 {
            let (nr, nc) = (r as i64 + dr, c as i64 + dc);
            if let Some(next) = grid.cell_at_signed(nr, nc) {
                let key = (next.row, next.col);
                if accept(next) && !visited.contains(&key) {
                    visited.insert(key);
                    stack.push(key);
                }
            }
        }
    }
    component
}

/// Same-coloured cluster containing (start_row, start_col).
pub fn connected_same_color(
    grid: &Grid,
    start_row: usize,
    start_col: usize,
    color: BubbleColor,
) -> Vec<(usize, usize)> {
    let mut visited = HashSet::new();
    flood(grid, start_row, start_col, &mut visited, |cell| cell.color == color)
}

/// Every bubble connected to some row-0 bubble, regardless of colour.
pub fn anchored(grid: &Grid) -> HashSet<(usize, usize)> {
    let mut visited = HashSet::new();
    for col in 0..grid.cols {
        flood(grid, 0, col, &mut visited, |_| true);
    }
    visited
}

/// Bubbles no longer hanging from the ceiling, in row-major order.
pub fn floating(grid: &Grid) -> Vec<(usize, usize)> {
    let anchored = anchored(grid);
    grid.cells()
        .map(|c| (c.row, c.col))
        .filter(|key| !anchored.contains(key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use BubbleColor::{Blue, Green, Red};

    fn grid_from(rows: &[&str]) -> Grid {
        let mut grid = Grid::new(rows.len(), rows[0].len(), 10.0);
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let color = match ch {
                    'R' => Red,
                    'G' => Green,
                    'B' => Blue,
                    _ => continue,
                };
                grid.place(r, c, color).unwrap();
            }
        }
        grid
    }

    fn sorted(mut v: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
        v.sort_unstable();
        v
    }

    #[test]
    fn empty_grid_has_no_cluster() {
        let grid = Grid::new(4, 4, 10.0);
        assert!(connected_same_color(&grid, 0, 0, Red).is_empty());
    }

    #[test]
    fn absent_or_mismatched_start_is_empty() {
        let grid = grid_from(&["R.", ".."]);
        assert!(connected_same_color(&grid, 1, 1, Red).is_empty());
        assert!(connected_same_color(&grid, 0, 0, Blue).is_empty());
        assert!(connected_same_color(&grid, 9, 9, Red).is_empty());
    }

    #[test]
    fn cluster_is_same_from_any_member() {
        let grid = grid_from(&["RRG", "GRB", "RRB"]);
        let expected = vec![(0, 0), (0, 1), (1, 1), (2, 0), (2, 1)];
        for &(r, c) in &expected {
            assert_eq!(sorted(connected_same_color(&grid, r, c, Red)), expected);
        }
    }

    #[test]
    fn diagonals_do_not_connect() {
        let grid = grid_from(&["R.", ".R"]);
        assert_eq!(connected_same_color(&grid, 0, 0, Red), vec![(0, 0)]);
    }

    #[test]
    fn anchoring_ignores_colour() {
        let grid = grid_from(&["RG.", ".B.", "..R"]);
        let anchored = anchored(&grid);
        assert!(anchored.contains(&(1, 1)));
        assert!(!anchored.contains(&(2, 2)));
        assert_eq!(floating(&grid), vec![(2, 2)]);
    }

    #[test]
    fn fully_connected_grid_has_nothing_floating() {
        let grid = grid_from(&["RGB", "G.B", "B.R"]);
        assert!(floating(&grid).is_empty());
    }
}
