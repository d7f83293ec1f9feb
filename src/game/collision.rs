//! Contact detection for the flying bubble and snapping it onto the grid.

use super::grid::{Grid, PlaceError};
use super::projectile::Projectile;

/// What stopped the projectile this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Ceiling,
    /// First overlapping bubble in row-major order.
    Cell { row: usize, col: usize },
}

/// How an occupied snap target is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapPolicy {
    /// Occupied target is a placement failure (game over).
    #[default]
    Strict,
    /// Fall back to the empty cell nearest the projectile.
    NearestFree,
}

/// Reflect off the side walls. Returns true if a wall was hit.
///
/// The new horizontal velocity always points back into the playfield, so a
/// projectile that is still past the wall on the next tick does not flip again.
pub fn bounce_walls(p: &mut Projectile, width: f32, radius: f32) -> bool {
    if p.x - radius < 0.0 && p.dx < 0.0 {
        p.dx = -p.dx;
        true
    } else if p.x + radius > width && p.dx > 0.0 {
        p.dx = -p.dx;
        true
    } else {
        false
    }
}

/// Ceiling first, then bubbles in row-major order; the first hit wins.
pub fn detect_contact(grid: &Grid, p: &Projectile) -> Option<Contact> {
    let radius = grid.radius();
    if p.y - radius < 0.0 {
        return Some(Contact::Ceiling);
    }
    let reach = radius * 2.0;
    grid.cells()
        .find(|cell| {
            let (cx, cy) = grid.coordinates_of(cell.row, cell.col);
            (p.x - cx).hypot(p.y - cy) < reach
        })
        .map(|cell| Contact::Cell {
            row: cell.row,
            col: cell.col,
        })
}

/// Cell the projectile settles into. `Occupied` is a placement failure.
pub fn snap_target(
    grid: &Grid,
    p: &Projectile,
    contact: Contact,
    policy: SnapPolicy,
) -> Result<(usize, usize), PlaceError> {
    let (row, col) = match contact {
        Contact::Ceiling => (0, grid.cell_index_of(p.x, grid.radius()).1),
        Contact::Cell { .. } => grid.cell_index_of(p.x, p.y),
    };
    if !grid.is_occupied(row, col) {
        return Ok((row, col));
    }
    let fallback = match policy {
        SnapPolicy::Strict => None,
        SnapPolicy::NearestFree => nearest_free(grid, p.x, p.y),
    };
    fallback.ok_or(PlaceError::Occupied { row, col })
}

/// Empty cell whose centre is closest to (x, y); row-major on ties.
fn nearest_free(grid: &Grid, x: f32, y: f32) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f32)> = None;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            if grid.is_occupied(row, col) {
                continue;
            }
            let (cx, cy) = grid.coordinates_of(row, col);
            let dist = (x - cx).hypot(y - cy);
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some(((row, col), dist));
            }
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::grid::BubbleColor;

    fn flying(x: f32, y: f32, dx: f32, dy: f32) -> Projectile {
        Projectile {
            x,
            y,
            dx,
            dy,
            color: BubbleColor::Red,
            active: true,
        }
    }

    #[test]
    fn right_wall_flips_horizontal_velocity() {
        let mut p = flying(195.0, 100.0, 3.0, -4.0);
        assert!(bounce_walls(&mut p, 200.0, 10.0));
        assert_eq!(p.dx, -3.0);
        assert_eq!(p.dy, -4.0);
        // Still past the wall next tick: no second flip.
        assert!(!bounce_walls(&mut p, 200.0, 10.0));
        assert_eq!(p.dx, -3.0);
    }

    #[test]
    fn left_wall_flips_horizontal_velocity() {
        let mut p = flying(5.0, 100.0, -2.0, -1.0);
        assert!(bounce_walls(&mut p, 200.0, 10.0));
        assert_eq!(p.dx, 2.0);
    }

    #[test]
    fn ceiling_contact_snaps_to_row_zero() {
        let grid = Grid::new(4, 5, 10.0);
        let p = flying(52.0, 8.0, 0.0, -5.0);
        assert_eq!(detect_contact(&grid, &p), Some(Contact::Ceiling));
        assert_eq!(snap_target(&grid, &p, Contact::Ceiling, SnapPolicy::Strict), Ok((0, 2)));
    }

    #[test]
    fn full_grid_has_no_fallback() {
        let mut grid = Grid::new(1, 2, 10.0);
        grid.place(0, 0, BubbleColor::Red).unwrap();
        grid.place(0, 1, BubbleColor::Red).unwrap();
        let p = flying(12.0, 12.0, 0.0, -1.0);
        let contact = detect_contact(&grid, &p).unwrap();
        assert!(snap_target(&grid, &p, contact, SnapPolicy::NearestFree).is_err());
    }

    #[test]
    fn first_overlap_in_row_major_order_wins() {
        let mut grid = Grid::new(4, 4, 10.0);
        grid.place(0, 1, BubbleColor::Red).unwrap();
        grid.place(1, 0, BubbleColor::Blue).unwrap();
        // Equidistant from (0,1) at (30,10) and (1,0) at (10,30).
        let p = flying(24.0, 24.0, 0.0, -1.0);
        assert_eq!(detect_contact(&grid, &p), Some(Contact::Cell { row: 0, col: 1 }));
    }

    #[test]
    fn no_contact_in_open_space() {
        let mut grid = Grid::new(6, 6, 10.0);
        grid.place(0, 0, BubbleColor::Red).unwrap();
        let p = flying(90.0, 90.0, 0.0, -1.0);
        assert_eq!(detect_contact(&grid, &p), None);
    }

    #[test]
    fn cell_contact_snaps_to_nearest_cell() {
        let mut grid = Grid::new(4, 4, 10.0);
        grid.place(0, 1, BubbleColor::Red).unwrap();
        let p = flying(31.0, 28.0, 0.0, -1.0);
        let contact = detect_contact(&grid, &p).unwrap();
        assert_eq!(snap_target(&grid, &p, contact, SnapPolicy::Strict), Ok((1, 1)));
    }

    #[test]
    fn occupied_target_fails_when_strict() {
        let mut grid = Grid::new(4, 4, 10.0);
        grid.place(0, 1, BubbleColor::Red).unwrap();
        let p = flying(30.0, 14.0, 0.0, -1.0);
        let contact = detect_contact(&grid, &p).unwrap();
        assert_eq!(
            snap_target(&grid, &p, contact, SnapPolicy::Strict),
            Err(PlaceError::Occupied { row: 0, col: 1 })
        );
    }

    #[test]
    fn occupied_target_moves_to_nearest_free_when_forgiving() {
        let mut grid = Grid::new(4, 4, 10.0);
        grid.place(0, 1, BubbleColor::Red).unwrap();
        let p = flying(36.0, 14.0, 0.0, -1.0);
        let contact = detect_contact(&grid, &p).unwrap();
        assert_eq!(snap_target(&grid, &p, contact, SnapPolicy::NearestFree), Ok((0, 2)));
    }
}
