//! The shooter bubble: launch velocity and per-tick motion.

use super::grid::BubbleColor;

/// Smallest upward share of a launch direction. Shallower aims are lifted to
/// this so a shot always makes progress toward the ceiling.
pub const MIN_UPWARD: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: BubbleColor,
    /// In flight. Inactive projectiles wait at the launcher.
    pub active: bool,
}

impl Projectile {
    /// Fresh, inactive projectile at the launcher.
    pub fn ready(x: f32, y: f32, color: BubbleColor) -> Self {
        Self {
            x,
            y,
            dx: 0.0,
            dy: 0.0,
            color,
            active: false,
        }
    }

    /// Start flying toward (aim_x, aim_y) at `speed`. No-op while in flight.
    pub fn launch(&mut self, aim_x: f32, aim_y: f32, speed: f32) {
        if self.active {
            return;
        }
        let (ux, uy) = launch_direction(aim_x - self.x, aim_y - self.y);
        self.dx = ux * speed;
        self.dy = uy * speed;
        self.active = true;
    }

    /// Move by `step` ticks' worth of velocity.
    pub fn advance(&mut self, step: f32) {
        if !self.active {
            return;
        }
        self.x += self.dx * step;
        self.y += self.dy * step;
    }
}

/// Unit direction for a launch vector (y grows downward). Zero length points
/// straight up; near-horizontal or downward aims are lifted to [`MIN_UPWARD`].
pub fn launch_direction(vx: f32, vy: f32) -> (f32, f32) {
    let len = vx.hypot(vy);
    if !len.is_finite() || len <= f32::EPSILON {
        return (0.0, -1.0);
    }
    let (ux, uy) = (vx / len, vy / len);
    if uy <= -MIN_UPWARD {
        return (ux, uy);
    }
    let side = if ux < 0.0 { -1.0 } else { 1.0 };
    let horizontal = (1.0 - MIN_UPWARD * MIN_UPWARD).sqrt();
    (side * horizontal, -MIN_UPWARD)
}
