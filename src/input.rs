//! Key and mouse bindings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Keyboard aim never goes flatter than this above the horizon.
const MIN_AIM_ELEVATION_DEG: f32 = 6.0;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AimLeft,
    AimRight,
    Fire,
    Pause,
    Quit,
    None,
}

/// Pointer input in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Move { column: u16, row: u16 },
    Click { column: u16, row: u16 },
    None,
}

/// Map key event to game action. Arrows or h/l aim, Space/Enter fires.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::AimLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::AimRight,
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Up | KeyCode::Char('k') => Action::Fire,
        _ => Action::None,
    }
}

/// Mouse motion aims, left click fires.
pub fn mouse_to_pointer(event: MouseEvent) -> Pointer {
    let MouseEvent {
        kind, column, row, ..
    } = event;
    match kind {
        MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
            Pointer::Move { column, row }
        }
        MouseEventKind::Down(MouseButton::Left) => Pointer::Click { column, row },
        _ => Pointer::None,
    }
}

/// Rotate `aim` about `origin` by `degrees` (positive turns right on screen),
/// keeping it above the launcher.
pub fn rotate_aim(origin: (f32, f32), aim: (f32, f32), degrees: f32) -> (f32, f32) {
    let (vx, vy) = (aim.0 - origin.0, aim.1 - origin.1);
    let len = vx.hypot(vy).max(1.0);
    let angle = if vx == 0.0 && vy == 0.0 {
        -90.0
    } else {
        vy.atan2(vx).to_degrees()
    };
    // Screen y grows downward, so "up" is -90°.
    let angle = if angle > 90.0 { angle - 360.0 } else { angle };
    let turned = (angle + degrees).clamp(-180.0 + MIN_AIM_ELEVATION_DEG, -MIN_AIM_ELEVATION_DEG);
    let rad = turned.to_radians();
    (origin.0 + len * rad.cos(), origin.1 + len * rad.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::AimLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('l'))), Action::AimRight);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Fire);
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), Action::None);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new_with_kind(
                KeyCode::Char('p'),
                KeyModifiers::ALT,
                KeyEventKind::Press
            )),
            Action::None
        );
    }

    #[test]
    fn mouse_moves_and_clicks() {
        let event = |kind| MouseEvent {
            kind,
            column: 7,
            row: 3,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            mouse_to_pointer(event(MouseEventKind::Moved)),
            Pointer::Move { column: 7, row: 3 }
        );
        assert_eq!(
            mouse_to_pointer(event(MouseEventKind::Down(MouseButton::Left))),
            Pointer::Click { column: 7, row: 3 }
        );
        assert_eq!(mouse_to_pointer(event(MouseEventKind::ScrollUp)), Pointer::None);
    }

    #[test]
    fn rotate_turns_about_launcher() {
        let (x, y) = rotate_aim((100.0, 100.0), (100.0, 0.0), 90.0 - MIN_AIM_ELEVATION_DEG);
        assert!(x > 190.0);
        assert!(y < 100.0);
        let (x, _) = rotate_aim((100.0, 100.0), (100.0, 0.0), -30.0);
        assert!(x < 100.0);
    }

    #[test]
    fn rotate_never_points_below_horizon() {
        let (_, y) = rotate_aim((0.0, 0.0), (10.0, -1.0), 45.0);
        assert!(y < 0.0);
        // Aim on the launcher starts from straight up.
        let (x, y) = rotate_aim((5.0, 5.0), (5.0, 5.0), 0.0);
        assert!((x - 5.0).abs() < 1e-4);
        assert!(y < 5.0);
    }
}
