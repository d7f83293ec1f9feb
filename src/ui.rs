//! Layout and drawing: playfield, projectile, aiming line, sidebar, pause and round notices.

use crate::app::Screen;
use crate::game::{Cell, GameEvent, LossCause, Session, LAUNCH_ZONE_ROWS};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// One grid cell is two terminal columns by one row.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;

const BUBBLE: &str = "██";
const AIM_DOT: &str = "·";

/// Duration of the pop fade (TachyonFX) in ms.
const POP_FADE_MS: u32 = 350;

/// Bubbles fading out after a pop or fall.
pub struct PopFade {
    cells: Vec<Cell>,
    effect: Option<Effect>,
    last_processed: Option<Instant>,
}

impl PopFade {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            effect: None,
            last_processed: None,
        }
    }

    pub fn done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

/// Board size in terminal cells (without border).
fn board_cells(session: &Session) -> (u16, u16) {
    let w = session.grid.cols as u16 * CELL_WIDTH;
    let h = (session.grid.rows + LAUNCH_ZONE_ROWS) as u16 * CELL_HEIGHT;
    (w, h)
}

/// Playfield size in terminal cells (border + board).
fn playfield_size(session: &Session) -> (u16, u16) {
    let (w, h) = board_cells(session);
    (w + 2, h + 2)
}

/// Smallest terminal that fits the playfield and sidebar.
pub fn required_terminal_size(session: &Session) -> (u16, u16) {
    let (pw, ph) = playfield_size(session);
    (pw + SIDEBAR_WIDTH, ph.max(SIDEBAR_MIN_HEIGHT))
}

/// Split `area` into centred playfield and sidebar, as drawn by `draw_game`.
fn game_layout(area: Rect, session: &Session) -> (Rect, Rect) {
    let (pw, ph) = playfield_size(session);
    let total_w = pw + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(SIDEBAR_MIN_HEIGHT)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let playfield = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (playfield, inner[1])
}

/// Board rect (inside the playfield border) for the given frame area.
pub fn board_rect(area: Rect, session: &Session) -> Rect {
    let (playfield, _) = game_layout(area, session);
    let (w, h) = board_cells(session);
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: w.min(playfield.width.saturating_sub(2)),
        height: h.min(playfield.height.saturating_sub(2)),
    }
}

/// Terminal cell -> playfield units (centre of the cell). Works outside the board too.
pub fn terminal_to_playfield(board: Rect, session: &Session, column: u16, row: u16) -> (f32, f32) {
    let d = session.radius() * 2.0;
    let dx = f32::from(column) - f32::from(board.x) + 0.5;
    let dy = f32::from(row) - f32::from(board.y) + 0.5;
    (dx * d / f32::from(CELL_WIDTH), dy * d / f32::from(CELL_HEIGHT))
}

/// Playfield units -> terminal cell, or `None` when off the board.
fn playfield_to_terminal(board: Rect, session: &Session, x: f32, y: f32) -> Option<(u16, u16)> {
    let d = session.radius() * 2.0;
    let cx = (x / d * f32::from(CELL_WIDTH)).floor();
    let cy = (y / d * f32::from(CELL_HEIGHT)).floor();
    if cx < 0.0 || cy < 0.0 || cx >= f32::from(board.width) || cy >= f32::from(board.height) {
        return None;
    }
    Some((board.x + cx as u16, board.y + cy as u16))
}

/// Top-left terminal cell of the bubble drawn at (row, col).
fn cell_origin(board: Rect, row: usize, col: usize) -> (u16, u16) {
    (
        board.x + col as u16 * CELL_WIDTH,
        board.y + row as u16 * CELL_HEIGHT,
    )
}

fn put_bubble(buf: &mut Buffer, board: Rect, x: u16, y: u16, color: Color) {
    if y < board.y || y >= board.y + board.height {
        return;
    }
    for (i, ch) in BUBBLE.chars().enumerate() {
        let bx = x + i as u16;
        if bx >= board.x && bx < board.x + board.width {
            buf[(bx, y)]
                .set_char(ch)
                .set_style(Style::default().fg(color));
        }
    }
}

/// Draw current screen, with optional pause overlay and round notice.
/// A running `pop_fade` is advanced with TachyonFX unless `no_animation`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    session: &Session,
    theme: &crate::theme::Theme,
    paused: bool,
    pop_fade: &mut Option<PopFade>,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let (need_w, need_h) = required_terminal_size(session);
    if area.width < need_w || area.height < need_h {
        draw_too_small(frame, theme, area, need_w, need_h);
        return;
    }

    draw_game(frame, session, theme, area);
    if let Some(fade) = pop_fade.as_mut() {
        if !no_animation {
            apply_pop_fade(frame, session, theme, area, fade, now);
        }
    }
    match screen {
        Screen::Playing if paused => draw_pause_overlay(frame, theme, area),
        Screen::Playing => {}
        Screen::Notice(event) => draw_notice(frame, theme, area, event),
    }
}

/// Draw game: playfield + sidebar; use full area and center the board.
fn draw_game(frame: &mut Frame, session: &Session, theme: &crate::theme::Theme, area: Rect) {
    let (playfield_area, sidebar_area) = game_layout(area, session);
    draw_playfield(frame, session, theme, playfield_area);
    draw_sidebar(frame, session, theme, sidebar_area);
}

fn draw_playfield(frame: &mut Frame, session: &Session, theme: &crate::theme::Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Bubbletui ", Style::default().fg(theme.title)));
    block.render(area, frame.buffer_mut());
    let board = board_rect(frame.area(), session);
    let buf = frame.buffer_mut();

    for y in board.y..board.y + board.height {
        for x in board.x..board.x + board.width {
            buf[(x, y)].set_char(' ').set_style(Style::default().bg(theme.bg));
        }
    }

    // Loss line: the last grid row.
    let loss_y = board.y + (session.grid.rows as u16 - 1) * CELL_HEIGHT;
    for x in board.x..board.x + board.width {
        buf[(x, loss_y)]
            .set_char('_')
            .set_style(Style::default().fg(theme.div_line).bg(theme.bg));
    }

    if !session.is_shooting() {
        draw_aim_line(buf, session, theme, board);
    }

    for cell in session.grid.cells() {
        let (x, y) = cell_origin(board, cell.row, cell.col);
        put_bubble(buf, board, x, y, theme.bubble_color(cell.color));
    }

    let p = &session.projectile;
    let r = session.radius();
    if let Some((x, y)) = playfield_to_terminal(board, session, p.x - r + 0.5, p.y) {
        put_bubble(buf, board, x, y, theme.bubble_color(p.color));
    }
}

/// Dotted line from the launcher toward the aim target, stopping at the first bubble.
fn draw_aim_line(buf: &mut Buffer, session: &Session, theme: &crate::theme::Theme, board: Rect) {
    let (lx, ly) = session.launcher();
    let (ax, ay) = session.aim();
    let (vx, vy) = (ax - lx, ay - ly);
    let len = vx.hypot(vy);
    if len <= f32::EPSILON {
        return;
    }
    // Half a terminal row per sample.
    let step = session.radius() / f32::from(CELL_HEIGHT);
    let samples = (len / step) as usize;
    let style = Style::default().fg(theme.inactive_fg).bg(theme.bg);
    for i in 2..=samples {
        let t = i as f32 * step / len;
        let (x, y) = (lx + vx * t, ly + vy * t);
        let (row, col) = session.grid.cell_index_of(x, y);
        let (cx, cy) = session.grid.coordinates_of(row, col);
        if session.grid.is_occupied(row, col) && (x - cx).hypot(y - cy) < session.radius() * 2.0 {
            break;
        }
        match playfield_to_terminal(board, session, x, y) {
            Some((tx, ty)) => {
                buf[(tx, ty)].set_symbol(AIM_DOT).set_style(style);
            }
            None => break,
        }
    }
}

/// Build set of buffer (x, y) positions covered by fading bubbles.
fn fading_buffer_positions(board: Rect, cells: &[Cell]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for cell in cells {
        let (x0, y0) = cell_origin(board, cell.row, cell.col);
        for bx in x0..(x0 + CELL_WIDTH).min(board.x + board.width) {
            for by in y0..(y0 + CELL_HEIGHT).min(board.y + board.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Redraw popped bubbles and fade them to the background (TachyonFX).
fn apply_pop_fade(
    frame: &mut Frame,
    session: &Session,
    theme: &crate::theme::Theme,
    area: Rect,
    fade: &mut PopFade,
    now: Instant,
) {
    let board = board_rect(area, session);
    let delta = fade
        .last_processed
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    fade.last_processed = Some(now);

    {
        let buf = frame.buffer_mut();
        for cell in &fade.cells {
            let (x, y) = cell_origin(board, cell.row, cell.col);
            put_bubble(buf, board, x, y, theme.bubble_color(cell.color));
        }
    }

    if fade.effect.is_none() {
        let positions = fading_buffer_positions(board, &fade.cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (POP_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        fade.effect = Some(effect);
    }

    if let Some(effect) = fade.effect.as_mut() {
        frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
    }
}

/// Sidebar sections need this many rows.
const SIDEBAR_MIN_HEIGHT: u16 = 20;

fn draw_sidebar(frame: &mut Frame, session: &Session, theme: &crate::theme::Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Next
            Constraint::Length(3), // Colours
            Constraint::Length(6), // Stats
            Constraint::Length(8), // Controls
        ])
        .split(area);

    // --- Next ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let upcoming = theme.bubble_color(session.upcoming);
    Paragraph::new(Line::from(vec![
        Span::styled("Next ", title_style),
        Span::styled(BUBBLE, Style::default().fg(upcoming)),
    ]))
    .render(next_inner, frame.buffer_mut());

    // --- Colours ---
    let colours_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let colours_inner = colours_block.inner(chunks[1]);
    colours_block.render(chunks[1], frame.buffer_mut());
    draw_colour_strip(frame, session, theme, colours_inner);

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let stat = |label: &'static str, value: u32| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value.to_string(), fg_style),
        ])
    };
    Paragraph::new(Text::from(vec![
        stat("Score: ", session.score),
        stat("Best: ", session.best_score),
        stat("Wins: ", session.wins),
        stat("Losses: ", session.losses),
    ]))
    .render(stats_inner, frame.buffer_mut());

    // --- Controls ---
    let help_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let help_inner = help_block.inner(chunks[3]);
    help_block.render(chunks[3], frame.buffer_mut());
    let help = |keys: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(theme.bubbles[2])),
            Span::styled(what, fg_style),
        ])
    };
    Paragraph::new(Text::from(vec![
        help("Mouse  ", "aim / fire"),
        help("←/→    ", "rotate aim"),
        help("Space  ", "fire"),
        help("P      ", "pause"),
        help("Q      ", "quit"),
    ]))
    .render(help_inner, frame.buffer_mut());
}

/// Draw the palette in play as a row of bubbles.
fn draw_colour_strip(frame: &mut Frame, session: &Session, theme: &crate::theme::Theme, area: Rect) {
    let spans: Vec<Span> = session
        .palette()
        .iter()
        .flat_map(|&c| {
            [
                Span::styled(BUBBLE, Style::default().fg(theme.bubble_color(c))),
                Span::from(" "),
            ]
        })
        .collect();
    Paragraph::new(Line::from(spans)).render(area, frame.buffer_mut());
}

fn centered_popup(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &crate::theme::Theme, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Round result. The board behind it is already the next round.
fn draw_notice(frame: &mut Frame, theme: &crate::theme::Theme, area: Rect, event: GameEvent) {
    let popup = centered_popup(area, 34, 8);
    let (title, title_style, score, detail) = match event {
        GameEvent::Win { score } => (
            " You Win! ",
            Style::default().fg(Color::Black).bg(Color::Green),
            score,
            "Board cleared",
        ),
        GameEvent::GameOver { score, cause } => (
            " Game Over! ",
            Style::default().fg(Color::White).bg(Color::Red),
            score,
            match cause {
                LossCause::ReachedBottom => "Bubbles reached the bottom",
                LossCause::OccupiedTarget => "No room to land",
            },
        ),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(title, title_style.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(detail, Style::default().fg(theme.main_fg))),
        Line::from(Span::styled(
            format!(" Your score: {score} "),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Any key: Continue  Q: Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Bubbletui ", Style::default().fg(theme.title))),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_too_small(frame: &mut Frame, theme: &crate::theme::Theme, area: Rect, w: u16, h: u16) {
    let msg = format!("Terminal too small: need {w}×{h}, have {}×{}", area.width, area.height);
    Paragraph::new(Line::from(Span::styled(msg, Style::default().fg(theme.main_fg))))
        .alignment(Alignment::Center)
        .render(area, frame.buffer_mut());
}
