//! App: terminal init, main loop, tick, key and mouse handling.

use crate::game::{GameEvent, Session, TickReport};
use crate::input::{Action, Pointer, key_to_action, mouse_to_pointer, rotate_aim};
use crate::theme::Theme;
use crate::ui::{self, PopFade};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// Ticks run back to back at most this many times after a stall (e.g. window drag).
const MAX_CATCH_UP_TICKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    /// Round result shown over the fresh board until a key is pressed.
    Notice(GameEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    args: Args,
    theme: Theme,
    session: Session,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    /// TachyonFX fade for popped and dropped bubbles.
    pop_fade: Option<PopFade>,
    /// Board area from the last frame; maps mouse cells to playfield units.
    board: Rect,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let session = Session::new(config)?;
        Ok(Self {
            args,
            theme,
            session,
            screen: Screen::Playing,
            paused: false,
            last_tick: Instant::now(),
            pop_fade: None,
            board: Rect::default(),
        })
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.args.tick_rate.max(1.0))
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0))
    }

    /// One engine tick; a finished round switches to the notice screen.
    fn step(&mut self) {
        let TickReport {
            popped,
            dropped,
            event,
            ..
        } = self.session.on_tick();
        if let Some(event) = event {
            self.screen = Screen::Notice(event);
            self.pop_fade = None;
            return;
        }
        if self.args.no_animation || (popped.is_empty() && dropped.is_empty()) {
            return;
        }
        let mut cells = popped;
        cells.extend(dropped);
        self.pop_fade = Some(PopFade::new(cells));
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        let action = key_to_action(key);
        if action == Action::Quit {
            return Flow::Quit;
        }
        match self.screen {
            Screen::Notice(_) => {
                self.screen = Screen::Playing;
                self.last_tick = Instant::now();
            }
            Screen::Playing if action == Action::Pause => {
                self.paused = !self.paused;
                self.last_tick = Instant::now();
            }
            Screen::Playing if self.paused => {}
            Screen::Playing => self.apply_action(action),
        }
        Flow::Continue
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::AimLeft => self.turn_aim(-self.args.aim_step),
            Action::AimRight => self.turn_aim(self.args.aim_step),
            Action::Fire => self.session.on_launch_requested(),
            Action::Pause | Action::Quit | Action::None => {}
        }
    }

    fn turn_aim(&mut self, degrees: f32) {
        let (x, y) = rotate_aim(self.session.launcher(), self.session.aim(), degrees);
        self.session.on_aim_update(x, y);
    }

    fn handle_pointer(&mut self, pointer: Pointer) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        match pointer {
            Pointer::Move { column, row } => self.aim_at(column, row),
            Pointer::Click { column, row } => {
                self.aim_at(column, row);
                self.session.on_launch_requested();
            }
            Pointer::None => {}
        }
    }

    fn aim_at(&mut self, column: u16, row: u16) {
        let (x, y) = ui::terminal_to_playfield(self.board, &self.session, column, row);
        self.session.on_aim_update(x, y);
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_tick = Instant::now();
        loop {
            let now = Instant::now();
            let completed = terminal.draw(|f| {
                ui::draw(
                    f,
                    self.screen,
                    &self.session,
                    &self.theme,
                    self.paused,
                    &mut self.pop_fade,
                    now,
                    self.args.no_animation,
                )
            })?;
            self.board = ui::board_rect(completed.area, &self.session);

            if self.pop_fade.as_ref().is_some_and(PopFade::done) {
                self.pop_fade = None;
            }

            let tick_interval = self.tick_interval();
            let until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
            let timeout = self
                .frame_interval()
                .saturating_sub(now.elapsed())
                .min(until_tick);

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let flow = match event::read()? {
                        Event::Key(key) => self.handle_key(key),
                        Event::Mouse(mouse) => {
                            self.handle_pointer(mouse_to_pointer(mouse));
                            Flow::Continue
                        }
                        _ => Flow::Continue,
                    };
                    if flow == Flow::Quit {
                        return Ok(());
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                let mut ticks = 0;
                while self.last_tick.elapsed() >= tick_interval {
                    self.last_tick += tick_interval;
                    self.step();
                    ticks += 1;
                    if self.screen != Screen::Playing {
                        break;
                    }
                    if ticks >= MAX_CATCH_UP_TICKS {
                        self.last_tick = Instant::now();
                        break;
                    }
                }
            }
        }
    }
}
