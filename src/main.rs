//! Bubbletui: bubble-shooter arcade puzzle game in the terminal.

mod app;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use game::{BubbleColor, SnapPolicy};
use thiserror::Error;

/// Engine options derived from the CLI (grid size, bubble radius, palette, speed, etc.).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    /// Bubble radius in playfield units.
    pub radius: f32,
    pub palette: Vec<BubbleColor>,
    /// Playfield units per tick.
    pub launch_speed: f32,
    pub top_filled_rows: usize,
    /// Fixed RNG seed; entropy when `None`.
    pub seed: Option<u64>,
    pub snap_policy: SnapPolicy,
}

/// Largest rows or columns; keeps the board within `u16` terminal cells.
pub const MAX_GRID_SIDE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("grid needs at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("grid is too large (got {rows}x{cols}, at most {max} per side)")]
    GridTooLarge { rows: usize, cols: usize, max: usize },
    #[error("bubble radius must be a positive number")]
    InvalidRadius,
    #[error("launch speed must be a positive number")]
    InvalidLaunchSpeed,
    #[error("palette needs at least one colour")]
    EmptyPalette,
    #[error("top filled rows ({filled}) must be less than rows ({rows})")]
    TooManyFilledRows { filled: usize, rows: usize },
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.rows > MAX_GRID_SIDE || self.cols > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                rows: self.rows,
                cols: self.cols,
                max: MAX_GRID_SIDE,
            });
        }
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ConfigError::InvalidRadius);
        }
        if !self.launch_speed.is_finite() || self.launch_speed <= 0.0 {
            return Err(ConfigError::InvalidLaunchSpeed);
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.top_filled_rows >= self.rows {
            return Err(ConfigError::TooManyFilledRows {
                filled: self.top_filled_rows,
                rows: self.rows,
            });
        }
        Ok(())
    }
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        let mut palette: Vec<BubbleColor> = Vec::with_capacity(args.colors.len());
        for &color in &args.colors {
            if !palette.contains(&color) {
                palette.push(color);
            }
        }
        Self {
            rows: args.rows,
            cols: args.cols,
            radius: args.radius,
            palette,
            launch_speed: args.launch_speed,
            top_filled_rows: args.top_filled_rows,
            seed: args.seed,
            snap_policy: if args.forgiving_snap {
                SnapPolicy::NearestFree
            } else {
                SnapPolicy::Strict
            },
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|err| {
        log::warn!("theme not loaded, using defaults: {err}");
        theme::Theme::default_for_palette(args.palette)
    });
    let config = GameConfig::from(&args);
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Bubble-shooter puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "bubbletui",
    version,
    about = "Bubble-shooter arcade puzzle in the terminal. Aim, fire, and pop groups of three or more.",
    long_about = "Bubbletui is a terminal bubble shooter.\n\n\
        Aim the launcher and fire a bubble. It flies until it hits the ceiling or another bubble \
        and snaps into the grid. Three or more touching bubbles of the same colour pop; anything \
        left hanging falls. Clear the board to win; a bubble in the bottom row ends the game.\n\n\
        CONTROLS:\n  Mouse       Aim (move) and fire (left click)\n  Left/Right  Rotate aim   \
        Space/Enter Fire\n  P           Pause        Q / Esc     Quit\n\n\
        Mouse aiming needs a terminal with mouse reporting. Use --theme to load a btop-style theme."
)]
pub struct Args {
    /// Grid rows. The last row is the loss line.
    #[arg(long, default_value = "12", value_name = "ROWS")]
    pub rows: usize,

    /// Grid columns.
    #[arg(long, default_value = "20", value_name = "COLS")]
    pub cols: usize,

    /// Bubble radius in playfield units (one cell is two radii wide).
    #[arg(long, default_value = "20.0", value_name = "UNITS")]
    pub radius: f32,

    /// Bubble colours in play (comma-separated).
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "red,green,blue,yellow,purple",
        value_name = "COLORS"
    )]
    pub colors: Vec<BubbleColor>,

    /// Projectile speed in playfield units per tick.
    #[arg(long, default_value = "10.0", value_name = "UNITS")]
    pub launch_speed: f32,

    /// Rows filled with bubbles at the start of each round.
    #[arg(long, default_value = "5", value_name = "N")]
    pub top_filled_rows: usize,

    /// RNG seed for reproducible boards.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// When the snap cell is taken, settle in the nearest free cell instead of ending the game.
    #[arg(long)]
    pub forgiving_snap: bool,

    /// Keyboard aim step in degrees.
    #[arg(long, default_value = "3.0", value_name = "DEG")]
    pub aim_step: f32,

    /// Game logic ticks per second (projectile motion).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the pop fade animation.
    #[arg(long)]
    pub no_animation: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
