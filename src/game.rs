//! Game state: bubble grid, shooter, settle resolution, score.

mod cluster;
mod collision;
mod grid;
mod projectile;

pub use collision::SnapPolicy;
pub use grid::{BubbleColor, Cell, Grid};
pub use projectile::Projectile;

use crate::{ConfigError, GameConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Extra rows below the grid for the launcher.
pub const LAUNCH_ZONE_ROWS: usize = 2;

/// Smallest same-colour cluster that pops.
const POP_THRESHOLD: usize = 3;

/// Score per popped bubble. Dropped (floating) bubbles score nothing.
const POINTS_PER_BUBBLE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossCause {
    /// The snap target was already taken.
    OccupiedTarget,
    /// A bubble is left in the last grid row.
    ReachedBottom,
}

/// Round-ending events. The session has already restarted when one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Win { score: u32 },
    GameOver { score: u32, cause: LossCause },
}

/// What happened during one tick. Grid, projectile and counters are read
/// from the [`Session`] itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Score after the tick; 0 once a round has ended and restarted.
    pub score: u32,
    /// Cell the projectile settled into.
    pub settled_at: Option<(usize, usize)>,
    /// Same-colour cluster removed by this shot.
    pub popped: Vec<Cell>,
    /// Bubbles that lost their connection to the ceiling.
    pub dropped: Vec<Cell>,
    pub event: Option<GameEvent>,
}

/// One play session: grid, shooter and score.
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    pub grid: Grid,
    pub projectile: Projectile,
    /// Colour loaded after the current projectile settles.
    pub upcoming: BubbleColor,
    aim: (f32, f32),
    launch_requested: bool,
    pub score: u32,
    /// Highest score reached in this run (not persisted).
    pub best_score: u32,
    pub wins: u32,
    pub losses: u32,
    rng: StdRng,
}

impl Session {
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let mut grid = Grid::new(config.rows, config.cols, config.radius);
        grid.initialize(config.top_filled_rows, &config.palette, &mut rng);

        let first = pick_color(&config.palette, &mut rng);
        let upcoming = pick_color(&config.palette, &mut rng);
        let (lx, ly) = launcher_position(&config);
        log::info!(
            "new session: {}x{} grid, {} colours, seed {:?}",
            config.rows,
            config.cols,
            config.palette.len(),
            config.seed
        );
        Ok(Self {
            projectile: Projectile::ready(lx, ly, first),
            upcoming,
            aim: (lx, 0.0),
            launch_requested: false,
            grid,
            score: 0,
            best_score: 0,
            wins: 0,
            losses: 0,
            rng,
            config,
        })
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.config.cols as f32 * self.config.radius * 2.0
    }

    #[inline]
    pub fn height(&self) -> f32 {
        (self.config.rows + LAUNCH_ZONE_ROWS) as f32 * self.config.radius * 2.0
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.config.radius
    }

    pub fn palette(&self) -> &[BubbleColor] {
        &self.config.palette
    }

    /// Launcher centre: horizontally centred, one radius above the bottom edge.
    pub fn launcher(&self) -> (f32, f32) {
        (self.width() / 2.0, self.height() - self.config.radius)
    }

    pub fn aim(&self) -> (f32, f32) {
        self.aim
    }

    /// A projectile is in flight.
    pub fn is_shooting(&self) -> bool {
        self.projectile.active
    }

    /// Move the aim target. Ignored while a shot is in flight.
    pub fn on_aim_update(&mut self, x: f32, y: f32) {
        if self.is_shooting() || !x.is_finite() || !y.is_finite() {
            return;
        }
        self.aim = (x, y);
    }

    /// Request a shot; it leaves on the next tick. Ignored while in flight.
    pub fn on_launch_requested(&mut self) {
        if !self.is_shooting() {
            self.launch_requested = true;
        }
    }

    /// Launch if requested, move the projectile and resolve any contact.
    /// The report holds this tick's changes and the current score.
    pub fn on_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if std::mem::take(&mut self.launch_requested) {
            let (ax, ay) = self.aim;
            self.projectile.launch(ax, ay, self.config.launch_speed);
        }
        if !self.projectile.active {
            report.score = self.score;
            return report;
        }

        let width = self.width();
        self.projectile.advance(1.0);
        collision::bounce_walls(&mut self.projectile, width, self.config.radius);
        if let Some(contact) = collision::detect_contact(&self.grid, &self.projectile) {
            self.settle(contact, &mut report);
        }
        report.score = self.score;
        report
    }

    fn settle(&mut self, contact: collision::Contact, report: &mut TickReport) {
        self.projectile.active = false;
        let color = self.projectile.color;
        let placed = collision::snap_target(
            &self.grid,
            &self.projectile,
            contact,
            self.config.snap_policy,
        )
        .and_then(|(row, col)| self.grid.place(row, col, color).map(|()| (row, col)));
        let (row, col) = match placed {
            Ok(target) => target,
            Err(err) => {
                log::debug!("placement failed after {contact:?}: {err}");
                self.end_round(
                    GameEvent::GameOver {
                        score: self.score,
                        cause: LossCause::OccupiedTarget,
                    },
                    report,
                );
                return;
            }
        };
        log::debug!(
            "settled {color:?} at ({row}, {col}) after {contact:?}, {} on board",
            self.grid.live_count()
        );
        report.settled_at = Some((row, col));

        let cluster = cluster::connected_same_color(&self.grid, row, col, color);
        if cluster.len() >= POP_THRESHOLD {
            report.popped = self.remove_all(&cluster);
            self.add_score(cluster.len() as u32 * POINTS_PER_BUBBLE);
            log::debug!("popped {} bubbles, score {}", cluster.len(), self.score);
        }
        report.dropped = self.drop_floating();

        if self.grid.is_empty() {
            self.end_round(GameEvent::Win { score: self.score }, report);
        } else if self.grid.bottom_row_occupied() {
            self.end_round(
                GameEvent::GameOver {
                    score: self.score,
                    cause: LossCause::ReachedBottom,
                },
                report,
            );
        } else {
            self.load_next();
        }
    }

    /// Remove every bubble not connected to row 0. Returns what fell.
    pub fn drop_floating(&mut self) -> Vec<Cell> {
        let floating = cluster::floating(&self.grid);
        self.remove_all(&floating)
    }

    fn remove_all(&mut self, keys: &[(usize, usize)]) -> Vec<Cell> {
        keys.iter()
            .filter_map(|&(row, col)| self.grid.remove(row, col))
            .collect()
    }

    fn add_score(&mut self, amount: u32) {
        self.score = self.score.saturating_add(amount);
        self.best_score = self.best_score.max(self.score);
    }

    fn end_round(&mut self, event: GameEvent, report: &mut TickReport) {
        match event {
            GameEvent::Win { score } => {
                self.wins += 1;
                log::info!("board cleared, score {score}");
            }
            GameEvent::GameOver { score, cause } => {
                self.losses += 1;
                log::info!("game over ({cause:?}), score {score}");
            }
        }
        report.event = Some(event);
        self.restart();
    }

    /// Refill the grid and reset the score; counters and best score stay.
    pub fn restart(&mut self) {
        self.grid
            .initialize(self.config.top_filled_rows, &self.config.palette, &mut self.rng);
        self.score = 0;
        self.launch_requested = false;
        self.load_next();
    }

    /// Put the upcoming colour on the launcher and draw a new upcoming one.
    fn load_next(&mut self) {
        let (lx, ly) = self.launcher();
        let next = pick_color(&self.config.palette, &mut self.rng);
        let color = std::mem::replace(&mut self.upcoming, next);
        self.projectile = Projectile::ready(lx, ly, color);
    }
}

fn launcher_position(config: &GameConfig) -> (f32, f32) {
    let d = config.radius * 2.0;
    let width = config.cols as f32 * d;
    let height = (config.rows + LAUNCH_ZONE_ROWS) as f32 * d;
    (width / 2.0, height - config.radius)
}

/// Uniform draw from a non-empty palette (validated by [`GameConfig::validate`]).
fn pick_color<R: Rng>(palette: &[BubbleColor], rng: &mut R) -> BubbleColor {
    palette
        .get(rng.gen_range(0..palette.len().max(1)))
        .copied()
        .unwrap_or(BubbleColor::Red)
}
