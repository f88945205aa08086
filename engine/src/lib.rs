#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn state machine tying the board and the gameplay systems together.
//!
//! [`GameEngine`] is the only writer of the [`World`]. Player input arrives
//! through [`GameEngine::cell_clicked`], time through [`GameEngine::advance`],
//! and animator output through [`GameEngine::pump_animations`]. Every board
//! mutation flows through `world::apply`, and the resulting events queue up
//! until the presentation layer calls [`GameEngine::drain_events`].

use std::time::Duration;

use color_lines_core::{
    BallColor, BallId, BoardError, CellCoord, Command, Event, GameSnapshot, Placement, CELL_COUNT,
    PALETTE,
};
use color_lines_system_bounce::{self as bounce, BounceAnimators};
use color_lines_system_matching::MatchDetector;
use color_lines_system_movement::{self as movement, MoveProgress, MovementController};
use color_lines_system_pathfinding::Pathfinder;
use color_lines_system_spawning::{self as spawning, Spawning, BALLS_PER_TURN};
use color_lines_world::{self as world, query, World};
use log::{debug, error, info, warn};
use rand::{
    seq::{index, SliceRandom},
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Balls placed on the board by a fresh game.
pub const STARTING_BALLS: [(CellCoord, BallColor); 3] = [
    (CellCoord::new(2, 2), BallColor::RED),
    (CellCoord::new(5, 5), BallColor::GREEN),
    (CellCoord::new(8, 8), BallColor::BLUE),
];

const DEFAULT_RNG_SEED: u64 = 0x0c01_0e11_5eed_0001;
const LAYOUT_STREAM: u64 = 1;

/// Configuration aggregated from every system the engine drives.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    rng_seed: u64,
    movement: movement::Config,
    bounce: bounce::Config,
}

impl EngineConfig {
    /// Creates a configuration using `rng_seed` and default system settings.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            movement: movement::Config::default(),
            bounce: bounce::Config::default(),
        }
    }

    /// Replaces the movement cadence.
    #[must_use]
    pub fn with_step_interval(mut self, step_interval: Duration) -> Self {
        self.movement = movement::Config::new(step_interval);
        self
    }

    /// Replaces the bounce animator settings.
    #[must_use]
    pub fn with_bounce(mut self, bounce: bounce::Config) -> Self {
        self.bounce = bounce;
        self
    }

    /// Seed shared by spawning and randomization.
    #[must_use]
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_RNG_SEED)
    }
}

/// Turn state of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// No ball is selected.
    NoSelection,
    /// The player selected a ball, which is bouncing.
    Selected(BallId),
    /// The ball is walking along its path; clicks are ignored.
    Moving(BallId),
}

/// Result of a click on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click had no effect.
    Ignored,
    /// The clicked ball became the selection.
    Selected(BallId),
    /// The clicked ball was already selected and got deselected.
    Deselected(BallId),
    /// The clicked cell is not reachable by the selected ball.
    NoPath,
    /// The selected ball started walking towards the clicked cell.
    MoveStarted {
        /// Ball that started moving.
        ball: BallId,
        /// Cells visited by the move, both ends included.
        path: Vec<CellCoord>,
    },
}

/// Errors surfaced by the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine was closed and refuses further input.
    #[error("the game engine has been closed")]
    Closed,
    /// A board operation was rejected.
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// Authoritative game session.
#[derive(Debug)]
pub struct GameEngine {
    world: World,
    state: TurnState,
    pathfinder: Pathfinder,
    movement: MovementController,
    matcher: MatchDetector,
    spawning: Spawning,
    animators: BounceAnimators,
    layout_rng: ChaCha8Rng,
    events: Vec<Event>,
    closed: bool,
}

impl GameEngine {
    /// Creates an engine holding the starting layout.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut layout_rng = ChaCha8Rng::seed_from_u64(config.rng_seed);
        layout_rng.set_stream(LAYOUT_STREAM);

        let mut engine = Self {
            world: World::new(),
            state: TurnState::NoSelection,
            pathfinder: Pathfinder::new(),
            movement: MovementController::new(config.movement),
            matcher: MatchDetector::new(),
            spawning: Spawning::new(spawning::Config::new(config.rng_seed)),
            animators: BounceAnimators::new(config.bounce),
            layout_rng,
            events: Vec::new(),
            closed: false,
        };
        engine.reset_board();
        engine
    }

    /// Handles a click on `cell`.
    pub fn cell_clicked(&mut self, cell: CellCoord) -> Result<ClickOutcome, EngineError> {
        self.ensure_open()?;

        if matches!(self.state, TurnState::Moving(_)) || !cell.is_on_board() {
            return Ok(ClickOutcome::Ignored);
        }

        if let Some(clicked) = query::ball_at(&self.world, cell) {
            let ball = clicked.id;
            if self.state == TurnState::Selected(ball) {
                self.animators.stop(ball);
                self.set_state(TurnState::NoSelection);
                return Ok(ClickOutcome::Deselected(ball));
            }
            self.start_bouncing_only(ball);
            self.set_state(TurnState::Selected(ball));
            return Ok(ClickOutcome::Selected(ball));
        }

        let TurnState::Selected(ball) = self.state else {
            return Ok(ClickOutcome::Ignored);
        };
        let Some(source) = query::ball(&self.world, ball).map(|snapshot| snapshot.cell) else {
            error!("selected ball {} is missing from the board", ball.get());
            self.set_state(TurnState::NoSelection);
            return Ok(ClickOutcome::Ignored);
        };

        let path =
            self.pathfinder
                .find_path(query::occupancy_view(&self.world), source, cell, ball);
        if path.is_empty() {
            debug!(
                "no path for ball {} to ({}, {})",
                ball.get(),
                cell.row(),
                cell.column()
            );
            return Ok(ClickOutcome::NoPath);
        }

        self.animators.stop(ball);
        let _ = self.movement.start_move(ball, path.clone());
        self.set_state(TurnState::Moving(ball));
        self.events.push(Event::MoveStarted {
            ball,
            path: path.clone(),
        });
        Ok(ClickOutcome::MoveStarted { ball, path })
    }

    /// Advances the clock by `dt`, running every movement tick that became due.
    ///
    /// Returns the number of ticks that ran.
    pub fn advance(&mut self, dt: Duration) -> Result<usize, EngineError> {
        self.ensure_open()?;
        let due = self.movement.due_ticks(dt);
        for _ in 0..due {
            let _ = self.tick()?;
        }
        Ok(due)
    }

    /// Runs a single movement tick regardless of elapsed time.
    pub fn tick(&mut self) -> Result<MoveProgress, EngineError> {
        self.ensure_open()?;
        let mut commands = Vec::new();
        let progress = self.movement.tick(&mut commands);
        let _ = self.execute_all(commands);
        if let MoveProgress::Arrived { ball } = progress {
            self.finish_move(ball);
        }
        Ok(progress)
    }

    /// Applies every bounce offset reported by the animators since the last call.
    ///
    /// Returns the number of updates consumed.
    pub fn pump_animations(&mut self) -> usize {
        let updates = self.animators.drain();
        let count = updates.len();
        for update in updates {
            let _ = self.execute(Command::SetBounceOffset {
                ball: update.ball,
                offset: update.offset,
            });
        }
        count
    }

    /// Starts a new game with the starting layout and a zero score.
    pub fn restart(&mut self) -> Result<(), EngineError> {
        self.ensure_open()?;
        info!("restarting game");
        self.reset_board();
        Ok(())
    }

    /// Scatters the balls on the board to random cells with fresh colors.
    ///
    /// Identifiers are kept. Colors are drawn from the palette without
    /// repetition until it runs out, then from a reshuffled palette.
    pub fn randomize(&mut self) -> Result<(), EngineError> {
        self.ensure_open()?;
        self.stop_everything();

        let balls = query::ball_view(&self.world);
        let cells = index::sample(&mut self.layout_rng, CELL_COUNT, balls.len());
        let mut deck: Vec<BallColor> = Vec::with_capacity(PALETTE.len());
        let mut placements = Vec::with_capacity(balls.len());
        for (snapshot, slot) in balls.iter().zip(cells.iter()) {
            if deck.is_empty() {
                deck.extend_from_slice(&PALETTE);
                deck.shuffle(&mut self.layout_rng);
            }
            let Some(cell) = CellCoord::from_index(slot) else {
                continue;
            };
            placements.push(Placement {
                ball: snapshot.id,
                cell,
                color: deck.pop().unwrap_or(BallColor::RED),
            });
        }

        info!("randomizing {} balls", placements.len());
        let _ = self.execute(Command::Rearrange { placements });
        self.set_state(TurnState::NoSelection);
        self.sync_animators();
        Ok(())
    }

    /// Shuts every animator down; the engine refuses input afterwards.
    ///
    /// Returns the number of animator threads that had to be detached.
    pub fn close(&mut self) -> usize {
        if self.closed {
            return 0;
        }
        self.closed = true;
        let _ = self.movement.abort();
        let leaked = self.animators.shutdown_all();
        if leaked > 0 {
            warn!("{leaked} bounce threads were detached while closing");
        }
        info!("game engine closed");
        leaked
    }

    /// Captures the persistable state of the game.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let mut snapshot = query::snapshot(&self.world);
        snapshot.selected = self.selected();
        snapshot.moving = self.moving_ball();
        snapshot
    }

    /// Replaces the game with `snapshot`.
    ///
    /// The snapshot is validated before anything is torn down, so a rejected
    /// snapshot leaves the running game untouched. A ball stored as moving is
    /// restored as the selection.
    pub fn restore(&mut self, snapshot: &GameSnapshot) -> Result<(), EngineError> {
        self.ensure_open()?;
        let restored = World::from_snapshot(snapshot)?;

        self.stop_everything();
        self.world = restored;
        self.events.push(Event::BoardCleared);
        for ball in query::ball_view(&self.world).iter() {
            self.events.push(Event::BallSpawned {
                ball: ball.id,
                cell: ball.cell,
                color: ball.color,
            });
        }
        self.events.push(Event::ScoreChanged {
            score: query::score(&self.world),
        });

        self.sync_animators();
        let selection = snapshot
            .moving
            .or(snapshot.selected)
            .filter(|ball| query::ball(&self.world, *ball).is_some());
        match selection {
            Some(ball) => {
                self.start_bouncing_only(ball);
                self.set_state(TurnState::Selected(ball));
            }
            None => self.set_state(TurnState::NoSelection),
        }
        info!(
            "restored game with {} balls",
            query::ball_count(&self.world)
        );
        Ok(())
    }

    /// Takes every event queued since the previous drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Current turn state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Read-only access to the board.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Ball chosen by the player, including while it moves.
    #[must_use]
    pub fn selected(&self) -> Option<BallId> {
        match self.state {
            TurnState::NoSelection => None,
            TurnState::Selected(ball) | TurnState::Moving(ball) => Some(ball),
        }
    }

    /// Ball walking along a path, if any.
    #[must_use]
    pub fn moving_ball(&self) -> Option<BallId> {
        self.movement.moving_ball()
    }

    /// Balls whose animators are currently bouncing.
    #[must_use]
    pub fn bouncing(&self) -> Vec<BallId> {
        self.animators.bouncing()
    }

    /// Reports whether [`GameEngine::close`] was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.closed {
            Err(EngineError::Closed)
        } else {
            Ok(())
        }
    }

    fn reset_board(&mut self) {
        self.stop_everything();
        let _ = self.execute(Command::ClearBoard);
        let _ = self.execute(Command::ResetScore);
        for (cell, color) in STARTING_BALLS {
            let _ = self.execute(Command::SpawnBall { cell, color });
        }
        self.set_state(TurnState::NoSelection);
        self.sync_animators();
    }

    fn finish_move(&mut self, ball: BallId) {
        self.start_bouncing_only(ball);
        self.set_state(TurnState::Selected(ball));
        if let Some(arrived) = query::ball(&self.world, ball) {
            self.events.push(Event::MoveFinished {
                ball,
                cell: arrived.cell,
            });
        }

        // New balls land before lines are checked, so a spawn can complete a line.
        self.spawn_turn();
        self.clear_lines();
    }

    fn spawn_turn(&mut self) {
        let mut commands = Vec::new();
        let spawned = self.spawning.handle(
            BALLS_PER_TURN,
            &query::ball_view(&self.world),
            query::occupancy_view(&self.world),
            &mut commands,
        );
        debug!("spawning {spawned} balls");
        let _ = self.execute_all(commands);
        self.sync_animators();
    }

    fn clear_lines(&mut self) {
        let balls = query::ball_view(&self.world);
        let mut commands = Vec::new();
        let cells = self.matcher.handle(&balls, &mut commands);
        if cells.is_empty() {
            return;
        }

        let doomed: Vec<BallId> = commands
            .iter()
            .filter_map(|command| match command {
                Command::RemoveBall { ball } => Some(*ball),
                _ => None,
            })
            .collect();
        // Animators go first so none reports on a ball that no longer exists.
        let leaked = self.animators.sync(
            balls
                .iter()
                .map(|snapshot| snapshot.id)
                .filter(|ball| !doomed.contains(ball)),
        );
        report_detached(leaked);

        let removed = self.execute_all(commands);
        if let Some(selected) = self.selected() {
            if doomed.contains(&selected) {
                self.set_state(TurnState::NoSelection);
            }
        }
        let points = u32::try_from(removed).unwrap_or(u32::MAX);
        let _ = self.execute(Command::AwardPoints { points });
        info!("cleared {} balls", cells.len());
        self.events.push(Event::LinesCleared { cells });
    }

    fn stop_everything(&mut self) {
        if let Some(ball) = self.movement.abort() {
            debug!("abandoning move of ball {}", ball.get());
        }
        report_detached(self.animators.shutdown_all());
    }

    fn start_bouncing_only(&mut self, ball: BallId) {
        if let Err(error) = self.animators.start_only(ball) {
            error!("{error}");
        }
    }

    fn sync_animators(&mut self) {
        let balls = query::ball_view(&self.world);
        report_detached(self.animators.sync(balls.iter().map(|snapshot| snapshot.id)));
    }

    fn set_state(&mut self, state: TurnState) {
        let before = self.selected();
        self.state = state;
        let after = self.selected();
        if before != after {
            self.events.push(Event::SelectionChanged { selected: after });
        }
    }

    fn execute_all(&mut self, commands: Vec<Command>) -> usize {
        let mut applied = 0;
        for command in commands {
            if self.execute(command) {
                applied += 1;
            }
        }
        applied
    }

    fn execute(&mut self, command: Command) -> bool {
        match world::apply(&mut self.world, command, &mut self.events) {
            Ok(()) => true,
            Err(error) => {
                error!("board rejected command: {error}");
                false
            }
        }
    }
}

fn report_detached(leaked: usize) {
    if leaked > 0 {
        warn!("{leaked} bounce threads were detached");
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Drop for GameEngine {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
