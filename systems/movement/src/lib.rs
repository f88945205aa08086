#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven movement system that walks a ball along a precomputed path.

use std::time::Duration;

use color_lines_core::{BallId, CellCoord, Command};
use log::debug;

const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(150);

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    step_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided step cadence.
    #[must_use]
    pub const fn new(step_interval: Duration) -> Self {
        Self { step_interval }
    }

    /// Simulated time between two consecutive steps.
    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        self.step_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_INTERVAL)
    }
}

/// Result of advancing the controller by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveProgress {
    /// No move is in progress.
    Idle,
    /// The moving ball was sent one cell further along its path.
    Stepped {
        /// Ball that moved.
        ball: BallId,
        /// Cell the ball was sent to.
        to: CellCoord,
    },
    /// The path was exhausted and the controller returned to idle.
    Arrived {
        /// Ball that finished its move.
        ball: BallId,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum MovementState {
    Idle,
    Moving {
        ball: BallId,
        path: Vec<CellCoord>,
        step: usize,
    },
}

/// State machine that advances one ball along its path, one cell per tick.
///
/// The controller never touches the board directly: every step is emitted as
/// a [`Command::MoveBall`] for the caller to apply.
#[derive(Debug)]
pub struct MovementController {
    step_interval: Duration,
    accumulator: Duration,
    state: MovementState,
}

impl MovementController {
    /// Creates an idle controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            step_interval: config.step_interval,
            accumulator: Duration::ZERO,
            state: MovementState::Idle,
        }
    }

    /// Begins walking `ball` along `path`.
    ///
    /// The first cell is the ball's current position, so stepping starts at
    /// index one. A move already in progress is aborted first and its ball is
    /// returned. Empty paths are ignored.
    pub fn start_move(&mut self, ball: BallId, path: Vec<CellCoord>) -> Option<BallId> {
        if path.is_empty() {
            debug!("ignoring empty path for ball {}", ball.get());
            return None;
        }

        let aborted = self.abort();
        debug!(
            "ball {} starts a move of {} cells",
            ball.get(),
            path.len().saturating_sub(1)
        );
        self.state = MovementState::Moving {
            ball,
            path,
            step: 1,
        };
        aborted
    }

    /// Cancels the move in progress, returning the ball that was moving.
    pub fn abort(&mut self) -> Option<BallId> {
        self.accumulator = Duration::ZERO;
        match std::mem::replace(&mut self.state, MovementState::Idle) {
            MovementState::Idle => None,
            MovementState::Moving { ball, .. } => {
                debug!("aborting move of ball {}", ball.get());
                Some(ball)
            }
        }
    }

    /// Ball currently walking along a path, if any.
    #[must_use]
    pub fn moving_ball(&self) -> Option<BallId> {
        match &self.state {
            MovementState::Idle => None,
            MovementState::Moving { ball, .. } => Some(*ball),
        }
    }

    /// Reports whether a move is in progress.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.moving_ball().is_some()
    }

    /// Path of the move in progress, or an empty slice when idle.
    #[must_use]
    pub fn path(&self) -> &[CellCoord] {
        match &self.state {
            MovementState::Idle => &[],
            MovementState::Moving { path, .. } => path,
        }
    }

    /// Accumulates elapsed time and reports how many ticks became due.
    ///
    /// Time does not accrue while idle.
    pub fn due_ticks(&mut self, dt: Duration) -> usize {
        if !self.is_moving() || self.step_interval.is_zero() {
            self.accumulator = Duration::ZERO;
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut ticks = 0;
        while self.accumulator >= self.step_interval {
            self.accumulator -= self.step_interval;
            ticks += 1;
        }
        ticks
    }

    /// Advances the move in progress by a single tick.
    pub fn tick(&mut self, out: &mut Vec<Command>) -> MoveProgress {
        let MovementState::Moving { ball, path, step } = &mut self.state else {
            return MoveProgress::Idle;
        };
        let ball = *ball;

        let Some(&to) = path.get(*step) else {
            self.state = MovementState::Idle;
            self.accumulator = Duration::ZERO;
            debug!("ball {} arrived", ball.get());
            return MoveProgress::Arrived { ball };
        };

        *step += 1;
        out.push(Command::MoveBall { ball, to });
        MoveProgress::Stepped { ball, to }
    }
}

impl Default for MovementController {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
