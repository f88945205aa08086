#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-ball bounce animation running on dedicated threads.
//!
//! Every ball owns one [`BounceAnimator`]. The animator's thread is spawned
//! the first time the ball starts bouncing and then idles when stopped, so
//! resuming is instant. The owner steers it through atomic flags and receives
//! offsets as [`BounceUpdate`] messages over an mpsc channel; the thread never
//! touches board state.

use std::{
    collections::BTreeMap,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use color_lines_core::{BallId, MAX_BOUNCE_OFFSET};
use log::{debug, warn};
use thiserror::Error;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(30);
const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration shared by every animator.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    tick_interval: Duration,
    teardown_timeout: Duration,
}

impl Config {
    /// Creates a configuration with explicit cadence and teardown bound.
    #[must_use]
    pub const fn new(tick_interval: Duration, teardown_timeout: Duration) -> Self {
        Self {
            tick_interval,
            teardown_timeout,
        }
    }

    /// Time between two animation steps.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Longest time an owner waits for an animator thread to exit.
    #[must_use]
    pub const fn teardown_timeout(&self) -> Duration {
        self.teardown_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL, DEFAULT_TEARDOWN_TIMEOUT)
    }
}

/// Offset reported by an animator after one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BounceUpdate {
    /// Ball the animator belongs to.
    pub ball: BallId,
    /// New visual displacement, within `-MAX_BOUNCE_OFFSET..=MAX_BOUNCE_OFFSET`.
    pub offset: i32,
}

/// Errors raised while starting an animator.
#[derive(Debug, Error)]
pub enum AnimatorError {
    /// The operating system refused to spawn the animator thread.
    #[error("could not spawn bounce thread for ball {ball}")]
    Spawn {
        /// Ball whose animator failed to start.
        ball: u32,
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },
}

/// How an animator thread ended when it was torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Teardown {
    /// The thread was never spawned.
    NotStarted,
    /// The thread confirmed its exit and was joined.
    Joined,
    /// The thread did not confirm its exit in time and was detached.
    TimedOut,
}

/// Oscillating offset that reflects at the bounce bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BounceMotion {
    offset: i32,
    direction: i32,
}

impl BounceMotion {
    /// Motion resting at zero and heading upwards.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            offset: 0,
            direction: 1,
        }
    }

    /// Current offset.
    #[must_use]
    pub const fn offset(&self) -> i32 {
        self.offset
    }

    /// Advances one step and returns the new offset.
    pub fn advance(&mut self) -> i32 {
        let next = self.offset + self.direction;
        if next.abs() > MAX_BOUNCE_OFFSET {
            self.direction = -self.direction;
            self.offset += self.direction;
        } else {
            self.offset = next;
        }
        self.offset
    }
}

impl Default for BounceMotion {
    fn default() -> Self {
        Self::new()
    }
}

/// One spawned thread together with the flags only it observes.
///
/// Flags are never shared across spawns, so a thread detached after a
/// timed-out teardown keeps seeing its abort request.
#[derive(Debug)]
struct Worker {
    handle: JoinHandle<()>,
    finished: Receiver<()>,
    bouncing: Arc<AtomicBool>,
    abort: Arc<AtomicBool>,
}

/// Bounce animation unit owned by a single ball.
#[derive(Debug)]
pub struct BounceAnimator {
    ball: BallId,
    config: Config,
    updates: Sender<BounceUpdate>,
    worker: Option<Worker>,
}

impl BounceAnimator {
    /// Creates an idle animator that reports through `updates`.
    #[must_use]
    pub fn new(ball: BallId, config: Config, updates: Sender<BounceUpdate>) -> Self {
        Self {
            ball,
            config,
            updates,
            worker: None,
        }
    }

    /// Ball the animator belongs to.
    #[must_use]
    pub fn ball(&self) -> BallId {
        self.ball
    }

    /// Starts bouncing, spawning the thread on first use. Idempotent.
    pub fn start_bouncing(&mut self) -> Result<(), AnimatorError> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => self.spawn()?,
        };
        worker.bouncing.store(true, Ordering::Release);
        self.worker = Some(worker);
        Ok(())
    }

    /// Stops bouncing while keeping the thread alive. Idempotent.
    pub fn stop_bouncing(&self) {
        if let Some(worker) = &self.worker {
            worker.bouncing.store(false, Ordering::Release);
        }
    }

    /// Reports whether the animator is currently bouncing.
    #[must_use]
    pub fn is_bouncing(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| worker.bouncing.load(Ordering::Acquire))
    }

    /// Reports whether the animator thread has been spawned and not torn down.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Requests thread exit and waits, bounded, for confirmation.
    pub fn shutdown(&mut self) -> Teardown {
        self.request_abort();
        self.await_exit()
    }

    fn request_abort(&self) {
        if let Some(worker) = &self.worker {
            worker.abort.store(true, Ordering::Release);
            worker.bouncing.store(false, Ordering::Release);
        }
    }

    fn await_exit(&mut self) -> Teardown {
        let Some(worker) = self.worker.take() else {
            return Teardown::NotStarted;
        };

        match worker.finished.recv_timeout(self.config.teardown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    warn!("bounce thread for ball {} panicked", self.ball.get());
                }
                Teardown::Joined
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "bounce thread for ball {} did not stop within {:?}; detaching it",
                    self.ball.get(),
                    self.config.teardown_timeout
                );
                Teardown::TimedOut
            }
        }
    }

    fn spawn(&self) -> Result<Worker, AnimatorError> {
        let (finished_tx, finished_rx) = mpsc::channel();
        let ball = self.ball;
        let interval = self.config.tick_interval;
        let bouncing = Arc::new(AtomicBool::new(false));
        let abort = Arc::new(AtomicBool::new(false));
        let thread_bouncing = Arc::clone(&bouncing);
        let thread_abort = Arc::clone(&abort);
        let updates = self.updates.clone();

        let handle = thread::Builder::new()
            .name(format!("bounce-{}", ball.get()))
            .spawn(move || {
                run(ball, interval, &thread_bouncing, &thread_abort, &updates);
                let _ = finished_tx.send(());
            })
            .map_err(|source| AnimatorError::Spawn {
                ball: ball.get(),
                source,
            })?;

        debug!("spawned bounce thread for ball {}", ball.get());
        Ok(Worker {
            handle,
            finished: finished_rx,
            bouncing,
            abort,
        })
    }
}

impl Drop for BounceAnimator {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run(
    ball: BallId,
    interval: Duration,
    bouncing: &AtomicBool,
    abort: &AtomicBool,
    updates: &Sender<BounceUpdate>,
) {
    let mut motion = BounceMotion::new();
    while !abort.load(Ordering::Acquire) {
        if bouncing.load(Ordering::Acquire) {
            let offset = motion.advance();
            if updates.send(BounceUpdate { ball, offset }).is_err() {
                break;
            }
        }
        thread::sleep(interval);
    }
}

/// Registry of animators keyed by ball, owning the shared update channel.
#[derive(Debug)]
pub struct BounceAnimators {
    config: Config,
    animators: BTreeMap<BallId, BounceAnimator>,
    sender: Sender<BounceUpdate>,
    receiver: Receiver<BounceUpdate>,
}

impl BounceAnimators {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            config,
            animators: BTreeMap::new(),
            sender,
            receiver,
        }
    }

    /// Aligns the registry with the balls on the board.
    ///
    /// Missing balls receive an idle animator; animators of balls no longer
    /// present are torn down before this returns. Returns the number of
    /// threads that had to be detached.
    pub fn sync<I>(&mut self, balls: I) -> usize
    where
        I: IntoIterator<Item = BallId>,
    {
        let present: Vec<BallId> = balls.into_iter().collect();
        let stale: Vec<BallId> = self
            .animators
            .keys()
            .copied()
            .filter(|ball| !present.contains(ball))
            .collect();
        let leaked = self.teardown(&stale);

        for ball in present {
            let _ = self
                .animators
                .entry(ball)
                .or_insert_with(|| BounceAnimator::new(ball, self.config, self.sender.clone()));
        }
        leaked
    }

    /// Starts bouncing `ball`, creating its animator if needed.
    pub fn start(&mut self, ball: BallId) -> Result<(), AnimatorError> {
        let config = self.config;
        let sender = &self.sender;
        self.animators
            .entry(ball)
            .or_insert_with(|| BounceAnimator::new(ball, config, sender.clone()))
            .start_bouncing()
    }

    /// Stops bouncing `ball`, if it has an animator.
    pub fn stop(&self, ball: BallId) {
        if let Some(animator) = self.animators.get(&ball) {
            animator.stop_bouncing();
        }
    }

    /// Starts `ball` and stops every other animator.
    pub fn start_only(&mut self, ball: BallId) -> Result<(), AnimatorError> {
        for (id, animator) in &self.animators {
            if *id != ball {
                animator.stop_bouncing();
            }
        }
        self.start(ball)
    }

    /// Stops every animator without tearing any down.
    pub fn stop_all(&self) {
        for animator in self.animators.values() {
            animator.stop_bouncing();
        }
    }

    /// Balls whose animators are currently bouncing.
    #[must_use]
    pub fn bouncing(&self) -> Vec<BallId> {
        self.animators
            .values()
            .filter(|animator| animator.is_bouncing())
            .map(BounceAnimator::ball)
            .collect()
    }

    /// Reports whether `ball` is currently bouncing.
    #[must_use]
    pub fn is_bouncing(&self, ball: BallId) -> bool {
        self.animators
            .get(&ball)
            .is_some_and(BounceAnimator::is_bouncing)
    }

    /// Number of animators held by the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    /// Reports whether the registry holds no animators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    /// Number of animator threads currently alive.
    #[must_use]
    pub fn running(&self) -> usize {
        self.animators
            .values()
            .filter(|animator| animator.is_running())
            .count()
    }

    /// Collects every update delivered since the previous drain.
    #[must_use]
    pub fn drain(&self) -> Vec<BounceUpdate> {
        self.receiver.try_iter().collect()
    }

    /// Tears down every animator and discards updates still in flight.
    ///
    /// Returns the number of threads that had to be detached.
    pub fn shutdown_all(&mut self) -> usize {
        let all: Vec<BallId> = self.animators.keys().copied().collect();
        let leaked = self.teardown(&all);
        let discarded = self.receiver.try_iter().count();
        if discarded > 0 {
            debug!("discarded {discarded} bounce updates after teardown");
        }
        leaked
    }

    fn teardown(&mut self, balls: &[BallId]) -> usize {
        let mut removed: Vec<BounceAnimator> = balls
            .iter()
            .filter_map(|ball| self.animators.remove(ball))
            .collect();

        // Signal every thread before waiting so the waits overlap.
        for animator in &removed {
            animator.request_abort();
        }
        removed
            .iter_mut()
            .map(BounceAnimator::await_exit)
            .filter(|outcome| *outcome == Teardown::TimedOut)
            .count()
    }
}

impl Default for BounceAnimators {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_reflects_within_bounds() {
        let mut motion = BounceMotion::new();
        let offsets: Vec<i32> = (0..12).map(|_| motion.advance()).collect();
        assert_eq!(offsets, vec![1, 2, 3, 4, 5, 4, 3, 2, 1, 0, -1, -2]);

        for _ in 0..100 {
            let offset = motion.advance();
            assert!((-MAX_BOUNCE_OFFSET..=MAX_BOUNCE_OFFSET).contains(&offset));
        }
    }

    #[test]
    fn idle_animator_has_no_thread() {
        let (sender, _receiver) = mpsc::channel();
        let mut animator = BounceAnimator::new(BallId::new(1), Config::default(), sender);
        assert!(!animator.is_running());
        animator.stop_bouncing();
        assert_eq!(animator.shutdown(), Teardown::NotStarted);
    }

    #[test]
    fn sync_creates_and_removes_animators() {
        let mut animators = BounceAnimators::default();
        assert_eq!(animators.sync([BallId::new(1), BallId::new(2)]), 0);
        assert_eq!(animators.len(), 2);

        assert_eq!(animators.sync([BallId::new(2), BallId::new(3)]), 0);
        assert_eq!(animators.len(), 2);
        assert!(!animators.is_bouncing(BallId::new(1)));
        assert_eq!(animators.running(), 0);
    }
}
