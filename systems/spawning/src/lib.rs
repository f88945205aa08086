#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Seeded spawning system responsible for emitting ball spawn commands.

use color_lines_core::{BallColor, BallView, Command, OccupancyView};
use log::debug;
use rand::{
    seq::{index, SliceRandom},
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;

/// Number of balls added after every completed move.
pub const BALLS_PER_TURN: usize = 3;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that picks empty cells and colors for new balls.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Emits up to `count` spawn commands targeting distinct empty cells.
    ///
    /// Cells are drawn uniformly without replacement. When fewer cells are
    /// free than requested, every free cell is filled and the shortfall is
    /// silently dropped. Colors are drawn uniformly from the colors already on
    /// the board, falling back to red when it is empty. Returns the number of
    /// commands emitted.
    pub fn handle(
        &mut self,
        count: usize,
        balls: &BallView,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) -> usize {
        let empty = occupancy.empty_cells();
        let amount = count.min(empty.len());
        if amount < count {
            debug!("only {amount} of {count} requested balls fit on the board");
        }
        if amount == 0 {
            return 0;
        }

        let colors = balls.distinct_colors();
        let chosen = index::sample(&mut self.rng, empty.len(), amount);
        for slot in chosen.iter() {
            let color = colors
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(BallColor::RED);
            out.push(Command::SpawnBall {
                cell: empty[slot],
                color,
            });
        }
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_lines_core::{BallId, CellCoord, CELL_COUNT};

    #[test]
    fn empty_board_spawns_red_balls() {
        let mut spawning = Spawning::new(Config::new(7));
        let cells = vec![None; CELL_COUNT];
        let mut commands = Vec::new();

        let emitted = spawning.handle(3, &BallView::default(), OccupancyView::new(&cells), &mut commands);

        assert_eq!(emitted, 3);
        for command in &commands {
            match command {
                Command::SpawnBall { color, .. } => assert_eq!(*color, BallColor::RED),
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
    }

    #[test]
    fn full_board_spawns_nothing() {
        let mut spawning = Spawning::new(Config::new(7));
        let cells = vec![Some(BallId::new(0)); CELL_COUNT];
        let mut commands = Vec::new();

        let emitted = spawning.handle(3, &BallView::default(), OccupancyView::new(&cells), &mut commands);

        assert_eq!(emitted, 0);
        assert!(commands.is_empty());
    }

    #[test]
    fn chosen_cells_are_distinct() {
        let mut spawning = Spawning::new(Config::new(0xdead_beef));
        let cells = vec![None; CELL_COUNT];
        let mut commands = Vec::new();

        let _ = spawning.handle(40, &BallView::default(), OccupancyView::new(&cells), &mut commands);

        let mut targets: Vec<CellCoord> = commands
            .iter()
            .filter_map(|command| match command {
                Command::SpawnBall { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect();
        targets.sort();
        targets.dedup();
        assert_eq!(targets.len(), 40);
    }
}
