#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that detects completed lines of same-colored balls.

use std::collections::BTreeSet;

use color_lines_core::{BallColor, BallView, CellCoord, Command, CELL_COUNT};

/// Shortest run of same-colored balls that clears.
pub const MIN_RUN_LENGTH: usize = 5;

/// Directions scanned from every cell: right, down, down-right, down-left.
const SCAN_DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Scans the board for runs of at least [`MIN_RUN_LENGTH`] equal colors.
#[derive(Debug, Default)]
pub struct MatchDetector {
    colors: Vec<Option<BallColor>>,
}

impl MatchDetector {
    /// Creates a detector with an empty color grid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            colors: vec![None; CELL_COUNT],
        }
    }

    /// Collects every cell that belongs to a qualifying run.
    ///
    /// Horizontal, vertical and both diagonal lines are considered. A cell
    /// that belongs to several runs appears once.
    pub fn find_completed_lines(&mut self, balls: &BallView) -> BTreeSet<CellCoord> {
        self.rebuild(balls);

        let mut completed = BTreeSet::new();
        let mut run = Vec::with_capacity(CELL_COUNT);
        for origin in CellCoord::all() {
            let Some(color) = self.color_at(origin) else {
                continue;
            };

            for (row_delta, column_delta) in SCAN_DIRECTIONS {
                run.clear();
                run.push(origin);
                let mut cursor = origin;
                while let Some(next) = cursor.offset(row_delta, column_delta) {
                    if self.color_at(next) != Some(color) {
                        break;
                    }
                    run.push(next);
                    cursor = next;
                }

                if run.len() >= MIN_RUN_LENGTH {
                    completed.extend(run.iter().copied());
                }
            }
        }
        completed
    }

    /// Emits a removal command for every ball on a completed line.
    ///
    /// Returns the cleared cells in row-major order.
    pub fn handle(&mut self, balls: &BallView, out: &mut Vec<Command>) -> Vec<CellCoord> {
        let completed = self.find_completed_lines(balls);
        for cell in &completed {
            if let Some(snapshot) = balls.at(*cell) {
                out.push(Command::RemoveBall { ball: snapshot.id });
            }
        }
        completed.into_iter().collect()
    }

    fn rebuild(&mut self, balls: &BallView) {
        if self.colors.len() != CELL_COUNT {
            self.colors = vec![None; CELL_COUNT];
        } else {
            self.colors.fill(None);
        }
        for snapshot in balls.iter() {
            if let Some(slot) = snapshot.cell.index().and_then(|index| self.colors.get_mut(index)) {
                *slot = Some(snapshot.color);
            }
        }
    }

    fn color_at(&self, cell: CellCoord) -> Option<BallColor> {
        cell.index()
            .and_then(|index| self.colors.get(index).copied().flatten())
    }
}
