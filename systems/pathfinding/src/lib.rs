#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Occupancy-aware A* pathfinding over the 4-connected board.

use std::{cmp::Reverse, collections::BinaryHeap};

use color_lines_core::{BallId, CellCoord, OccupancyView, CELL_COUNT};

/// Row and column deltas explored from every cell: up, down, left, right.
const CARDINAL_STEPS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Reusable A* planner.
///
/// Scratch buffers are kept between queries so repeated searches on the
/// fixed-size board do not reallocate.
#[derive(Debug)]
pub struct Pathfinder {
    g_scores: Vec<u32>,
    parents: Vec<Option<usize>>,
    closed: Vec<bool>,
    open: BinaryHeap<Reverse<OpenNode>>,
    sequence: u64,
}

impl Pathfinder {
    /// Creates a planner sized for the board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            g_scores: vec![u32::MAX; CELL_COUNT],
            parents: vec![None; CELL_COUNT],
            closed: vec![false; CELL_COUNT],
            open: BinaryHeap::with_capacity(CELL_COUNT),
            sequence: 0,
        }
    }

    /// Computes a shortest walkable route from `source` to `target`.
    ///
    /// The returned path includes both endpoints. Cells held by any ball other
    /// than `excluding` are walls, the target included. An empty path means the
    /// target cannot be reached. Among routes of equal length the first one
    /// discovered wins; callers must not rely on a particular one.
    pub fn find_path(
        &mut self,
        occupancy: OccupancyView<'_>,
        source: CellCoord,
        target: CellCoord,
        excluding: BallId,
    ) -> Vec<CellCoord> {
        let (Some(source_index), Some(target_index)) = (source.index(), target.index()) else {
            return Vec::new();
        };

        if source == target {
            return vec![source];
        }

        if !occupancy.is_walkable_for(target, excluding) {
            return Vec::new();
        }

        self.reset();
        self.g_scores[source_index] = 0;
        self.push(source_index, source.manhattan_distance(target));

        while let Some(Reverse(node)) = self.open.pop() {
            if self.closed[node.index] {
                continue;
            }
            self.closed[node.index] = true;

            if node.index == target_index {
                break;
            }

            let Some(cell) = CellCoord::from_index(node.index) else {
                continue;
            };
            let tentative = self.g_scores[node.index].saturating_add(1);

            for (row_delta, column_delta) in CARDINAL_STEPS {
                let Some(neighbor) = cell.offset(row_delta, column_delta) else {
                    continue;
                };
                if !occupancy.is_walkable_for(neighbor, excluding) {
                    continue;
                }
                let Some(neighbor_index) = neighbor.index() else {
                    continue;
                };

                if tentative < self.g_scores[neighbor_index] {
                    self.g_scores[neighbor_index] = tentative;
                    self.parents[neighbor_index] = Some(node.index);
                    self.push(
                        neighbor_index,
                        tentative + neighbor.manhattan_distance(target),
                    );
                }
            }
        }

        self.reconstruct(source_index, target_index)
    }

    fn reset(&mut self) {
        self.g_scores.fill(u32::MAX);
        self.parents.fill(None);
        self.closed.fill(false);
        self.open.clear();
        self.sequence = 0;
    }

    fn push(&mut self, index: usize, f_score: u32) {
        self.open.push(Reverse(OpenNode {
            f_score,
            sequence: self.sequence,
            index,
        }));
        self.sequence += 1;
    }

    fn reconstruct(&self, source_index: usize, target_index: usize) -> Vec<CellCoord> {
        if self.g_scores[target_index] == u32::MAX {
            return Vec::new();
        }

        let mut indices = vec![target_index];
        let mut current = target_index;
        while current != source_index {
            let Some(parent) = self.parents[current] else {
                return Vec::new();
            };
            indices.push(parent);
            current = parent;
        }

        indices
            .into_iter()
            .rev()
            .filter_map(CellCoord::from_index)
            .collect()
    }
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot convenience wrapper around [`Pathfinder::find_path`].
#[must_use]
pub fn find_path(
    occupancy: OccupancyView<'_>,
    source: CellCoord,
    target: CellCoord,
    excluding: BallId,
) -> Vec<CellCoord> {
    Pathfinder::new().find_path(occupancy, source, target, excluding)
}

/// Open-list entry ordered by f-score, then by discovery order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f_score: u32,
    sequence: u64,
    index: usize,
}
