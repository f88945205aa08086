#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Color Lines.

mod registry;

use std::collections::BTreeMap;

use color_lines_core::{
    BallColor, BallId, BoardError, CellCoord, Command, Event, GameSnapshot, Placement, CELL_COUNT,
    MAX_BOUNCE_OFFSET,
};
use log::debug;

use crate::registry::{BallRegistry, BallState};

/// Represents the authoritative Color Lines board.
///
/// Balls live in an arena keyed by [`BallId`]; a dense occupancy grid mirrors
/// their cells so occupancy queries never scan the arena.
#[derive(Clone, Debug)]
pub struct World {
    balls: BallRegistry,
    occupancy: OccupancyGrid,
    score: u32,
}

impl World {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balls: BallRegistry::new(),
            occupancy: OccupancyGrid::new(),
            score: 0,
        }
    }

    /// Builds a board from a persisted snapshot after validating every ball.
    ///
    /// An empty ball list is rejected.
    /// Validation finishes before anything is constructed, so a rejected
    /// snapshot never produces a partially populated board. The identifier
    /// counter is raised above the largest stored identifier when needed.
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Result<Self, BoardError> {
        if snapshot.balls.is_empty() {
            return Err(BoardError::NoBalls);
        }

        let mut entries = BTreeMap::new();
        let mut occupancy = OccupancyGrid::new();
        let mut highest: Option<u32> = None;

        for record in &snapshot.balls {
            if !record.cell.is_on_board() {
                return Err(BoardError::OutOfBounds { cell: record.cell });
            }
            if occupancy.occupant(record.cell).is_some() {
                return Err(BoardError::DuplicatePosition { cell: record.cell });
            }
            if entries.contains_key(&record.id) {
                return Err(BoardError::DuplicateId { ball: record.id });
            }

            occupancy.occupy(record.id, record.cell);
            let _ = entries.insert(
                record.id,
                BallState {
                    id: record.id,
                    cell: record.cell,
                    color: record.color,
                    bounce_offset: clamp_offset(record.bounce_offset),
                },
            );
            highest = Some(highest.map_or(record.id.get(), |value| value.max(record.id.get())));
        }

        let next_ball_id = match highest {
            Some(max) if max >= snapshot.next_ball_id => max.saturating_add(1),
            _ => snapshot.next_ball_id,
        };

        Ok(Self {
            balls: BallRegistry::from_entries(entries, next_ball_id),
            occupancy,
            score: snapshot.score,
        })
    }

    fn spawn_ball(
        &mut self,
        cell: CellCoord,
        color: BallColor,
        out_events: &mut Vec<Event>,
    ) -> Result<(), BoardError> {
        if !cell.is_on_board() {
            return Err(BoardError::OutOfBounds { cell });
        }
        if self.occupancy.occupant(cell).is_some() {
            return Err(BoardError::DuplicatePosition { cell });
        }

        let ball = self.balls.allocate();
        self.balls.insert(BallState {
            id: ball,
            cell,
            color,
            bounce_offset: 0,
        });
        self.occupancy.occupy(ball, cell);
        out_events.push(Event::BallSpawned { ball, cell, color });
        Ok(())
    }

    fn remove_ball(&mut self, ball: BallId, out_events: &mut Vec<Event>) -> Result<(), BoardError> {
        let state = self
            .balls
            .remove(ball)
            .ok_or(BoardError::MissingBall { ball })?;
        self.occupancy.vacate(state.cell);
        out_events.push(Event::BallRemoved {
            ball,
            cell: state.cell,
        });
        Ok(())
    }

    fn move_ball(
        &mut self,
        ball: BallId,
        to: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), BoardError> {
        if !to.is_on_board() {
            return Err(BoardError::OutOfBounds { cell: to });
        }
        if matches!(self.occupancy.occupant(to), Some(occupant) if occupant != ball) {
            return Err(BoardError::DuplicatePosition { cell: to });
        }

        let state = self
            .balls
            .get_mut(ball)
            .ok_or(BoardError::MissingBall { ball })?;
        let from = state.cell;
        state.cell = to;
        self.occupancy.vacate(from);
        self.occupancy.occupy(ball, to);
        out_events.push(Event::BallMoved { ball, from, to });
        Ok(())
    }

    fn set_bounce_offset(&mut self, ball: BallId, offset: i32, out_events: &mut Vec<Event>) {
        // Late updates from an animator that was already torn down are dropped.
        let Some(state) = self.balls.get_mut(ball) else {
            return;
        };
        let offset = clamp_offset(offset);
        if state.bounce_offset != offset {
            state.bounce_offset = offset;
            out_events.push(Event::BounceOffsetChanged { ball, offset });
        }
    }

    fn rearrange(
        &mut self,
        placements: &[Placement],
        out_events: &mut Vec<Event>,
    ) -> Result<(), BoardError> {
        let mut staged = self.occupancy.clone();
        for placement in placements {
            let state = self
                .balls
                .get(placement.ball)
                .ok_or(BoardError::MissingBall {
                    ball: placement.ball,
                })?;
            staged.vacate(state.cell);
        }
        for placement in placements {
            if !placement.cell.is_on_board() {
                return Err(BoardError::OutOfBounds {
                    cell: placement.cell,
                });
            }
            if staged.occupant(placement.cell).is_some() {
                return Err(BoardError::DuplicatePosition {
                    cell: placement.cell,
                });
            }
            staged.occupy(placement.ball, placement.cell);
        }

        self.occupancy = staged;
        for placement in placements {
            let Some(state) = self.balls.get_mut(placement.ball) else {
                continue;
            };
            let from = state.cell;
            state.cell = placement.cell;
            state.bounce_offset = 0;
            if from != placement.cell {
                out_events.push(Event::BallMoved {
                    ball: placement.ball,
                    from,
                    to: placement.cell,
                });
            }
            if state.color != placement.color {
                state.color = placement.color;
                out_events.push(Event::BallRecolored {
                    ball: placement.ball,
                    color: placement.color,
                });
            }
        }
        Ok(())
    }

    fn clear(&mut self, out_events: &mut Vec<Event>) {
        self.balls.clear();
        self.occupancy = OccupancyGrid::new();
        out_events.push(Event::BoardCleared);
    }

    fn set_score(&mut self, score: u32, out_events: &mut Vec<Event>) {
        if self.score != score {
            self.score = score;
            out_events.push(Event::ScoreChanged { score });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the board untouched and emit no events.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), BoardError> {
    match command {
        Command::SpawnBall { cell, color } => world.spawn_ball(cell, color, out_events),
        Command::RemoveBall { ball } => world.remove_ball(ball, out_events),
        Command::MoveBall { ball, to } => world.move_ball(ball, to, out_events),
        Command::SetBounceOffset { ball, offset } => {
            world.set_bounce_offset(ball, offset, out_events);
            Ok(())
        }
        Command::Rearrange { placements } => world.rearrange(&placements, out_events),
        Command::ClearBoard => {
            debug!("clearing board with {} balls", world.balls.len());
            world.clear(out_events);
            Ok(())
        }
        Command::AwardPoints { points } => {
            let score = world.score.saturating_add(points);
            world.set_score(score, out_events);
            Ok(())
        }
        Command::ResetScore => {
            world.set_score(0, out_events);
            Ok(())
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use color_lines_core::{
        BallId, BallRecord, BallSnapshot, BallView, CellCoord, GameSnapshot, OccupancyView,
    };

    use super::{BallState, World};

    /// Snapshot of the ball occupying the provided cell, if any.
    #[must_use]
    pub fn ball_at(world: &World, cell: CellCoord) -> Option<BallSnapshot> {
        world
            .occupancy
            .occupant(cell)
            .and_then(|ball| world.balls.get(ball))
            .map(snapshot_of)
    }

    /// Snapshot of the ball with the provided identifier, if any.
    #[must_use]
    pub fn ball(world: &World, ball: BallId) -> Option<BallSnapshot> {
        world.balls.get(ball).map(snapshot_of)
    }

    /// Reports whether a ball other than `excluding` holds the provided cell.
    #[must_use]
    pub fn is_occupied(world: &World, cell: CellCoord, excluding: Option<BallId>) -> bool {
        occupancy_view(world).is_occupied(cell, excluding)
    }

    /// Captures a read-only view of the balls on the board.
    #[must_use]
    pub fn ball_view(world: &World) -> BallView {
        BallView::from_snapshots(world.balls.iter().map(snapshot_of).collect())
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView::new(world.occupancy.cells())
    }

    /// Cells that hold no ball, in row-major order.
    #[must_use]
    pub fn empty_cells(world: &World) -> Vec<CellCoord> {
        occupancy_view(world).empty_cells()
    }

    /// Number of balls on the board.
    #[must_use]
    pub fn ball_count(world: &World) -> usize {
        world.balls.len()
    }

    /// Cumulative score.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Identifier the next spawned ball receives.
    #[must_use]
    pub fn next_ball_id(world: &World) -> u32 {
        world.balls.next_ball_id()
    }

    /// Captures the persisted portion of the board. Turn state is left empty.
    #[must_use]
    pub fn snapshot(world: &World) -> GameSnapshot {
        GameSnapshot {
            balls: world
                .balls
                .iter()
                .map(|state| BallRecord {
                    id: state.id,
                    cell: state.cell,
                    color: state.color,
                    bounce_offset: state.bounce_offset,
                })
                .collect(),
            next_ball_id: world.balls.next_ball_id(),
            selected: None,
            moving: None,
            score: world.score,
        }
    }

    fn snapshot_of(state: &BallState) -> BallSnapshot {
        BallSnapshot {
            id: state.id,
            cell: state.cell,
            color: state.color,
            bounce_offset: state.bounce_offset,
        }
    }
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    cells: Vec<Option<BallId>>,
}

impl OccupancyGrid {
    fn new() -> Self {
        Self {
            cells: vec![None; CELL_COUNT],
        }
    }

    fn occupant(&self, cell: CellCoord) -> Option<BallId> {
        cell.index()
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, ball: BallId, cell: CellCoord) {
        if let Some(slot) = cell.index().and_then(|index| self.cells.get_mut(index)) {
            *slot = Some(ball);
        }
    }

    fn vacate(&mut self, cell: CellCoord) {
        if let Some(slot) = cell.index().and_then(|index| self.cells.get_mut(index)) {
            *slot = None;
        }
    }

    fn cells(&self) -> &[Option<BallId>] {
        &self.cells
    }
}

fn clamp_offset(offset: i32) -> i32 {
    offset.clamp(-MAX_BOUNCE_OFFSET, MAX_BOUNCE_OFFSET)
}
