#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Color Lines engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and pure systems. Callers submit [`Command`] values
//! describing desired board mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that the
//! presentation layer consumes as change notifications. Systems query
//! immutable views ([`BallView`], [`OccupancyView`]) and respond exclusively
//! with new command batches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows on the fixed playing board.
pub const BOARD_ROWS: u32 = 10;

/// Number of columns on the fixed playing board.
pub const BOARD_COLUMNS: u32 = 10;

/// Total number of cells on the board.
pub const CELL_COUNT: usize = (BOARD_ROWS * BOARD_COLUMNS) as usize;

/// Largest visual displacement, in either direction, produced by a bouncing ball.
pub const MAX_BOUNCE_OFFSET: i32 = 5;

/// Commands that express all permissible board mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Adds a new ball; the world assigns the next unused identifier.
    SpawnBall {
        /// Empty cell that receives the ball.
        cell: CellCoord,
        /// Appearance assigned to the ball.
        color: BallColor,
    },
    /// Removes a ball from the board.
    RemoveBall {
        /// Identifier of the ball to remove.
        ball: BallId,
    },
    /// Moves a ball to another cell.
    MoveBall {
        /// Identifier of the ball being moved.
        ball: BallId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Records the latest bounce offset reported by a ball's animator.
    SetBounceOffset {
        /// Identifier of the animated ball.
        ball: BallId,
        /// Visual displacement reported by the animator.
        offset: i32,
    },
    /// Relocates and recolors existing balls in a single atomic step.
    Rearrange {
        /// New cell and color for each listed ball.
        placements: Vec<Placement>,
    },
    /// Removes every ball. Identifiers keep counting from where they were.
    ClearBoard,
    /// Adds points to the cumulative score.
    AwardPoints {
        /// Number of points to add.
        points: u32,
    },
    /// Resets the cumulative score to zero.
    ResetScore,
}

/// Events broadcast after the board or the turn state changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A ball was added to the board.
    BallSpawned {
        /// Identifier assigned to the new ball.
        ball: BallId,
        /// Cell the ball occupies.
        cell: CellCoord,
        /// Appearance of the ball.
        color: BallColor,
    },
    /// A ball was removed from the board.
    BallRemoved {
        /// Identifier of the removed ball.
        ball: BallId,
        /// Cell the ball occupied before removal.
        cell: CellCoord,
    },
    /// A ball changed position.
    BallMoved {
        /// Identifier of the ball that moved.
        ball: BallId,
        /// Cell the ball occupied before moving.
        from: CellCoord,
        /// Cell the ball occupies after moving.
        to: CellCoord,
    },
    /// A ball received a new color.
    BallRecolored {
        /// Identifier of the recolored ball.
        ball: BallId,
        /// New appearance of the ball.
        color: BallColor,
    },
    /// A ball's visual bounce offset changed.
    BounceOffsetChanged {
        /// Identifier of the animated ball.
        ball: BallId,
        /// New visual displacement.
        offset: i32,
    },
    /// Every ball was removed from the board.
    BoardCleared,
    /// The cumulative score changed.
    ScoreChanged {
        /// Score after the change.
        score: u32,
    },
    /// The selected ball changed.
    SelectionChanged {
        /// Newly selected ball, if any.
        selected: Option<BallId>,
    },
    /// A ball started walking along a path.
    MoveStarted {
        /// Identifier of the moving ball.
        ball: BallId,
        /// Cells visited by the move, source and destination included.
        path: Vec<CellCoord>,
    },
    /// A ball finished walking along its path.
    MoveFinished {
        /// Identifier of the ball that arrived.
        ball: BallId,
        /// Cell the ball came to rest on.
        cell: CellCoord,
    },
    /// Completed lines were detected and their balls removed.
    LinesCleared {
        /// Cells that were cleared, in row-major order.
        cells: Vec<CellCoord>,
    },
}

/// Reasons a board mutation may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum BoardError {
    /// The requested cell lies outside the board.
    #[error("cell ({}, {}) lies outside the board", .cell.row(), .cell.column())]
    OutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
    /// The requested cell already holds another ball.
    #[error("cell ({}, {}) is already occupied", .cell.row(), .cell.column())]
    DuplicatePosition {
        /// Offending cell.
        cell: CellCoord,
    },
    /// No ball with the provided identifier exists.
    #[error("ball {} does not exist", .ball.get())]
    MissingBall {
        /// Identifier that could not be resolved.
        ball: BallId,
    },
    /// Two balls share the same identifier.
    #[error("ball identifier {} is used more than once", .ball.get())]
    DuplicateId {
        /// Identifier that appears more than once.
        ball: BallId,
    },
    /// A persisted board holds no balls at all.
    #[error("a saved board must contain at least one ball")]
    NoBalls,
}

/// Visual appearance applied to a ball. Balls match when their colors are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl BallColor {
    /// Pure red, also the fallback color for unknown or missing values.
    pub const RED: Self = Self::from_rgb(255, 0, 0);
    /// Pure green.
    pub const GREEN: Self = Self::from_rgb(0, 255, 0);
    /// Pure blue.
    pub const BLUE: Self = Self::from_rgb(0, 0, 255);

    /// Creates a new ball color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl Default for BallColor {
    fn default() -> Self {
        Self::RED
    }
}

/// Colors a randomized board may draw from.
pub const PALETTE: [BallColor; 12] = [
    BallColor::RED,
    BallColor::GREEN,
    BallColor::BLUE,
    BallColor::from_rgb(255, 255, 0),
    BallColor::from_rgb(255, 0, 255),
    BallColor::from_rgb(0, 255, 255),
    BallColor::from_rgb(255, 165, 0),
    BallColor::from_rgb(128, 0, 128),
    BallColor::from_rgb(255, 192, 203),
    BallColor::from_rgb(0, 128, 0),
    BallColor::from_rgb(139, 69, 19),
    BallColor::from_rgb(0, 0, 128),
];

/// Unique identifier assigned to a ball.
///
/// Identifiers are handed out monotonically and never reused within a session,
/// so they stay valid keys even after other balls are removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BallId(u32);

impl BallId {
    /// Creates a new ball identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single board cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Reports whether the cell lies on the board.
    #[must_use]
    pub const fn is_on_board(&self) -> bool {
        self.row < BOARD_ROWS && self.column < BOARD_COLUMNS
    }

    /// Row-major index of the cell, if it lies on the board.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        if !self.is_on_board() {
            return None;
        }
        let row = usize::try_from(self.row).ok()?;
        let column = usize::try_from(self.column).ok()?;
        let width = usize::try_from(BOARD_COLUMNS).ok()?;
        Some(row * width + column)
    }

    /// Inverse of [`CellCoord::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= CELL_COUNT {
            return None;
        }
        let width = usize::try_from(BOARD_COLUMNS).ok()?;
        let row = u32::try_from(index / width).ok()?;
        let column = u32::try_from(index % width).ok()?;
        Some(Self::new(row, column))
    }

    /// Neighbouring cell shifted by the provided deltas, if it stays on the board.
    #[must_use]
    pub fn offset(&self, row_delta: i32, column_delta: i32) -> Option<Self> {
        let row = self.row.checked_add_signed(row_delta)?;
        let column = self.column.checked_add_signed(column_delta)?;
        let cell = Self::new(row, column);
        cell.is_on_board().then_some(cell)
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row().abs_diff(other.row()) + self.column().abs_diff(other.column())
    }

    /// Iterates every cell on the board in row-major order.
    pub fn all() -> impl Iterator<Item = CellCoord> {
        (0..BOARD_ROWS).flat_map(|row| (0..BOARD_COLUMNS).map(move |column| Self::new(row, column)))
    }
}

/// New cell and color assigned to an existing ball by [`Command::Rearrange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Ball being relocated.
    pub ball: BallId,
    /// Destination cell.
    pub cell: CellCoord,
    /// Color applied to the ball.
    pub color: BallColor,
}

/// Immutable representation of a single ball's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BallSnapshot {
    /// Unique identifier assigned to the ball.
    pub id: BallId,
    /// Cell currently occupied by the ball.
    pub cell: CellCoord,
    /// Appearance assigned to the ball.
    pub color: BallColor,
    /// Latest visual bounce offset.
    pub bounce_offset: i32,
}

/// Read-only snapshot describing all balls on the board.
#[derive(Clone, Debug, Default)]
pub struct BallView {
    snapshots: Vec<BallSnapshot>,
}

impl BallView {
    /// Creates a new ball view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BallSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured ball snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BallSnapshot> {
        self.snapshots.iter()
    }

    /// Number of balls captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no balls.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot of the ball occupying the provided cell, if any.
    #[must_use]
    pub fn at(&self, cell: CellCoord) -> Option<&BallSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.cell == cell)
    }

    /// Snapshot of the ball with the provided identifier, if any.
    #[must_use]
    pub fn get(&self, ball: BallId) -> Option<&BallSnapshot> {
        self.snapshots
            .binary_search_by_key(&ball, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Distinct colors present on the board, in identifier order of first appearance.
    #[must_use]
    pub fn distinct_colors(&self) -> Vec<BallColor> {
        let mut colors: Vec<BallColor> = Vec::new();
        for snapshot in &self.snapshots {
            if !colors.contains(&snapshot.color) {
                colors.push(snapshot.color);
            }
        }
        colors
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<BallSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<BallId>],
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<BallId>]) -> Self {
        Self { cells }
    }

    /// Returns the ball occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<BallId> {
        cell.index()
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell is occupied by any ball other than `excluding`.
    ///
    /// Cells outside the board report as unoccupied; callers check bounds.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord, excluding: Option<BallId>) -> bool {
        match self.occupant(cell) {
            None => false,
            Some(occupant) => Some(occupant) != excluding,
        }
    }

    /// Reports whether the cell lies on the board and is not held by another ball.
    #[must_use]
    pub fn is_walkable_for(&self, cell: CellCoord, ball: BallId) -> bool {
        cell.is_on_board() && !self.is_occupied(cell, Some(ball))
    }

    /// Returns an iterator over all cells.
    pub fn iter(&self) -> impl Iterator<Item = Option<BallId>> + 'a {
        self.cells.iter().copied()
    }

    /// Cells that hold no ball, in row-major order.
    #[must_use]
    pub fn empty_cells(&self) -> Vec<CellCoord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .filter_map(|(index, _)| CellCoord::from_index(index))
            .collect()
    }
}

/// Persisted description of a single ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallRecord {
    /// Identifier of the ball.
    pub id: BallId,
    /// Cell occupied by the ball.
    pub cell: CellCoord,
    /// Appearance of the ball.
    pub color: BallColor,
    /// Visual bounce offset at the time the snapshot was taken.
    pub bounce_offset: i32,
}

/// Complete gameplay state exchanged with the save serializer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Every ball on the board.
    pub balls: Vec<BallRecord>,
    /// Identifier the next spawned ball receives.
    pub next_ball_id: u32,
    /// Ball selected by the player, if any.
    pub selected: Option<BallId>,
    /// Ball walking along a path, if any.
    pub moving: Option<BallId>,
    /// Cumulative score.
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::{BallColor, BallId, BallRecord, CellCoord, GameSnapshot, OccupancyView, CELL_COUNT};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn index_round_trips_for_every_cell() {
        for (expected, cell) in CellCoord::all().enumerate() {
            assert_eq!(cell.index(), Some(expected));
            assert_eq!(CellCoord::from_index(expected), Some(cell));
        }
        assert_eq!(CellCoord::all().count(), CELL_COUNT);
        assert_eq!(CellCoord::new(10, 0).index(), None);
        assert_eq!(CellCoord::from_index(CELL_COUNT), None);
    }

    #[test]
    fn offset_stays_on_board() {
        let corner = CellCoord::new(0, 9);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(0, 1), None);
        assert_eq!(corner.offset(1, -1), Some(CellCoord::new(1, 8)));
    }

    #[test]
    fn occupancy_treats_excluded_ball_as_transparent() {
        let mut cells = vec![None; CELL_COUNT];
        let cell = CellCoord::new(3, 4);
        cells[cell.index().expect("on board")] = Some(BallId::new(7));
        let view = OccupancyView::new(&cells);

        assert!(view.is_occupied(cell, None));
        assert!(view.is_occupied(cell, Some(BallId::new(8))));
        assert!(!view.is_occupied(cell, Some(BallId::new(7))));
        assert!(view.is_walkable_for(cell, BallId::new(7)));
        assert!(!view.is_walkable_for(CellCoord::new(3, 10), BallId::new(7)));
        assert_eq!(view.empty_cells().len(), CELL_COUNT - 1);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn game_snapshot_round_trips_through_bincode() {
        let snapshot = GameSnapshot {
            balls: vec![BallRecord {
                id: BallId::new(4),
                cell: CellCoord::new(2, 5),
                color: BallColor::from_rgb(139, 69, 19),
                bounce_offset: -3,
            }],
            next_ball_id: 5,
            selected: Some(BallId::new(4)),
            moving: None,
            score: 12,
        };
        assert_round_trip(&snapshot);
    }
}
