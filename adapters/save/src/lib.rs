#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! JSON save files for Color Lines.
//!
//! A save is a single JSON object:
//!
//! ```json
//! {
//!   "balls": [{ "id": 0, "row": 2, "col": 2, "color": "#ff0000", "bounceOffset": 0 }],
//!   "nextBallId": 1,
//!   "selectedBallIndex": -1,
//!   "movingBallIndex": -1,
//!   "score": 0,
//!   "saveVersion": "1.0",
//!   "saveTime": "2024-05-01T12:00:00Z",
//!   "gameName": "Ball Game"
//! }
//! ```
//!
//! Reading is lenient about individual fields (missing or mistyped values fall
//! back to defaults, unreadable colors become red) but strict about the board:
//! a document that would place balls off the board or on top of each other is
//! rejected as a whole.

mod color;

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use color_lines_core::{
    BallColor, BallId, BallRecord, CellCoord, GameSnapshot, BOARD_COLUMNS, BOARD_ROWS,
    MAX_BOUNCE_OFFSET,
};
use log::{info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Format version written into every save.
pub const SAVE_VERSION: &str = "1.0";

/// Game name written into every save.
pub const GAME_NAME: &str = "Ball Game";

/// Extension appended to save paths that carry neither it nor `.json`.
pub const SAVE_EXTENSION: &str = "bgsave";

const NO_INDEX: i64 = -1;

/// Errors raised while reading a save.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("could not read {}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The contents are not JSON.
    #[error("save file is not valid JSON")]
    Json(#[from] serde_json::Error),
    /// The document is not a JSON object.
    #[error("save document is not a JSON object")]
    NotAnObject,
    /// The `balls` field is missing or is not a list.
    #[error("save document has no ball list")]
    MissingBalls,
    /// The document holds no balls.
    #[error("save document contains no balls")]
    NoBalls,
    /// A ball lies outside the board.
    #[error("ball {id} lies outside the board at ({row}, {col})")]
    OutOfBounds {
        /// Stored identifier of the ball.
        id: i64,
        /// Stored row.
        row: i64,
        /// Stored column.
        col: i64,
    },
    /// Two balls share a cell.
    #[error("several balls occupy row {row}, column {col}")]
    DuplicatePosition {
        /// Shared row.
        row: i64,
        /// Shared column.
        col: i64,
    },
    /// A ball carries a negative or oversized identifier.
    #[error("ball identifier {id} is invalid")]
    InvalidId {
        /// Offending identifier.
        id: i64,
    },
    /// Two balls share an identifier.
    #[error("ball identifier {id} is used more than once")]
    DuplicateId {
        /// Shared identifier.
        id: i64,
    },
}

/// Errors raised while writing a save.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The file could not be written.
    #[error("could not write {}", .path.display())]
    Io {
        /// File that was being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The document could not be encoded.
    #[error("could not encode save document")]
    Json(#[from] serde_json::Error),
}

/// One ball as stored in a save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BallEntry {
    /// Stored identifier.
    pub id: i64,
    /// Stored row.
    pub row: i64,
    /// Stored column.
    pub col: i64,
    /// Ball color, written as `#rrggbb`.
    #[serde(serialize_with = "color::serialize_hex")]
    pub color: BallColor,
    /// Visual bounce offset.
    pub bounce_offset: i64,
}

/// Complete save document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    /// Every stored ball.
    pub balls: Vec<BallEntry>,
    /// Identifier the next spawned ball receives.
    pub next_ball_id: i64,
    /// Position in `balls` of the selected ball, or -1.
    pub selected_ball_index: i64,
    /// Position in `balls` of the moving ball, or -1.
    pub moving_ball_index: i64,
    /// Cumulative score.
    pub score: i64,
    /// Format version.
    pub save_version: String,
    /// UTC time the save was written, in ISO 8601.
    pub save_time: String,
    /// Name of the game that wrote the save.
    pub game_name: String,
}

impl SaveDocument {
    /// Builds the document describing `snapshot`, stamped with `saved_at`.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameSnapshot, saved_at: SystemTime) -> Self {
        let balls: Vec<BallEntry> = snapshot
            .balls
            .iter()
            .map(|record| BallEntry {
                id: i64::from(record.id.get()),
                row: i64::from(record.cell.row()),
                col: i64::from(record.cell.column()),
                color: record.color,
                bounce_offset: i64::from(record.bounce_offset),
            })
            .collect();
        let index_of = |ball: Option<BallId>| {
            ball.and_then(|ball| snapshot.balls.iter().position(|record| record.id == ball))
                .and_then(|index| i64::try_from(index).ok())
                .unwrap_or(NO_INDEX)
        };

        Self {
            balls,
            next_ball_id: i64::from(snapshot.next_ball_id),
            selected_ball_index: index_of(snapshot.selected),
            moving_ball_index: index_of(snapshot.moving),
            score: i64::from(snapshot.score),
            save_version: SAVE_VERSION.to_owned(),
            save_time: format_timestamp(saved_at),
            game_name: GAME_NAME.to_owned(),
        }
    }

    /// Parses a document, applying per-field defaults.
    ///
    /// Only the overall shape is checked here; board validation happens in
    /// [`SaveDocument::into_snapshot`].
    pub fn parse(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(root) = value else {
            return Err(LoadError::NotAnObject);
        };
        let Some(Value::Array(entries)) = root.get("balls") else {
            return Err(LoadError::MissingBalls);
        };

        let balls = entries
            .iter()
            .filter_map(Value::as_object)
            .map(parse_ball)
            .collect();

        Ok(Self {
            balls,
            next_ball_id: int_field(&root, "nextBallId", 0),
            selected_ball_index: int_field(&root, "selectedBallIndex", NO_INDEX),
            moving_ball_index: int_field(&root, "movingBallIndex", NO_INDEX),
            score: int_field(&root, "score", 0),
            save_version: text_field(&root, "saveVersion"),
            save_time: text_field(&root, "saveTime"),
            game_name: text_field(&root, "gameName"),
        })
    }

    /// Encodes the document as indented JSON.
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates the document and converts it into a game snapshot.
    ///
    /// The identifier counter is raised above the largest stored identifier
    /// when needed. Indices that do not point at a stored ball are dropped.
    pub fn into_snapshot(self) -> Result<GameSnapshot, LoadError> {
        if self.balls.is_empty() {
            return Err(LoadError::NoBalls);
        }

        let mut cells = BTreeSet::new();
        let mut ids = BTreeSet::new();
        let mut records = Vec::with_capacity(self.balls.len());
        for entry in &self.balls {
            let cell = board_cell(entry).ok_or(LoadError::OutOfBounds {
                id: entry.id,
                row: entry.row,
                col: entry.col,
            })?;
            if !cells.insert(cell) {
                return Err(LoadError::DuplicatePosition {
                    row: entry.row,
                    col: entry.col,
                });
            }
            let id = u32::try_from(entry.id).map_err(|_| LoadError::InvalidId { id: entry.id })?;
            if !ids.insert(id) {
                return Err(LoadError::DuplicateId { id: entry.id });
            }

            let bounce_offset = entry
                .bounce_offset
                .clamp(i64::from(-MAX_BOUNCE_OFFSET), i64::from(MAX_BOUNCE_OFFSET));
            records.push(BallRecord {
                id: BallId::new(id),
                cell,
                color: entry.color,
                bounce_offset: i32::try_from(bounce_offset).unwrap_or(0),
            });
        }

        let stored_next = u32::try_from(self.next_ball_id.max(0)).unwrap_or(u32::MAX);
        let next_ball_id = match ids.last() {
            Some(&highest) if highest >= stored_next => highest.saturating_add(1),
            _ => stored_next,
        };
        let ball_at_index = |index: i64| {
            usize::try_from(index)
                .ok()
                .and_then(|index| records.get(index))
                .map(|record| record.id)
        };

        Ok(GameSnapshot {
            selected: ball_at_index(self.selected_ball_index),
            moving: ball_at_index(self.moving_ball_index),
            next_ball_id,
            score: u32::try_from(self.score.max(0)).unwrap_or(u32::MAX),
            balls: records,
        })
    }
}

/// Resolves the path a save is written to.
///
/// Paths ending in `.bgsave` or `.json` (any case) are kept; anything else
/// gets `.bgsave` appended.
#[must_use]
pub fn resolve_save_path(path: &Path) -> PathBuf {
    let keeps_extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case(SAVE_EXTENSION) || extension.eq_ignore_ascii_case("json")
        });
    if keeps_extension {
        return path.to_path_buf();
    }

    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(SAVE_EXTENSION);
    PathBuf::from(name)
}

/// Writes `snapshot` to `path`, returning the path actually written.
///
/// The document goes to a sibling temporary file first and is then renamed
/// into place, so a failed write never leaves a truncated save behind.
pub fn save_to_path(path: &Path, snapshot: &GameSnapshot) -> Result<PathBuf, SaveError> {
    let target = resolve_save_path(path);
    let json = SaveDocument::from_snapshot(snapshot, SystemTime::now()).to_json()?;

    let mut temporary = target.as_os_str().to_owned();
    temporary.push(".tmp");
    let temporary = PathBuf::from(temporary);

    fs::write(&temporary, json).map_err(|source| SaveError::Io {
        path: temporary.clone(),
        source,
    })?;
    if let Err(source) = fs::rename(&temporary, &target) {
        let _ = fs::remove_file(&temporary);
        return Err(SaveError::Io {
            path: target,
            source,
        });
    }

    info!(
        "saved {} balls to {}",
        snapshot.balls.len(),
        target.display()
    );
    Ok(target)
}

/// Reads and validates the save stored at `path`.
pub fn load_from_path(path: &Path) -> Result<GameSnapshot, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot = SaveDocument::parse(&text)
        .and_then(SaveDocument::into_snapshot)
        .map_err(|error| {
            warn!("rejected save {}: {error}", path.display());
            error
        })?;
    info!(
        "loaded {} balls from {}",
        snapshot.balls.len(),
        path.display()
    );
    Ok(snapshot)
}

fn parse_ball(entry: &Map<String, Value>) -> BallEntry {
    BallEntry {
        id: int_field(entry, "id", NO_INDEX),
        row: int_field(entry, "row", 0),
        col: int_field(entry, "col", 0),
        color: entry
            .get("color")
            .and_then(color::from_value)
            .unwrap_or(BallColor::RED),
        bounce_offset: int_field(entry, "bounceOffset", 0),
    }
}

fn int_field(object: &Map<String, Value>, key: &str, default: i64) -> i64 {
    object
        .get(key)
        .and_then(|value| {
            value.as_i64().or_else(|| {
                value
                    .as_f64()
                    .filter(|number| number.fract() == 0.0)
                    .map(|number| number as i64)
            })
        })
        .unwrap_or(default)
}

fn text_field(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn board_cell(entry: &BallEntry) -> Option<CellCoord> {
    let row = u32::try_from(entry.row).ok()?;
    let column = u32::try_from(entry.col).ok()?;
    (row < BOARD_ROWS && column < BOARD_COLUMNS).then_some(CellCoord::new(row, column))
}

/// Latest instant RFC 3339 can express, 9999-12-31T23:59:59Z.
const LAST_TIMESTAMP_SECS: u64 = 253_402_300_799;

/// Formats `time` as an ISO 8601 UTC timestamp with second precision.
///
/// Instants outside the years 1970 to 9999 are clamped to the nearest end.
fn format_timestamp(time: SystemTime) -> String {
    let last = UNIX_EPOCH + Duration::from_secs(LAST_TIMESTAMP_SECS);
    let clamped = time.clamp(UNIX_EPOCH, last);
    humantime::format_rfc3339_seconds(clamped).to_string()
}
