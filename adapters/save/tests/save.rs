use std::{
    fs,
    path::{Path, PathBuf},
};

use color_lines_core::{BallColor, BallId, BallRecord, CellCoord, GameSnapshot, PALETTE};
use color_lines_engine::{EngineConfig, GameEngine, TurnState};
use color_lines_save::{load_from_path, save_to_path, LoadError, SaveDocument};
use color_lines_world::query;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "color-lines-save-{}-{name}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("scratch directory");
    dir
}

fn load_text(text: &str) -> Result<GameSnapshot, LoadError> {
    SaveDocument::parse(text).and_then(SaveDocument::into_snapshot)
}

#[test]
fn engine_state_survives_a_save_and_load() {
    let dir = scratch_dir("round-trip");
    let mut engine = GameEngine::new(EngineConfig::new(21));
    let _ = engine.cell_clicked(CellCoord::new(5, 5));
    let saved = engine.snapshot();

    let written = save_to_path(&dir.join("slot"), &saved).expect("save succeeds");
    assert_eq!(written, dir.join("slot.bgsave"));
    assert!(!Path::new(&format!("{}.tmp", written.display())).exists());

    let loaded = load_from_path(&written).expect("load succeeds");
    let mut restored = GameEngine::new(EngineConfig::new(99));
    restored.restore(&loaded).expect("snapshot is valid");

    assert_eq!(loaded, saved);
    assert_eq!(restored.state(), engine.state());
    assert_eq!(
        query::next_ball_id(restored.world()),
        query::next_ball_id(engine.world())
    );

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn offsets_score_and_counter_survive_a_save_and_load() {
    let dir = scratch_dir("full-state");
    let snapshot = GameSnapshot {
        balls: vec![
            BallRecord {
                id: BallId::new(2),
                cell: CellCoord::new(0, 9),
                color: BallColor::BLUE,
                bounce_offset: -4,
            },
            BallRecord {
                id: BallId::new(6),
                cell: CellCoord::new(4, 4),
                color: PALETTE[5],
                bounce_offset: 5,
            },
            BallRecord {
                id: BallId::new(9),
                cell: CellCoord::new(9, 0),
                color: BallColor::from_rgb(18, 52, 86),
                bounce_offset: 0,
            },
        ],
        next_ball_id: 14,
        selected: Some(BallId::new(6)),
        moving: None,
        score: 35,
    };

    let written = save_to_path(&dir.join("full.json"), &snapshot).expect("save succeeds");
    assert_eq!(written, dir.join("full.json"));
    let loaded = load_from_path(&written).expect("load succeeds");
    assert_eq!(loaded, snapshot);

    let mut engine = GameEngine::new(EngineConfig::new(3));
    engine.restore(&loaded).expect("snapshot is valid");
    assert_eq!(engine.snapshot(), snapshot);
    assert_eq!(engine.state(), TurnState::Selected(BallId::new(6)));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn rejected_file_leaves_engine_untouched() {
    let dir = scratch_dir("rejected");
    let path = dir.join("broken.json");
    fs::write(
        &path,
        r#"{ "balls": [ { "id": 0, "row": 1, "col": 1 }, { "id": 1, "row": 1, "col": 1 } ] }"#,
    )
    .expect("fixture written");
    let engine = GameEngine::new(EngineConfig::new(5));
    let before = engine.snapshot();

    let result = load_from_path(&path);

    assert!(matches!(
        result,
        Err(LoadError::DuplicatePosition { row: 1, col: 1 })
    ));
    assert_eq!(engine.snapshot(), before);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = scratch_dir("missing");
    assert!(matches!(
        load_from_path(&dir.join("nothing.bgsave")),
        Err(LoadError::Io { .. })
    ));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn malformed_boards_are_rejected() {
    assert!(matches!(load_text(r#"{ "balls": [] }"#), Err(LoadError::NoBalls)));
    assert!(matches!(
        load_text(r#"{ "balls": ["a", 3] }"#),
        Err(LoadError::NoBalls)
    ));
    assert!(matches!(
        load_text(r#"{ "balls": [ { "id": 0, "row": 10, "col": 0 } ] }"#),
        Err(LoadError::OutOfBounds { id: 0, row: 10, col: 0 })
    ));
    assert!(matches!(
        load_text(r#"{ "balls": [ { "id": 0, "row": 0, "col": -1 } ] }"#),
        Err(LoadError::OutOfBounds { .. })
    ));
    assert!(matches!(
        load_text(r#"{ "balls": [ { "row": 4, "col": 4 } ] }"#),
        Err(LoadError::InvalidId { id: -1 })
    ));
    assert!(matches!(
        load_text(
            r#"{ "balls": [ { "id": 2, "row": 0, "col": 0 }, { "id": 2, "row": 0, "col": 1 } ] }"#
        ),
        Err(LoadError::DuplicateId { id: 2 })
    ));
}

#[test]
fn lenient_fields_are_normalised() {
    let snapshot = load_text(
        r##"{
            "balls": [
                { "id": 8, "row": 2, "col": 3, "color": "#00f", "bounceOffset": 9 },
                { "id": 3, "row": 7, "col": 7, "color": { "r": 255, "g": 165, "b": 0 } },
                { "id": 5, "row": 9, "col": 0, "color": "not a color" }
            ],
            "nextBallId": 4,
            "selectedBallIndex": 1,
            "movingBallIndex": 12,
            "score": 40
        }"##,
    )
    .expect("document is valid");

    assert_eq!(snapshot.next_ball_id, 9);
    assert_eq!(snapshot.score, 40);
    assert_eq!(snapshot.selected, Some(BallId::new(3)));
    assert_eq!(snapshot.moving, None);
    assert_eq!(snapshot.balls[0].color, BallColor::BLUE);
    assert_eq!(snapshot.balls[0].bounce_offset, 5);
    assert_eq!(snapshot.balls[1].color, BallColor::from_rgb(255, 165, 0));
    assert_eq!(snapshot.balls[2].color, BallColor::RED);
}

#[test]
fn moving_index_restores_as_selection() {
    let snapshot = load_text(
        r#"{
            "balls": [
                { "id": 0, "row": 2, "col": 2, "color": "red" },
                { "id": 1, "row": 5, "col": 5, "color": "lime" }
            ],
            "nextBallId": 2,
            "selectedBallIndex": 0,
            "movingBallIndex": 1
        }"#,
    )
    .expect("document is valid");
    let mut engine = GameEngine::new(EngineConfig::new(8));

    engine.restore(&snapshot).expect("snapshot is valid");

    assert_eq!(engine.state(), TurnState::Selected(BallId::new(1)));
}
