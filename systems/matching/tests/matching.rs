use std::collections::BTreeSet;

use color_lines_core::{BallColor, CellCoord, Command, Event};
use color_lines_system_matching::MatchDetector;
use color_lines_world::{self as world, query, World};

fn world_with(cells: &[CellCoord], color: BallColor) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    for &cell in cells {
        world::apply(&mut world, Command::SpawnBall { cell, color }, &mut events)
            .expect("spawn succeeds");
    }
    world
}

#[test]
fn horizontal_run_of_five_is_cleared() {
    let cells: Vec<_> = (0..5).map(|column| CellCoord::new(0, column)).collect();
    let world = world_with(&cells, BallColor::RED);

    let completed = MatchDetector::new().find_completed_lines(&query::ball_view(&world));

    assert_eq!(completed, cells.into_iter().collect::<BTreeSet<_>>());
}

#[test]
fn four_in_a_row_is_not_enough() {
    let cells: Vec<_> = (0..4).map(|column| CellCoord::new(0, column)).collect();
    let world = world_with(&cells, BallColor::RED);

    let completed = MatchDetector::new().find_completed_lines(&query::ball_view(&world));

    assert!(completed.is_empty());
}

#[test]
fn diagonal_run_of_five_is_cleared() {
    let cells: Vec<_> = (0..5).map(|step| CellCoord::new(step, step)).collect();
    let world = world_with(&cells, BallColor::GREEN);

    let completed = MatchDetector::new().find_completed_lines(&query::ball_view(&world));

    assert_eq!(completed, cells.into_iter().collect::<BTreeSet<_>>());
}

#[test]
fn removal_commands_empty_the_line() {
    let cells: Vec<_> = (0..5).map(|row| CellCoord::new(row, 9)).collect();
    let mut world = world_with(&cells, BallColor::BLUE);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnBall {
            cell: CellCoord::new(5, 9),
            color: BallColor::RED,
        },
        &mut events,
    )
    .expect("spawn succeeds");

    let mut commands = Vec::new();
    let cleared = MatchDetector::new().handle(&query::ball_view(&world), &mut commands);
    let mut removal_events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut removal_events).expect("removal succeeds");
    }

    assert_eq!(cleared, cells);
    assert_eq!(query::ball_count(&world), 1);
    assert_eq!(
        removal_events
            .iter()
            .filter(|event| matches!(event, Event::BallRemoved { .. }))
            .count(),
        5
    );
}
