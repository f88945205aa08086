use std::time::Duration;

use color_lines_core::{BallColor, BallId, CellCoord, Command, Event};
use color_lines_system_movement::{Config, MoveProgress, MovementController};
use color_lines_world::{self as world, query, World};

fn spawn(world: &mut World, cell: CellCoord) -> BallId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnBall {
            cell,
            color: BallColor::BLUE,
        },
        &mut events,
    )
    .expect("spawn succeeds");
    match events.as_slice() {
        [Event::BallSpawned { ball, .. }] => *ball,
        other => panic!("unexpected events: {other:?}"),
    }
}

fn pump(world: &mut World, controller: &mut MovementController) -> (MoveProgress, Vec<Event>) {
    let mut commands = Vec::new();
    let progress = controller.tick(&mut commands);
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events).expect("movement commands are valid");
    }
    (progress, events)
}

#[test]
fn walks_ball_cell_by_cell_then_arrives() {
    let mut world = World::new();
    let ball = spawn(&mut world, CellCoord::new(2, 2));
    let path = vec![
        CellCoord::new(2, 2),
        CellCoord::new(2, 3),
        CellCoord::new(2, 4),
        CellCoord::new(2, 5),
    ];

    let mut controller = MovementController::new(Config::default());
    let _ = controller.start_move(ball, path.clone());

    let mut visited = Vec::new();
    for _ in 0..3 {
        let (progress, events) = pump(&mut world, &mut controller);
        assert!(matches!(progress, MoveProgress::Stepped { .. }));
        for event in events {
            if let Event::BallMoved { to, .. } = event {
                visited.push(to);
            }
        }
    }

    assert_eq!(visited, path[1..].to_vec());
    let (progress, events) = pump(&mut world, &mut controller);
    assert_eq!(progress, MoveProgress::Arrived { ball });
    assert!(events.is_empty());

    let resting = query::ball(&world, ball).expect("ball still exists");
    assert_eq!(resting.cell, CellCoord::new(2, 5));
    assert!(!query::is_occupied(&world, CellCoord::new(2, 2), None));
}

#[test]
fn step_cadence_matches_configured_interval() {
    let mut controller = MovementController::new(Config::new(Duration::from_millis(150)));
    let _ = controller.start_move(
        BallId::new(0),
        vec![CellCoord::new(0, 0), CellCoord::new(0, 1), CellCoord::new(0, 2)],
    );

    assert_eq!(controller.due_ticks(Duration::from_millis(149)), 0);
    assert_eq!(controller.due_ticks(Duration::from_millis(1)), 1);
    assert_eq!(controller.due_ticks(Duration::from_millis(450)), 3);
}
