use color_lines_core::{BallColor, BallId, CellCoord, Command, Event};
use color_lines_system_pathfinding::Pathfinder;
use color_lines_world::{self as world, query, World};

fn spawn(world: &mut World, row: u32, column: u32) -> BallId {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnBall {
            cell: CellCoord::new(row, column),
            color: BallColor::RED,
        },
        &mut events,
    )
    .expect("spawn succeeds");
    match events.as_slice() {
        [Event::BallSpawned { ball, .. }] => *ball,
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn straight_route_between_free_cells() {
    let mut world = World::new();
    let ball = spawn(&mut world, 2, 2);
    let _ = spawn(&mut world, 5, 5);
    let _ = spawn(&mut world, 8, 8);

    let path = Pathfinder::new().find_path(
        query::occupancy_view(&world),
        CellCoord::new(2, 2),
        CellCoord::new(2, 5),
        ball,
    );

    assert_eq!(
        path,
        vec![
            CellCoord::new(2, 2),
            CellCoord::new(2, 3),
            CellCoord::new(2, 4),
            CellCoord::new(2, 5),
        ]
    );
}

#[test]
fn target_held_by_another_ball_is_rejected() {
    let mut world = World::new();
    let mover = spawn(&mut world, 0, 0);
    let _ = spawn(&mut world, 0, 3);

    let path = Pathfinder::new().find_path(
        query::occupancy_view(&world),
        CellCoord::new(0, 0),
        CellCoord::new(0, 3),
        mover,
    );

    assert!(path.is_empty(), "occupied target must not be reachable");
}

#[test]
fn excluded_ball_never_blocks_its_own_cell() {
    let mut world = World::new();
    let mover = spawn(&mut world, 3, 3);
    let _ = spawn(&mut world, 3, 4);

    let path = Pathfinder::new().find_path(
        query::occupancy_view(&world),
        CellCoord::new(3, 4),
        CellCoord::new(3, 3),
        mover,
    );

    assert_eq!(path.first(), Some(&CellCoord::new(3, 4)));
    assert_eq!(path.last(), Some(&CellCoord::new(3, 3)));
    assert_eq!(path.len(), 2);
}

#[test]
fn other_balls_are_walked_around() {
    let mut world = World::new();
    let mover = spawn(&mut world, 0, 0);
    let _ = spawn(&mut world, 0, 1);

    let path = Pathfinder::new().find_path(
        query::occupancy_view(&world),
        CellCoord::new(0, 0),
        CellCoord::new(0, 2),
        mover,
    );

    assert_eq!(path.len(), 5);
    assert!(!path.contains(&CellCoord::new(0, 1)));
}
