use color_lines_core::{BallColor, CellCoord, Command, Event, PALETTE};
use color_lines_system_spawning::{Config, Spawning, BALLS_PER_TURN};
use color_lines_world::{self as world, query, World};

fn fill_board_except(world: &mut World, free: &[CellCoord]) {
    let mut events = Vec::new();
    for (index, cell) in CellCoord::all().filter(|cell| !free.contains(cell)).enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        world::apply(world, Command::SpawnBall { cell, color }, &mut events)
            .expect("spawn succeeds");
    }
}

fn spawn_turn(world: &mut World, spawning: &mut Spawning, count: usize) -> Vec<Event> {
    let mut commands = Vec::new();
    let _ = spawning.handle(
        count,
        &query::ball_view(world),
        query::occupancy_view(world),
        &mut commands,
    );
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events).expect("spawn targets free cells");
    }
    events
}

#[test]
fn last_free_cell_is_filled_without_error() {
    let mut world = World::new();
    let free = CellCoord::new(6, 3);
    fill_board_except(&mut world, &[free]);
    let before = query::ball_count(&world);

    let mut spawning = Spawning::new(Config::new(0x1234_5678));
    let events = spawn_turn(&mut world, &mut spawning, BALLS_PER_TURN);

    assert_eq!(query::ball_count(&world), before + 1);
    assert!(matches!(
        events.as_slice(),
        [Event::BallSpawned { cell, .. }] if *cell == free
    ));
    assert!(query::empty_cells(&world).is_empty());
}

#[test]
fn colors_are_drawn_from_the_board() {
    let mut world = World::new();
    let mut events = Vec::new();
    for (cell, color) in [
        (CellCoord::new(2, 2), BallColor::RED),
        (CellCoord::new(5, 5), BallColor::GREEN),
        (CellCoord::new(8, 8), BallColor::BLUE),
    ] {
        world::apply(&mut world, Command::SpawnBall { cell, color }, &mut events)
            .expect("spawn succeeds");
    }

    let mut spawning = Spawning::new(Config::new(99));
    for _ in 0..10 {
        for event in spawn_turn(&mut world, &mut spawning, BALLS_PER_TURN) {
            if let Event::BallSpawned { color, .. } = event {
                assert!(
                    [BallColor::RED, BallColor::GREEN, BallColor::BLUE].contains(&color),
                    "unexpected color {color:?}"
                );
            }
        }
    }
    assert_eq!(query::ball_count(&world), 33);
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let first = replay(0x4d59_5df4_d0f3_3173);
    let second = replay(0x4d59_5df4_d0f3_3173);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.len(), 3 + 5 * BALLS_PER_TURN);
}

fn replay(seed: u64) -> Vec<Event> {
    let mut world = World::new();
    let mut log = Vec::new();
    world::apply(
        &mut world,
        Command::SpawnBall {
            cell: CellCoord::new(0, 0),
            color: BallColor::RED,
        },
        &mut log,
    )
    .expect("spawn succeeds");
    world::apply(
        &mut world,
        Command::SpawnBall {
            cell: CellCoord::new(9, 9),
            color: BallColor::GREEN,
        },
        &mut log,
    )
    .expect("spawn succeeds");
    world::apply(
        &mut world,
        Command::SpawnBall {
            cell: CellCoord::new(4, 7),
            color: BallColor::BLUE,
        },
        &mut log,
    )
    .expect("spawn succeeds");

    let mut spawning = Spawning::new(Config::new(seed));
    for _ in 0..5 {
        log.extend(spawn_turn(&mut world, &mut spawning, BALLS_PER_TURN));
    }
    log
}
