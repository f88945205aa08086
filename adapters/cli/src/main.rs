#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Color Lines in a terminal.

mod render;
mod shell;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use color_lines_engine::{ClickOutcome, EngineConfig, GameEngine};
use color_lines_save::{load_from_path, save_to_path};
use color_lines_system_bounce as bounce;
use log::debug;

use crate::shell::ShellCommand;

/// Play Color Lines on a 10x10 board from the terminal.
///
/// Commands are read from standard input, one per line: `click ROW COL`,
/// `wait`, `restart`, `randomize`, `save FILE`, `load FILE`, `show`, `quit`.
#[derive(Debug, Parser)]
#[command(name = "color-lines", version)]
struct Args {
    /// Seed for ball spawning and randomization.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Milliseconds between two steps of a moving ball.
    #[arg(long, default_value_t = 150, value_parser = clap::value_parser!(u64).range(1..))]
    step_ms: u64,
    /// Milliseconds between two frames of the bounce animation.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    bounce_ms: u64,
    /// Save file to open on start.
    #[arg(long)]
    load: Option<PathBuf>,
}

enum Flow {
    Continue,
    Quit,
}

/// Entry point for the Color Lines command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let step_interval = Duration::from_millis(args.step_ms);
    let config = EngineConfig::new(args.seed)
        .with_step_interval(step_interval)
        .with_bounce(bounce::Config::new(
            Duration::from_millis(args.bounce_ms),
            bounce::Config::default().teardown_timeout(),
        ));
    let mut engine = GameEngine::new(config);

    if let Some(path) = &args.load {
        let snapshot = load_from_path(path)
            .with_context(|| format!("failed to load {}", path.display()))?;
        engine
            .restore(&snapshot)
            .context("failed to restore saved game")?;
    }

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    write!(out, "{}", render::render(engine.world(), engine.selected()))?;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read command")?;
        let command = match shell::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                writeln!(out, "error: {error:#}")?;
                continue;
            }
        };

        match run(&mut engine, command, step_interval, &mut out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(error) => writeln!(out, "error: {error:#}")?,
        }

        let _ = engine.pump_animations();
        for event in engine.drain_events() {
            debug!("{event:?}");
        }
    }

    let _ = engine.close();
    out.flush()?;
    Ok(())
}

fn run(
    engine: &mut GameEngine,
    command: ShellCommand,
    step_interval: Duration,
    out: &mut impl Write,
) -> Result<Flow> {
    match command {
        ShellCommand::Click(cell) => {
            match engine.cell_clicked(cell)? {
                ClickOutcome::Ignored => writeln!(out, "nothing to do")?,
                ClickOutcome::Selected(ball) => writeln!(out, "selected ball {}", ball.get())?,
                ClickOutcome::Deselected(ball) => {
                    writeln!(out, "deselected ball {}", ball.get())?;
                }
                ClickOutcome::NoPath => writeln!(out, "no path to that cell")?,
                ClickOutcome::MoveStarted { ball, path } => writeln!(
                    out,
                    "moving ball {} over {} cells",
                    ball.get(),
                    path.len().saturating_sub(1)
                )?,
            }
        }
        ShellCommand::Wait => finish_move(engine, step_interval)?,
        ShellCommand::Restart => engine.restart()?,
        ShellCommand::Randomize => engine.randomize()?,
        ShellCommand::Save(path) => {
            let written = save_to_path(&path, &engine.snapshot())
                .with_context(|| format!("failed to save {}", path.display()))?;
            writeln!(out, "saved to {}", written.display())?;
            return Ok(Flow::Continue);
        }
        ShellCommand::Load(path) => {
            let snapshot = load_from_path(&path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            engine.restore(&snapshot)?;
            writeln!(out, "loaded {}", path.display())?;
        }
        ShellCommand::Show => {}
        ShellCommand::Quit => return Ok(Flow::Quit),
    }

    write!(out, "{}", render::render(engine.world(), engine.selected()))?;
    Ok(Flow::Continue)
}

/// Runs the clock in real time until the moving ball has arrived.
fn finish_move(engine: &mut GameEngine, step_interval: Duration) -> Result<()> {
    let mut last = Instant::now();
    while engine.moving_ball().is_some() {
        thread::sleep(step_interval);
        let now = Instant::now();
        let _ = engine.advance(now - last)?;
        let _ = engine.pump_animations();
        last = now;
    }
    Ok(())
}
