#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Tilequest session over stdin.

mod board;
mod input;

use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use input::Input;
use tilequest_core::Rules;
use tilequest_session::{FileStore, SaveStore, SimulationSession};

/// Play Tilequest in the terminal.
#[derive(Debug, Parser)]
#[command(name = "tilequest", version, about)]
struct Args {
    /// Start a new session from this seed instead of resuming the save file.
    #[arg(long)]
    seed: Option<u32>,

    /// TOML file overriding the default rules.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,

    /// JSON file the session is saved to.
    #[arg(long, value_name = "PATH", default_value = "tilequest-save.json")]
    save: PathBuf,
}

/// Entry point for the Tilequest command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let rules = load_rules(args.rules.as_deref())?;
    let store = FileStore::new(&args.save);

    let mut session = match args.seed {
        Some(seed) => SimulationSession::new(seed, rules, store),
        None => SimulationSession::load_or_new(rules, store),
    };
    tracing::info!(
        seed = session.seed(),
        save = %args.save.display(),
        "session ready"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "tilequest, seed {}. type `help` for commands.", session.seed())?;
    write!(out, "{}", board::render(&session))?;

    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let input = match input::parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(error) => {
                writeln!(out, "{error:#}")?;
                continue;
            }
        };

        if input == Input::Quit {
            break;
        }
        run(&mut session, input, &mut out)?;

        for event in session.take_events() {
            if let Some(message) = board::describe(&event) {
                writeln!(out, "{message}")?;
            }
        }
    }

    session.save();
    Ok(())
}

fn run<S: SaveStore>(
    session: &mut SimulationSession<S>,
    input: Input,
    out: &mut impl Write,
) -> Result<()> {
    match input {
        Input::Tap(cell) => session.handle_tap(cell),
        Input::Move(cell) => session.request_move(cell),
        Input::Attack(cell) => session.request_attack(cell),
        Input::Step(direction) => session.step(direction),
        Input::Wait(duration) => session.advance(duration),
        Input::Respawn => session.respawn(),
        Input::ResetQuest => session.reset_quest(),
        Input::Status => writeln!(out, "{}", board::status(session))?,
        Input::Show => write!(out, "{}", board::render(session))?,
        Input::Save => {
            session.save();
            writeln!(out, "saved")?;
        }
        Input::Help => writeln!(out, "{}", input::HELP)?,
        Input::Quit => {}
    }
    Ok(())
}

fn load_rules(path: Option<&Path>) -> Result<Rules> {
    let Some(path) = path else {
        return Ok(Rules::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse rules file {}", path.display()))
}
