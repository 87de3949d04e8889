use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tilequest_core::{CellCoord, Direction};

/// Default amount of simulated time for a bare `wait`.
const DEFAULT_WAIT: Duration = Duration::from_millis(1_000);

/// Single line of player input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Tap(CellCoord),
    Move(CellCoord),
    Attack(CellCoord),
    Step(Direction),
    Wait(Duration),
    Respawn,
    ResetQuest,
    Status,
    Show,
    Save,
    Help,
    Quit,
}

pub(crate) const HELP: &str = "\
commands:
  tap X Y        attack an adjacent enemy on the cell, otherwise walk there
  move X Y       walk to the cell
  attack X Y     attack the enemy on the cell
  step DIR       move one cell (n, s, e, w)
  wait [MS]      let simulated time pass (default 1000)
  respawn        revive after dying
  reset-quest    clear quest progress
  status         print player statistics
  show           draw the map
  save           write the save file
  quit           save and exit";

/// Parses one input line; blank lines yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arguments: Vec<&str> = words.collect();

    let input = match verb.to_ascii_lowercase().as_str() {
        "tap" | "t" => Input::Tap(cell(&arguments)?),
        "move" | "m" | "go" => Input::Move(cell(&arguments)?),
        "attack" | "a" => Input::Attack(cell(&arguments)?),
        "step" => Input::Step(direction(&arguments)?),
        "n" | "north" | "up" => Input::Step(Direction::North),
        "s" | "south" | "down" => Input::Step(Direction::South),
        "e" | "east" | "right" => Input::Step(Direction::East),
        "w" | "west" | "left" => Input::Step(Direction::West),
        "wait" => Input::Wait(wait(&arguments)?),
        "respawn" => Input::Respawn,
        "reset-quest" | "reset" => Input::ResetQuest,
        "status" | "stats" => Input::Status,
        "show" | "map" => Input::Show,
        "save" => Input::Save,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        other => bail!("unknown command `{other}`, try `help`"),
    };

    Ok(Some(input))
}

fn cell(arguments: &[&str]) -> Result<CellCoord> {
    let [x, y] = arguments else {
        bail!("expected a cell as `X Y`");
    };
    let x = x.parse().with_context(|| format!("invalid column `{x}`"))?;
    let y = y.parse().with_context(|| format!("invalid row `{y}`"))?;
    Ok(CellCoord::new(x, y))
}

fn direction(arguments: &[&str]) -> Result<Direction> {
    let [word] = arguments else {
        bail!("expected a direction: n, s, e or w");
    };
    match word.to_ascii_lowercase().as_str() {
        "n" | "north" | "up" => Ok(Direction::North),
        "s" | "south" | "down" => Ok(Direction::South),
        "e" | "east" | "right" => Ok(Direction::East),
        "w" | "west" | "left" => Ok(Direction::West),
        other => Err(anyhow!("unknown direction `{other}`")),
    }
}

fn wait(arguments: &[&str]) -> Result<Duration> {
    match arguments {
        [] => Ok(DEFAULT_WAIT),
        [millis] => {
            let millis: u64 = millis
                .parse()
                .with_context(|| format!("invalid duration `{millis}`"))?;
            Ok(Duration::from_millis(millis))
        }
        _ => bail!("expected `wait [MS]`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cells_and_directions() {
        assert_eq!(
            parse("tap 3 4").expect("valid"),
            Some(Input::Tap(CellCoord::new(3, 4)))
        );
        assert_eq!(
            parse("  MOVE 0 9 ").expect("valid"),
            Some(Input::Move(CellCoord::new(0, 9)))
        );
        assert_eq!(
            parse("step w").expect("valid"),
            Some(Input::Step(Direction::West))
        );
        assert_eq!(parse("up").expect("valid"), Some(Input::Step(Direction::North)));
    }

    #[test]
    fn wait_defaults_to_one_second() {
        assert_eq!(
            parse("wait").expect("valid"),
            Some(Input::Wait(Duration::from_secs(1)))
        );
        assert_eq!(
            parse("wait 250").expect("valid"),
            Some(Input::Wait(Duration::from_millis(250)))
        );
    }

    #[test]
    fn blank_lines_are_skipped_and_garbage_is_reported() {
        assert_eq!(parse("   ").expect("blank"), None);
        assert!(parse("tap 3").is_err());
        assert!(parse("move x 2").is_err());
        assert!(parse("step sideways").is_err());
        assert!(parse("dance").is_err());
    }
}
