use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use color_lines_core::CellCoord;

/// One line of player input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    /// Click the cell at the given row and column.
    Click(CellCoord),
    /// Let the moving ball finish its path.
    Wait,
    /// Start a new game.
    Restart,
    /// Scatter the balls on the board.
    Randomize,
    /// Write the game to a file.
    Save(PathBuf),
    /// Replace the game with the one stored in a file.
    Load(PathBuf),
    /// Print the board.
    Show,
    /// Leave the shell.
    Quit,
}

/// Parses a single input line. Blank lines and `#` comments yield `None`.
pub(crate) fn parse(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "click" | "c" => {
            let row = coordinate(words.next(), "row")?;
            let column = coordinate(words.next(), "column")?;
            ShellCommand::Click(CellCoord::new(row, column))
        }
        "wait" | "w" => ShellCommand::Wait,
        "restart" => ShellCommand::Restart,
        "randomize" => ShellCommand::Randomize,
        "save" => ShellCommand::Save(path(words.next())?),
        "load" => ShellCommand::Load(path(words.next())?),
        "show" | "s" => ShellCommand::Show,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        other => bail!("unknown command `{other}`"),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument `{extra}`");
    }
    Ok(Some(command))
}

fn coordinate(word: Option<&str>, name: &str) -> Result<u32> {
    let word = word.with_context(|| format!("missing {name}"))?;
    word.parse()
        .with_context(|| format!("{name} `{word}` is not a number"))
}

fn path(word: Option<&str>) -> Result<PathBuf> {
    word.map(PathBuf::from).context("missing file name")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clicks_and_aliases() {
        assert_eq!(
            parse("click 2 5").expect("valid"),
            Some(ShellCommand::Click(CellCoord::new(2, 5)))
        );
        assert_eq!(
            parse("  C 0 9 ").expect("valid"),
            Some(ShellCommand::Click(CellCoord::new(0, 9)))
        );
        assert_eq!(parse("q").expect("valid"), Some(ShellCommand::Quit));
        assert_eq!(
            parse("save games/one").expect("valid"),
            Some(ShellCommand::Save(PathBuf::from("games/one")))
        );
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        assert_eq!(parse("").expect("valid"), None);
        assert_eq!(parse("   # a note").expect("valid"), None);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse("click 2").is_err());
        assert!(parse("click a 3").is_err());
        assert!(parse("click -1 3").is_err());
        assert!(parse("wait now").is_err());
        assert!(parse("load").is_err());
        assert!(parse("jump").is_err());
    }
}
