use std::fmt::Write as _;

use color_lines_core::{BallColor, BallId, CellCoord, BOARD_COLUMNS, BOARD_ROWS, PALETTE};
use color_lines_world::{query, World};

/// One letter per palette entry, in palette order.
const PALETTE_LETTERS: [char; 12] = ['R', 'G', 'B', 'Y', 'M', 'C', 'O', 'P', 'K', 'D', 'N', 'V'];

const EMPTY_CELL: char = '.';
const UNKNOWN_COLOR: char = '?';
const SELECTION_MARK: char = '*';

fn letter_for(color: BallColor) -> char {
    PALETTE
        .iter()
        .zip(PALETTE_LETTERS)
        .find(|(candidate, _)| **candidate == color)
        .map_or(UNKNOWN_COLOR, |(_, letter)| letter)
}

/// Draws the board as a text grid followed by the score.
pub(crate) fn render(world: &World, selected: Option<BallId>) -> String {
    let mut out = String::from("   ");
    for column in 0..BOARD_COLUMNS {
        let _ = write!(out, "{column} ");
    }
    out.push('\n');

    for row in 0..BOARD_ROWS {
        let _ = write!(out, "{row:>2} ");
        for column in 0..BOARD_COLUMNS {
            match query::ball_at(world, CellCoord::new(row, column)) {
                Some(ball) => {
                    out.push(letter_for(ball.color));
                    out.push(if Some(ball.id) == selected {
                        SELECTION_MARK
                    } else {
                        ' '
                    });
                }
                None => {
                    out.push(EMPTY_CELL);
                    out.push(' ');
                }
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "score: {}", query::score(world));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_lines_core::Command;
    use color_lines_world as world;

    #[test]
    fn balls_and_selection_are_drawn() {
        let mut board = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut board,
            Command::SpawnBall {
                cell: CellCoord::new(0, 1),
                color: BallColor::BLUE,
            },
            &mut events,
        )
        .expect("spawn succeeds");
        world::apply(
            &mut board,
            Command::SpawnBall {
                cell: CellCoord::new(9, 9),
                color: BallColor::from_rgb(1, 2, 3),
            },
            &mut events,
        )
        .expect("spawn succeeds");

        let text = render(&board, Some(BallId::new(0)));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "   0 1 2 3 4 5 6 7 8 9 ");
        assert_eq!(lines[1], " 0 . B*. . . . . . . . ");
        assert_eq!(lines[10], " 9 . . . . . . . . . ? ");
        assert_eq!(lines[11], "score: 0");
    }

    #[test]
    fn every_palette_color_has_its_own_letter() {
        let mut letters: Vec<char> = PALETTE.iter().map(|color| letter_for(*color)).collect();
        letters.sort_unstable();
        letters.dedup();
        assert_eq!(letters.len(), PALETTE.len());
        assert!(!letters.contains(&UNKNOWN_COLOR));
    }
}
