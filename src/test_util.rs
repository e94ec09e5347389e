// Board builders shared by unit tests and the integration tests under `tests/`.

use itertools::Itertools;

use crate::api::Arrangement;
use crate::board::BoardModel;
use crate::coord::{NUM_COLS, NUM_ROWS, Point};
use crate::piece::piece_from_ascii;


// Starting position with white on rows 6-7 and black on rows 0-1. A fixture layout only: the
// server itself starts white on rows 0-1.
pub const INITIAL_BOARD: &str = "
    R N B K Q B N R
    P P P P P P P P
    . . . . . . . .
    . . . . . . . .
    . . . . . . . .
    . . . . . . . .
    p p p p p p p p
    r n b k q b n r
";

// Parses the format printed by `BoardModel`'s `Debug`: eight lines, row 7 first, column 0 on
// the left. FEN letters for pieces, '.' for empty cells. Spaces are ignored.
pub fn board_from_ascii(text: &str) -> BoardModel {
    let rows = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect_vec();
    assert_eq!(rows.len(), NUM_ROWS as usize, "{}", text);
    let mut board = BoardModel::empty();
    for (line, row_index) in rows.iter().zip((0..NUM_ROWS).rev()) {
        let cells = line.chars().filter(|ch| !ch.is_whitespace()).collect_vec();
        assert_eq!(cells.len(), NUM_COLS as usize, "{}", line);
        for (column_index, &ch) in (0..NUM_COLS).zip(cells.iter()) {
            if ch != '.' {
                let piece = piece_from_ascii(ch).unwrap_or_else(|| panic!("bad piece '{}'", ch));
                board[Point::new(row_index, column_index)].piece = Some(piece);
            }
        }
    }
    board
}

pub fn initial_board() -> BoardModel { board_from_ascii(INITIAL_BOARD) }

pub fn arrangement(position: u32, cells_matrix: BoardModel) -> Arrangement {
    Arrangement {
        position,
        cells_matrix,
        under_check_side: None,
    }
}

pub fn sample_arrangement(position: u32) -> Arrangement { arrangement(position, initial_board()) }

// Copy of `board` with the piece at `from` moved to `to`.
pub fn board_after_move(board: &BoardModel, from: Point, to: Point) -> BoardModel {
    let mut board = board.clone();
    let piece = board[from].piece.take();
    board[to].piece = piece;
    board
}
