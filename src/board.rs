use std::{fmt, ops};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::coord::{NUM_COLS, NUM_ROWS, Point};
use crate::piece::{Piece, piece_to_ascii};


const ROWS: usize = NUM_ROWS as usize;
const COLS: usize = NUM_COLS as usize;

type CellsMatrix = [[Cell; COLS]; ROWS];


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    row_index: u8,
    column_index: u8,
    pub piece: Option<Piece>,
    // Transient UI flags. The server never sets them, but they are echoed back if present.
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub available: bool,
}

impl Cell {
    pub fn new(point: Point, piece: Option<Piece>) -> Self {
        Cell {
            row_index: point.row_index(),
            column_index: point.column_index(),
            piece,
            selected: false,
            available: false,
        }
    }

    pub fn point(&self) -> Point { Point::new(self.row_index, self.column_index) }
}

// The 8×8 cell matrix. The shape cannot change: a server matrix of any other shape, or with
// cells that disagree with their place in the matrix, fails to deserialize.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CellsMatrix", into = "CellsMatrix")]
pub struct BoardModel {
    cells: CellsMatrix,
}

impl BoardModel {
    pub fn empty() -> Self {
        BoardModel {
            cells: std::array::from_fn(|row| {
                std::array::from_fn(|col| Cell::new(Point::new(row as u8, col as u8), None))
            }),
        }
    }

    pub fn from_pieces(pieces: impl IntoIterator<Item = (Point, Piece)>) -> Self {
        let mut board = Self::empty();
        for (point, piece) in pieces {
            board[point].piece = Some(piece);
        }
        board
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> { self.cells.iter().flatten() }
    pub fn row(&self, row_index: u8) -> &[Cell] { &self.cells[row_index as usize] }

    pub fn piece(&self, point: Point) -> Option<Piece> { self[point].piece }

    pub fn selected_points(&self) -> Vec<Point> {
        self.cells().filter(|c| c.selected).map(Cell::point).collect()
    }
    pub fn available_points(&self) -> Vec<Point> {
        self.cells().filter(|c| c.available).map(Cell::point).collect()
    }

    pub fn clear_ui_flags(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.selected = false;
            cell.available = false;
        }
    }

    // Compares pieces only, ignoring transient UI flags.
    pub fn same_pieces(&self, other: &BoardModel) -> bool {
        self.cells().zip(other.cells()).all(|(a, b)| a.piece == b.piece)
    }
}

impl TryFrom<CellsMatrix> for BoardModel {
    type Error = String;
    fn try_from(cells: CellsMatrix) -> Result<Self, Self::Error> {
        for (row, row_cells) in cells.iter().enumerate() {
            for (col, cell) in row_cells.iter().enumerate() {
                if (cell.row_index as usize, cell.column_index as usize) != (row, col) {
                    return Err(format!(
                        "cell ({}, {}) found at matrix position ({}, {})",
                        cell.row_index, cell.column_index, row, col
                    ));
                }
            }
        }
        Ok(BoardModel { cells })
    }
}

impl From<BoardModel> for CellsMatrix {
    fn from(board: BoardModel) -> Self { board.cells }
}

impl ops::Index<Point> for BoardModel {
    type Output = Cell;
    fn index(&self, point: Point) -> &Self::Output {
        &self.cells[point.row_index() as usize][point.column_index() as usize]
    }
}

impl ops::IndexMut<Point> for BoardModel {
    fn index_mut(&mut self, point: Point) -> &mut Self::Output {
        &mut self.cells[point.row_index() as usize][point.column_index() as usize]
    }
}

// One line per row, row 7 first. Pieces as FEN letters; '*' marks the selected cell, '+' an
// available empty cell. Mostly for logs and test failures.
impl fmt::Debug for BoardModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .cells
            .iter()
            .rev()
            .map(|row| {
                row.iter()
                    .map(|cell| match (cell.piece, cell.selected, cell.available) {
                        (_, true, _) => '*',
                        (Some(piece), _, _) => piece_to_ascii(piece),
                        (None, _, true) => '+',
                        (None, _, false) => '.',
                    })
                    .join(" ")
            })
            .join("\n");
        write!(f, "\n{}", text)
    }
}
