use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};


pub const NUM_ROWS: u8 = 8;
pub const NUM_COLS: u8 = 8;

// Column letters in index order: the server puts the "h" file at column 0.
const COL_NAMES: [char; NUM_COLS as usize] = ['h', 'g', 'f', 'e', 'd', 'c', 'b', 'a'];


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPoint")]
pub struct Point {
    row_index: u8,
    column_index: u8,
}

// Unchecked wire form. Every `Point` that leaves deserialization went through `TryFrom`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoint {
    row_index: i64,
    column_index: i64,
}

impl Point {
    pub const fn new(row_index: u8, column_index: u8) -> Self {
        assert!(row_index < NUM_ROWS);
        assert!(column_index < NUM_COLS);
        Point { row_index, column_index }
    }
    pub fn try_new(row_index: i64, column_index: i64) -> Option<Self> {
        let row_index = u8::try_from(row_index).ok().filter(|&r| r < NUM_ROWS)?;
        let column_index = u8::try_from(column_index).ok().filter(|&c| c < NUM_COLS)?;
        Some(Point { row_index, column_index })
    }

    pub const fn row_index(self) -> u8 { self.row_index }
    pub const fn column_index(self) -> u8 { self.column_index }

    // Square name as shown next to the board, e.g. "e2".
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let (col_char, row_char) = s.trim().chars().collect_tuple()?;
        let col_char = col_char.to_ascii_lowercase();
        let column_index = COL_NAMES.iter().position(|&c| c == col_char)?;
        let row_index = row_char.to_digit(10)?.checked_sub(1)?;
        Self::try_new(row_index.into(), column_index as i64)
    }
    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.col_name(), self.row_index + 1)
    }
    pub fn col_name(self) -> char { COL_NAMES[self.column_index as usize] }

    pub fn all() -> impl Iterator<Item = Point> {
        (0..NUM_ROWS).cartesian_product(0..NUM_COLS).map(|(row, col)| Point::new(row, col))
    }
}

impl TryFrom<RawPoint> for Point {
    type Error = String;
    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Point::try_new(raw.row_index, raw.column_index).ok_or_else(|| {
            format!("point ({}, {}) is outside of the board", raw.row_index, raw.column_index)
        })
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {} = {})", self.row_index, self.column_index, self.to_algebraic())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_names_follow_board_labels() {
        assert_eq!(Point::new(0, 0).to_algebraic(), "h1");
        assert_eq!(Point::new(6, 3).to_algebraic(), "e7");
        assert_eq!(Point::new(7, 7).to_algebraic(), "a8");
        assert_eq!(Point::from_algebraic("e7"), Some(Point::new(6, 3)));
        assert_eq!(Point::from_algebraic(" A1 "), Some(Point::new(0, 7)));
    }

    #[test]
    fn bad_algebraic_names() {
        assert_eq!(Point::from_algebraic("i1"), None);
        assert_eq!(Point::from_algebraic("e9"), None);
        assert_eq!(Point::from_algebraic("e0"), None);
        assert_eq!(Point::from_algebraic("e10"), None);
        assert_eq!(Point::from_algebraic(""), None);
    }

    #[test]
    fn wire_format() {
        let p: Point = serde_json::from_str(r#"{"rowIndex": 5, "columnIndex": 3}"#).unwrap();
        assert_eq!(p, Point::new(5, 3));
        assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"rowIndex":5,"columnIndex":3}"#);
        assert!(serde_json::from_str::<Point>(r#"{"rowIndex": 8, "columnIndex": 0}"#).is_err());
        assert!(serde_json::from_str::<Point>(r#"{"rowIndex": 0, "columnIndex": -1}"#).is_err());
    }

    #[test]
    fn all_points() {
        assert_eq!(Point::all().count(), 64);
        assert_eq!(Point::all().unique().count(), 64);
    }
}
