use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};


#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, EnumIter, EnumString,
    IntoStaticStr, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    // Whose turn it is after `position` plies. The server uses the same convention; the client
    // only mirrors it to gate selection.
    pub fn to_move_at(position: u32) -> Side {
        if position % 2 == 0 { Side::White } else { Side::Black }
    }
}
