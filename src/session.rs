use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::location::game_path;
use crate::side::Side;


// Opaque server-assigned game identifier. The server sends it as a JSON number, but nothing on
// the client depends on that.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "RawGameId", into = "String")]
pub struct GameId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGameId {
    Number(u64),
    Text(String),
}

impl GameId {
    pub fn new(id: impl Into<String>) -> Self { GameId(id.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<RawGameId> for GameId {
    fn from(raw: RawGameId) -> Self {
        match raw {
            RawGameId::Number(n) => GameId(n.to_string()),
            RawGameId::Text(s) => GameId(s),
        }
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self { id.0 }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}


#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumString, IntoStaticStr, Serialize,
    Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum GameMode {
    // Two humans on two clients.
    Pvp,
    // Human against the server bot.
    Ai,
    // One client moves both sides.
    Single,
}

// What this client is allowed to do in the game. `Unselected` never goes over the wire: the
// server encodes it as `null`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PlayerSide {
    White,
    Black,
    Viewer,
    #[default]
    #[serde(skip)]
    #[strum(disabled)]
    Unselected,
}

impl PlayerSide {
    pub fn as_side(self) -> Option<Side> {
        match self {
            PlayerSide::White => Some(Side::White),
            PlayerSide::Black => Some(Side::Black),
            PlayerSide::Viewer | PlayerSide::Unselected => None,
        }
    }
}

impl From<Side> for PlayerSide {
    fn from(side: Side) -> Self {
        match side {
            Side::White => PlayerSide::White,
            Side::Black => PlayerSide::Black,
        }
    }
}


#[must_use]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArrangementVerdict {
    // The server is ahead: replace local state.
    Apply,
    // Same snapshot as the one we hold. Nothing to do.
    Duplicate,
    // Older than what we hold, e.g. a poll reply overtaken by our own move reply.
    Stale,
    // The server went back without us asking, e.g. the other player rolled back a move.
    Rewind,
}

#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    pub game_id: Option<GameId>,
    pub position: u32,
    pub under_check_side: Option<Side>,
    pub mode: Option<GameMode>,
    pub side: PlayerSide,
    pub game_started: bool,
    pub is_debug: bool,
    // Advanced by every own move or rollback the server answers. Polls sent before that
    // describe a game that no longer exists.
    pub sync_epoch: u32,
}

impl SessionContext {
    pub fn new() -> Self { Self::default() }

    pub fn side_to_move(&self) -> Side { Side::to_move_at(self.position) }
    pub fn is_viewer(&self) -> bool { self.side == PlayerSide::Viewer }

    // Whether this client may pick up a piece of `side` right now. In SINGLE mode the client
    // plays both sides, so only the turn matters.
    pub fn may_move(&self, side: Side) -> bool {
        if self.is_viewer() || side != self.side_to_move() {
            return false;
        }
        self.mode == Some(GameMode::Single) || self.side.as_side() == Some(side)
    }

    // Polling only makes sense when somebody else can move.
    pub fn wants_polling(&self) -> bool {
        matches!(self.mode, Some(GameMode::Pvp) | Some(GameMode::Ai))
    }

    pub fn judge_arrangement(&self, incoming_position: u32) -> ArrangementVerdict {
        use std::cmp::Ordering::*;
        match incoming_position.cmp(&self.position) {
            Greater => ArrangementVerdict::Apply,
            Equal => ArrangementVerdict::Duplicate,
            Less => ArrangementVerdict::Stale,
        }
    }

    // Only a current-epoch poll may take the position back, and only while no own move or
    // rollback is waiting for its reply.
    pub fn judge_poll(
        &self, epoch: u32, incoming_position: u32, own_change_in_flight: bool,
    ) -> ArrangementVerdict {
        if epoch != self.sync_epoch {
            return ArrangementVerdict::Stale;
        }
        match self.judge_arrangement(incoming_position) {
            ArrangementVerdict::Stale if !own_change_in_flight => ArrangementVerdict::Rewind,
            verdict => verdict,
        }
    }

    pub fn advance_sync_epoch(&mut self) { self.sync_epoch = self.sync_epoch.wrapping_add(1); }

    pub fn location_path(&self) -> Option<String> {
        self.game_id.as_ref().map(|id| game_path(id, Some(self.position)))
    }
}
