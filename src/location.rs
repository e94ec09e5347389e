// Client-visible game location: `/game/{id}/position/{position}`. It mirrors the session for
// bookmarking and continuation and is never authoritative.

use std::fmt;

use crate::session::{GameId, PlayerSide};


pub const GAME_PREFIX: &str = "/game/";
pub const POSITION_PREFIX: &str = "/position/";

const DEBUG_PARAM: &str = "debug";
const DESIRED_SIDE_PARAM: &str = "desiredSide";


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LocationError {
    InvalidPath(String),
    InvalidPosition(String),
    DebugWithoutDesiredSide,
    InvalidDesiredSide(String),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationError::InvalidPath(path) => write!(f, "Invalid game path: '{}'", path),
            LocationError::InvalidPosition(pos) => write!(f, "Invalid position: '{}'", pos),
            LocationError::DebugWithoutDesiredSide => write!(
                f,
                "Debug mode requires both '{}' and '{}' parameters",
                DEBUG_PARAM, DESIRED_SIDE_PARAM
            ),
            LocationError::InvalidDesiredSide(side) => {
                write!(f, "Invalid desired side: '{}' (expected WHITE, BLACK or VIEWER)", side)
            }
        }
    }
}

impl std::error::Error for LocationError {}


pub fn game_path(game_id: &GameId, position: Option<u32>) -> String {
    match position {
        Some(position) => format!("{}{}{}{}", GAME_PREFIX, game_id, POSITION_PREFIX, position),
        None => format!("{}{}", GAME_PREFIX, game_id),
    }
}

// Which game the user asked for. No id means "create a new game".
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GameLocation {
    pub game_id: Option<GameId>,
    pub position: Option<u32>,
}

impl GameLocation {
    pub fn new_game() -> Self { Self::default() }

    pub fn parse(path: &str) -> Result<Self, LocationError> {
        let trimmed = path.trim_end_matches('/');
        let Some(rest) = format!("{}/", trimmed).strip_prefix(GAME_PREFIX).map(str::to_owned) else {
            return Ok(Self::new_game());
        };
        let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        match parts.as_slice() {
            [id] if !id.is_empty() => Ok(GameLocation {
                game_id: Some(GameId::new(*id)),
                position: None,
            }),
            [id, "position", position] if !id.is_empty() => {
                let position = position
                    .parse()
                    .map_err(|_| LocationError::InvalidPosition((*position).to_owned()))?;
                Ok(GameLocation {
                    game_id: Some(GameId::new(*id)),
                    position: Some(position),
                })
            }
            _ => Err(LocationError::InvalidPath(path.to_owned())),
        }
    }

    pub fn to_path(&self) -> Option<String> {
        self.game_id.as_ref().map(|id| game_path(id, self.position))
    }
}


// The `debug` / `desiredSide` query pair used to grab a specific side when testing locally.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DebugQuery {
    pub debug: bool,
    pub desired_side: Option<String>,
}

impl DebugQuery {
    pub fn from_query(query: &str) -> Self {
        let mut ret = DebugQuery::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                DEBUG_PARAM => ret.debug = !matches!(value.as_ref(), "false" | "0"),
                DESIRED_SIDE_PARAM if !value.is_empty() => {
                    ret.desired_side = Some(value.into_owned())
                }
                _ => {}
            }
        }
        ret
    }

    // `desiredSide` on its own is ignored. `debug` on its own is an error.
    pub fn resolve(&self) -> Result<Option<PlayerSide>, LocationError> {
        if !self.debug {
            return Ok(None);
        }
        let side = self.desired_side.as_ref().ok_or(LocationError::DebugWithoutDesiredSide)?;
        side.parse()
            .map(Some)
            .map_err(|_| LocationError::InvalidDesiredSide(side.clone()))
    }
}
