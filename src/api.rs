// Everything the client knows about the server's HTTP API. The rest of the crate speaks in
// `ApiRequest`s and `ApiReply`s; only a `Transport` touches the network.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::board::BoardModel;
use crate::coord::Point;
use crate::piece::PieceKind;
use crate::session::{GameId, GameMode, PlayerSide};
use crate::side::Side;


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    pub from: Point,
    pub to: Point,
    pub piece_from_pawn: Option<PieceKind>,
}

// Authoritative snapshot returned by every state-changing or polling call.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrangement {
    pub position: u32,
    pub cells_matrix: BoardModel,
    #[serde(default)]
    pub under_check_side: Option<Side>,
}

// The server sends the whole game entity; only these fields matter to the client.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: GameId,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub mode: Option<GameMode>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
struct SideDto {
    #[serde(default)]
    side: Option<PlayerSide>,
}


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Clone, PartialEq, Debug)]
pub struct HttpCall {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HttpResult {
    pub status: u16,
    pub body: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ApiRequest {
    CreateGame,
    GetGame { game_id: GameId },
    SetMode { game_id: GameId, mode: GameMode },
    GetSide { game_id: GameId },
    SetSide { game_id: GameId, side: PlayerSide },
    GetArrangement { game_id: GameId, position: u32 },
    // `position` is the one held when asking: destinations for an older position are stale.
    GetAvailableMoves { game_id: GameId, from: Point, position: u32 },
    SubmitMove { game_id: GameId, body: MoveBody },
    // `epoch` is the session's sync epoch when the poll was sent. Never goes over the wire.
    Listen { game_id: GameId, epoch: u32 },
    Rollback { game_id: GameId },
    Wake { game_id: GameId },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ApiResponse {
    // `None` means the server does not know the game.
    Game(Option<GameInfo>),
    Side(PlayerSide),
    Points(Vec<Point>),
    Arrangement(Arrangement),
    Empty,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ApiError {
    Network(String),
    Status { code: u16, body: String },
    Decode(String),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ApiReply {
    pub request: ApiRequest,
    pub result: Result<ApiResponse, ApiError>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(message) => write!(f, "Network error: {}", message),
            ApiError::Status { code, body } if body.is_empty() => {
                write!(f, "Server returned status {}", code)
            }
            ApiError::Status { code, body } => {
                write!(f, "Server returned status {}: {}", code, body)
            }
            ApiError::Decode(message) => write!(f, "Cannot decode server response: {}", message),
        }
    }
}

impl std::error::Error for ApiError {}


impl ApiRequest {
    pub fn to_http_call(&self) -> HttpCall {
        use ApiRequest::*;
        use HttpMethod::*;
        let (method, path, query, body) = match self {
            CreateGame => (Get, "/api/init".to_owned(), vec![], None),
            GetGame { game_id } => (Get, format!("/api/init/{}", game_id), vec![], None),
            SetMode { game_id, mode } => {
                (Post, format!("/api/init/{}/mode", game_id), vec![], Some(json!({ "mode": mode })))
            }
            GetSide { game_id } => (Get, format!("/api/init/{}/side", game_id), vec![], None),
            SetSide { game_id, side } => (
                Post,
                format!("/api/init/{}/side", game_id),
                vec![],
                // `Unselected` has no wire name: it is what the server calls `null`.
                Some(json!({ "side": serde_json::to_value(side).unwrap_or(Value::Null) })),
            ),
            GetArrangement { game_id, position } => (
                Get,
                format!("/api/init/{}/arrangement/{}", game_id, position),
                vec![],
                None,
            ),
            GetAvailableMoves { game_id, from, .. } => (
                Get,
                format!("/api/game/{}/move", game_id),
                vec![
                    ("rowIndex", from.row_index().to_string()),
                    ("columnIndex", from.column_index().to_string()),
                ],
                None,
            ),
            SubmitMove { game_id, body } => {
                (Post, format!("/api/game/{}/move", game_id), vec![], Some(json!(body)))
            }
            Listen { game_id, .. } => (Get, format!("/api/game/{}/listen", game_id), vec![], None),
            Rollback { game_id } => (Get, format!("/api/game/{}/rollback", game_id), vec![], None),
            Wake { game_id } => (Get, format!("/api/game/{}/wake", game_id), vec![], None),
        };
        HttpCall { method, path, query, body }
    }

    pub fn parse_response(&self, http: HttpResult) -> Result<ApiResponse, ApiError> {
        use ApiRequest::*;
        if matches!(self, GetGame { .. }) && http.status == 404 {
            return Ok(ApiResponse::Game(None));
        }
        if !(200..300).contains(&http.status) {
            return Err(ApiError::Status { code: http.status, body: http.body });
        }
        match self {
            CreateGame => Ok(ApiResponse::Game(Some(decode(&http.body)?))),
            GetGame { .. } => {
                if is_blank(&http.body) {
                    Ok(ApiResponse::Game(None))
                } else {
                    Ok(ApiResponse::Game(Some(decode(&http.body)?)))
                }
            }
            GetSide { .. } => {
                let dto: SideDto = decode(&http.body)?;
                Ok(ApiResponse::Side(dto.side.unwrap_or_default()))
            }
            GetAvailableMoves { .. } => Ok(ApiResponse::Points(decode(&http.body)?)),
            GetArrangement { .. } | SubmitMove { .. } | Listen { .. } | Rollback { .. } => {
                Ok(ApiResponse::Arrangement(decode(&http.body)?))
            }
            SetMode { .. } | SetSide { .. } | Wake { .. } => Ok(ApiResponse::Empty),
        }
    }

    pub fn game_id(&self) -> Option<&GameId> {
        use ApiRequest::*;
        match self {
            CreateGame => None,
            GetGame { game_id }
            | SetMode { game_id, .. }
            | GetSide { game_id }
            | SetSide { game_id, .. }
            | GetArrangement { game_id, .. }
            | GetAvailableMoves { game_id, .. }
            | SubmitMove { game_id, .. }
            | Listen { game_id, .. }
            | Rollback { game_id }
            | Wake { game_id } => Some(game_id),
        }
    }
}

fn is_blank(body: &str) -> bool {
    let body = body.trim();
    body.is_empty() || body == "null"
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
}


#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, call: HttpCall) -> Result<HttpResult, ApiError>;
}

// Performs one request. Never retries: a failure is reported once and that's it.
pub async fn execute<T: Transport + ?Sized>(transport: &T, request: ApiRequest) -> ApiReply {
    let result = match transport.send(request.to_http_call()).await {
        Ok(http) => request.parse_response(http),
        Err(err) => Err(err),
    };
    ApiReply { request, result }
}
