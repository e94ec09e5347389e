// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chess_client::api::{
    self, ApiError, ApiReply, ApiRequest, ApiResponse, Arrangement, GameInfo, HttpCall,
    HttpMethod, HttpResult, MoveBody, Transport,
};
use chess_client::board::BoardModel;
use chess_client::client::{ClientOptions, ClientPhase, ClientState, NotableEvent};
use chess_client::coord::Point;
use chess_client::location::GameLocation;
use chess_client::session::{GameId, GameMode, PlayerSide};
use chess_client::test_util::{arrangement, board_after_move};
use serde_json::json;


pub const GAME_ID: &str = "17";

#[macro_export]
macro_rules! point {
    ($name:ident) => {
        chess_client::coord::Point::from_algebraic(stringify!($name)).unwrap()
    };
}

#[allow(dead_code)]
pub fn game_id() -> GameId { GameId::new(GAME_ID) }

#[allow(dead_code)]
pub fn continue_options(position: Option<u32>) -> ClientOptions {
    ClientOptions::new(GameLocation { game_id: Some(game_id()), position })
}

#[allow(dead_code)]
pub fn game_info(position: u32, mode: Option<GameMode>) -> GameInfo {
    GameInfo { id: game_id(), position, mode }
}


// Wraps `ClientState` and answers its requests by hand.
pub struct TestClient {
    pub state: ClientState,
}

#[allow(dead_code)]
impl TestClient {
    pub fn new(options: ClientOptions) -> Self { TestClient { state: ClientState::new(options) } }

    pub fn requests(&mut self) -> Vec<ApiRequest> {
        std::iter::from_fn(|| self.state.next_outgoing_request()).collect()
    }

    pub fn events(&mut self) -> Vec<NotableEvent> {
        std::iter::from_fn(|| self.state.next_notable_event()).collect()
    }

    pub fn alerts(&mut self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                NotableEvent::Alert(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    // Expects exactly one outgoing request and returns it.
    pub fn single_request(&mut self) -> ApiRequest {
        let mut requests = self.requests();
        assert_eq!(requests.len(), 1, "{:?}", requests);
        requests.pop().unwrap()
    }

    pub fn reply(&mut self, request: ApiRequest, result: Result<ApiResponse, ApiError>) {
        self.state.process_reply(ApiReply { request, result }).unwrap();
    }

    pub fn reply_ok(&mut self, request: ApiRequest, response: ApiResponse) {
        self.reply(request, Ok(response));
    }

    // Answers the single outgoing request.
    pub fn answer(&mut self, response: ApiResponse) {
        let request = self.single_request();
        self.reply_ok(request, response);
    }

    pub fn arrangement_reply(&mut self, request: ApiRequest, arrangement: Arrangement) {
        self.reply_ok(request, ApiResponse::Arrangement(arrangement));
    }

    pub fn board(&self) -> &BoardModel { self.state.board() }
    pub fn position(&self) -> u32 { self.state.session().position }
}

// Continues game `GAME_ID` as `side` and loads `initial`. Leaves no requests or events behind.
#[allow(dead_code)]
pub fn start_playing(mode: GameMode, side: PlayerSide, initial: Arrangement) -> TestClient {
    let mut client = TestClient::new(continue_options(None));
    client.state.start();
    client.answer(ApiResponse::Game(Some(game_info(initial.position, Some(mode)))));
    client.answer(ApiResponse::Side(side));
    client.answer(ApiResponse::Arrangement(initial));
    assert_eq!(client.state.phase(), ClientPhase::Playing);
    client.events();
    client.state.take_dirt();
    client
}


// A tiny in-memory stand-in for the game server. Knows a single game and accepts every move
// it has listed destinations for.
pub struct FakeServer {
    state: Mutex<FakeServerState>,
}

pub struct FakeServerState {
    pub exists: bool,
    pub position: u32,
    pub board: BoardModel,
    pub mode: Option<GameMode>,
    pub side: Option<PlayerSide>,
    pub destinations: HashMap<Point, Vec<Point>>,
    pub calls: Vec<HttpCall>,
}

#[allow(dead_code)]
impl FakeServer {
    pub fn new(board: BoardModel) -> Self {
        FakeServer {
            state: Mutex::new(FakeServerState {
                exists: true,
                position: 0,
                board,
                mode: None,
                side: None,
                destinations: HashMap::new(),
                calls: vec![],
            }),
        }
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeServerState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    fn handle(&self, call: HttpCall) -> HttpResult {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        let game = format!("/api/init/{}", GAME_ID);
        let play = format!("/api/game/{}", GAME_ID);
        let path = call.path.as_str();
        let ok = |body: serde_json::Value| HttpResult { status: 200, body: body.to_string() };
        let snapshot =
            |state: &FakeServerState| ok(json!(arrangement(state.position, state.board.clone())));
        match (call.method, path) {
            (HttpMethod::Get, "/api/init") => {
                state.exists = true;
                ok(json!({ "id": 17, "position": state.position, "mode": state.mode }))
            }
            (HttpMethod::Get, p) if p == game => {
                if state.exists {
                    ok(json!({ "id": 17, "position": state.position, "mode": state.mode }))
                } else {
                    HttpResult { status: 404, body: String::new() }
                }
            }
            (HttpMethod::Post, p) if p == format!("{}/mode", game) => {
                state.mode = serde_json::from_value(call.body.unwrap()["mode"].clone()).unwrap();
                ok(json!(null))
            }
            (HttpMethod::Get, p) if p == format!("{}/side", game) => {
                ok(json!({ "side": state.side }))
            }
            (HttpMethod::Post, p) if p == format!("{}/side", game) => {
                state.side = serde_json::from_value(call.body.unwrap()["side"].clone()).unwrap();
                ok(json!(null))
            }
            (HttpMethod::Get, p) if p.starts_with(&format!("{}/arrangement/", game)) => {
                snapshot(&state)
            }
            (HttpMethod::Get, p) if p == format!("{}/move", play) => {
                let query: HashMap<_, _> = call.query.iter().cloned().collect();
                let from = Point::try_new(
                    query["rowIndex"].parse().unwrap(),
                    query["columnIndex"].parse().unwrap(),
                )
                .unwrap();
                ok(json!(state.destinations.get(&from).cloned().unwrap_or_default()))
            }
            (HttpMethod::Post, p) if p == format!("{}/move", play) => {
                let body: MoveBody = serde_json::from_value(call.body.unwrap()).unwrap();
                let legal = state
                    .destinations
                    .get(&body.from)
                    .is_some_and(|destinations| destinations.contains(&body.to));
                if !legal {
                    return HttpResult { status: 400, body: "illegal move".to_owned() };
                }
                state.board = board_after_move(&state.board, body.from, body.to);
                state.position += 1;
                state.destinations.clear();
                snapshot(&state)
            }
            (HttpMethod::Get, p) if p == format!("{}/listen", play) => snapshot(&state),
            (HttpMethod::Get, p) if p == format!("{}/rollback", play) => {
                state.position = state.position.saturating_sub(1);
                snapshot(&state)
            }
            (HttpMethod::Get, p) if p == format!("{}/wake", play) => ok(json!(null)),
            _ => HttpResult { status: 404, body: format!("no route for {}", path) },
        }
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn send(&self, call: HttpCall) -> Result<HttpResult, ApiError> { Ok(self.handle(call)) }
}

// Sends every queued request and feeds back the replies until the client goes quiet.
#[allow(dead_code)]
pub async fn pump(client: &mut ClientState, server: &FakeServer) {
    while let Some(request) = client.next_outgoing_request() {
        let reply = api::execute(server, request).await;
        client.process_reply(reply).unwrap();
    }
}
