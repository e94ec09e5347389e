use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use instant::Instant;
use log::{debug, info, warn};

use crate::api::{ApiError, ApiReply, ApiRequest, ApiResponse, Arrangement, GameInfo};
use crate::board::BoardModel;
use crate::coord::Point;
use crate::dirty::Dirty;
use crate::location::{DebugQuery, GameLocation};
use crate::piece::PromotionPiece;
use crate::poller::{OpponentPoller, POLL_INTERVAL, PollerAction};
use crate::promotion::{
    PendingPromotion, PromotionChoice, PromotionFlow, PromotionResolver, is_promotion_move,
};
use crate::selection::{ClickAction, SelectionEngine};
use crate::session::{ArrangementVerdict, GameId, GameMode, PlayerSide, SessionContext};
use crate::submitter::{MoveSubmitter, apply_arrangement};


pub const GAME_NOT_FOUND_MESSAGE: &str = "game not found. Starting a new game...";
pub const VIEWER_ONLY_MESSAGE: &str =
    "all gaming places are occupied - you can only view this game";


#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CommandError {
    WrongPhase,
    // `Unselected` cannot be requested.
    InvalidSide,
    NoGameInProgress,
}

#[derive(Clone, Debug)]
pub enum NotableEvent {
    GameStarted,
    // The game location (`/game/{id}/position/{position}`) should be shown to the user.
    LocationChanged(String),
    MoveApplied,
    OpponentMoved,
    RolledBack,
    PromotionRequested(PromotionResolver),
    // Blocking notification.
    Alert(String),
    RedirectedToNewGame,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EventError {
    CannotApplyEvent(String),
}

#[must_use]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClickOutcome {
    Ignored,
    Selected,
    Deselected,
    MoveSubmitted,
    PromotionRequested,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClientPhase {
    // `start` hasn't been called yet.
    Uninitialized,
    // Waiting for the server during bootstrap.
    Negotiating,
    // Waiting for the user to pick a game mode.
    ChoosingMode,
    // Waiting for the user to pick a side.
    ChoosingSide,
    // Waiting for the initial arrangement.
    Loading,
    Playing,
    // Left the game. Nothing happens anymore.
    Closed,
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub location: GameLocation,
    pub debug: DebugQuery,
    pub poll_interval: Duration,
}

impl ClientOptions {
    pub fn new(location: GameLocation) -> Self {
        ClientOptions {
            location,
            debug: DebugQuery::default(),
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::WrongPhase => write!(f, "Not possible right now"),
            CommandError::InvalidSide => write!(f, "Side must be WHITE, BLACK or VIEWER"),
            CommandError::NoGameInProgress => write!(f, "No game in progress"),
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventError::CannotApplyEvent(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for EventError {}


// Client state machine. Performs no I/O: requests are queued for the host to send, replies are
// fed back through `process_reply`, and time only advances through `refresh`.
pub struct ClientState {
    options: ClientOptions,
    // Side requested via the debug query, if the query was valid.
    debug_side: Option<PlayerSide>,
    phase: ClientPhase,
    session: SessionContext,
    board: Dirty<BoardModel>,
    selection: SelectionEngine,
    promotion: PromotionFlow,
    submitter: MoveSubmitter,
    rollback_in_flight: bool,
    poller: OpponentPoller,
    outgoing_requests: VecDeque<ApiRequest>,
    notable_event_queue: VecDeque<NotableEvent>,
}

impl ClientState {
    pub fn new(options: ClientOptions) -> Self {
        let mut notable_event_queue = VecDeque::new();
        let debug_side = match options.debug.resolve() {
            Ok(side) => side,
            Err(err) => {
                warn!("Ignoring debug parameters: {}", err);
                notable_event_queue.push_back(NotableEvent::Alert(err.to_string()));
                None
            }
        };
        let session = SessionContext {
            is_debug: debug_side.is_some(),
            ..SessionContext::new()
        };
        let poller = OpponentPoller::new(options.poll_interval);
        ClientState {
            options,
            debug_side,
            phase: ClientPhase::Uninitialized,
            session,
            board: Dirty::new(BoardModel::empty()),
            selection: SelectionEngine::new(),
            promotion: PromotionFlow::new(),
            submitter: MoveSubmitter::new(),
            rollback_in_flight: false,
            poller,
            outgoing_requests: VecDeque::new(),
            notable_event_queue,
        }
    }

    pub fn phase(&self) -> ClientPhase { self.phase }
    pub fn session(&self) -> &SessionContext { &self.session }
    pub fn board(&self) -> &BoardModel { &self.board }
    pub fn selection(&self) -> &SelectionEngine { &self.selection }
    pub fn pending_promotion(&self) -> Option<&PendingPromotion> { self.promotion.pending() }
    pub fn poller(&self) -> &OpponentPoller { &self.poller }
    pub fn is_move_in_flight(&self) -> bool { self.submitter.is_in_flight() }

    pub fn next_outgoing_request(&mut self) -> Option<ApiRequest> {
        self.outgoing_requests.pop_front()
    }
    pub fn next_notable_event(&mut self) -> Option<NotableEvent> {
        self.notable_event_queue.pop_front()
    }
    // Whether the board changed since the last call.
    pub fn take_dirt(&mut self) -> bool { self.board.take_dirt() }

    pub fn start(&mut self) {
        if self.phase != ClientPhase::Uninitialized {
            return;
        }
        match self.options.location.game_id.clone() {
            Some(game_id) => {
                info!("Continuing game {}", game_id);
                self.session.game_id = Some(game_id.clone());
                self.send(ApiRequest::GetGame { game_id });
                self.phase = ClientPhase::Negotiating;
            }
            None => self.create_game(),
        }
    }

    pub fn choose_mode(&mut self, mode: GameMode) -> Result<(), CommandError> {
        if self.phase != ClientPhase::ChoosingMode {
            return Err(CommandError::WrongPhase);
        }
        let game_id = self.game_id()?;
        self.send(ApiRequest::SetMode { game_id, mode });
        self.phase = ClientPhase::Negotiating;
        Ok(())
    }

    pub fn choose_side(&mut self, side: PlayerSide) -> Result<(), CommandError> {
        if self.phase != ClientPhase::ChoosingSide {
            return Err(CommandError::WrongPhase);
        }
        if side == PlayerSide::Unselected {
            return Err(CommandError::InvalidSide);
        }
        self.register_side(side)
    }

    pub fn handle_click(&mut self, point: Point) -> ClickOutcome {
        if self.phase != ClientPhase::Playing || self.promotion.is_pending() {
            return ClickOutcome::Ignored;
        }
        let selection = &mut self.selection;
        let session = &self.session;
        // Most ignored clicks touch nothing, so the board is only flagged if the marks moved.
        let action = self.board.update(|board| {
            let selected = selection.selected();
            let available = selection.available_points().to_vec();
            let action = selection.handle_click(board, session, point);
            let changed = selection.selected() != selected
                || selection.available_points() != available.as_slice();
            (action, changed)
        });
        match action {
            ClickAction::Ignore => ClickOutcome::Ignored,
            ClickAction::Deselect => ClickOutcome::Deselected,
            ClickAction::Select(request) => {
                self.send(request);
                ClickOutcome::Selected
            }
            ClickAction::Move { from, to } => self.attempt_move(from, to),
        }
    }

    // Operator action: asks the server to take back the last move.
    pub fn rollback(&mut self) -> Result<(), CommandError> {
        let game_id = self.playing_game_id()?;
        self.send(ApiRequest::Rollback { game_id });
        self.rollback_in_flight = true;
        Ok(())
    }

    // Nudges the AI in case it is stuck.
    pub fn wake(&mut self) -> Result<(), CommandError> {
        let game_id = self.playing_game_id()?;
        self.send(ApiRequest::Wake { game_id });
        Ok(())
    }

    // Tears the session down. Stops the poller and closes any open promotion chooser.
    pub fn leave(&mut self) {
        info!("Leaving game");
        self.poller.stop();
        self.promotion.abandon();
        self.outgoing_requests.clear();
        self.phase = ClientPhase::Closed;
    }

    pub fn refresh(&mut self, now: Instant) {
        if self.phase != ClientPhase::Playing {
            return;
        }
        if let Some((promotion, choice)) = self.promotion.poll() {
            match choice {
                PromotionChoice::Promote(piece) => {
                    info!("Promoting to {:?} at {}", piece, promotion.to);
                    self.submit_move(promotion.from, promotion.to, Some(piece));
                }
                PromotionChoice::Cancel => {
                    info!("Promotion {} -> {} cancelled", promotion.from, promotion.to);
                }
            }
        }
        if let Some(game_id) = self.session.game_id.clone() {
            match self.poller.update(now) {
                PollerAction::Noop => {}
                PollerAction::SendListen => {
                    let epoch = self.session.sync_epoch;
                    self.send(ApiRequest::Listen { game_id, epoch });
                }
            }
        }
    }

    pub fn process_reply(&mut self, reply: ApiReply) -> Result<(), EventError> {
        let ApiReply { request, result } = reply;
        if self.phase == ClientPhase::Closed {
            debug!("Dropping reply to {:?}: client closed", request);
            return Ok(());
        }
        if let Some(game_id) = request.game_id() {
            if self.session.game_id.as_ref() != Some(game_id) {
                debug!("Dropping reply for game {}", game_id);
                return Ok(());
            }
        }
        match result {
            Ok(response) => self.apply_response(request, response),
            Err(err) => {
                self.apply_failure(request, err);
                Ok(())
            }
        }
    }

    fn apply_response(
        &mut self, request: ApiRequest, response: ApiResponse,
    ) -> Result<(), EventError> {
        use ApiRequest::*;
        match (request, response) {
            (CreateGame, ApiResponse::Game(Some(info))) => {
                self.on_game_created(info);
                Ok(())
            }
            (GetGame { .. }, ApiResponse::Game(None)) => {
                self.redirect_to_new_game();
                Ok(())
            }
            (GetGame { .. }, ApiResponse::Game(Some(info))) => {
                self.on_game_found(info);
                Ok(())
            }
            (SetMode { mode, .. }, ApiResponse::Empty) => {
                self.session.mode = Some(mode);
                self.negotiate_side()
            }
            (GetSide { .. }, ApiResponse::Side(side)) => self.on_side_known(side),
            (SetSide { side, .. }, ApiResponse::Empty) => {
                self.session.side = side;
                self.load();
                Ok(())
            }
            (GetArrangement { .. }, ApiResponse::Arrangement(arrangement)) => {
                self.on_initial_arrangement(arrangement)
            }
            (GetAvailableMoves { from, position, .. }, ApiResponse::Points(points)) => {
                self.ensure_playing()?;
                let selection = &mut self.selection;
                let session = &self.session;
                self.board.update(|board| {
                    let applied =
                        selection.apply_available_points(board, session, from, position, points);
                    ((), applied)
                });
                Ok(())
            }
            (SubmitMove { .. }, ApiResponse::Arrangement(arrangement)) => {
                self.ensure_playing()?;
                self.submitter.register_reply();
                // Polls sent before this reply may predate the move.
                self.session.advance_sync_epoch();
                let verdict = self.session.judge_arrangement(arrangement.position);
                self.sync_arrangement(arrangement, verdict, NotableEvent::MoveApplied);
                Ok(())
            }
            (Listen { epoch, .. }, ApiResponse::Arrangement(arrangement)) => {
                self.ensure_playing()?;
                self.poller.register_reply();
                let own_change_in_flight =
                    self.submitter.is_in_flight() || self.rollback_in_flight;
                let verdict =
                    self.session.judge_poll(epoch, arrangement.position, own_change_in_flight);
                self.sync_arrangement(arrangement, verdict, NotableEvent::OpponentMoved);
                Ok(())
            }
            (Rollback { .. }, ApiResponse::Arrangement(arrangement)) => {
                self.ensure_playing()?;
                self.rollback_in_flight = false;
                // Applied whatever the position. Polls already on their way describe the game
                // before the rollback.
                self.session.advance_sync_epoch();
                info!("Rolled back to position {}", arrangement.position);
                self.replace_state(arrangement, NotableEvent::RolledBack);
                Ok(())
            }
            (Wake { .. }, _) => Ok(()),
            (request, response) => Err(EventError::CannotApplyEvent(format!(
                "Unexpected response to {:?}: {:?}",
                request, response
            ))),
        }
    }

    // No retries: every failure is final for that request and leaves state as it was.
    fn apply_failure(&mut self, request: ApiRequest, err: ApiError) {
        use ApiRequest::*;
        match request {
            GetAvailableMoves { from, position, .. } => {
                warn!("Cannot get destinations for {}: {}", from, err);
                self.selection.destination_query_failed(from, position);
            }
            SubmitMove { body, .. } => {
                self.submitter.register_reply();
                warn!("Move {} -> {} failed: {}", body.from, body.to, err);
                self.alert(format!("Move failed: {}", err));
            }
            Listen { .. } => {
                self.poller.register_reply();
                warn!("Poll failed: {}", err);
            }
            Wake { .. } => warn!("Wake failed: {}", err),
            Rollback { .. } => {
                self.rollback_in_flight = false;
                self.alert(format!("Rollback failed: {}", err));
            }
            CreateGame | GetGame { .. } | SetMode { .. } | GetSide { .. } | SetSide { .. }
            | GetArrangement { .. } => {
                warn!("Bootstrap request {:?} failed: {}", request, err);
                self.alert(format!("Cannot start the game: {}", err));
            }
        }
    }

    fn create_game(&mut self) {
        info!("Creating a new game");
        self.send(ApiRequest::CreateGame);
        self.phase = ClientPhase::Negotiating;
    }

    fn redirect_to_new_game(&mut self) {
        warn!("Game {:?} not found", self.session.game_id);
        self.alert(GAME_NOT_FOUND_MESSAGE.to_owned());
        self.notable_event_queue.push_back(NotableEvent::RedirectedToNewGame);
        self.session = SessionContext {
            is_debug: self.session.is_debug,
            ..SessionContext::new()
        };
        self.options.location = GameLocation::new_game();
        self.create_game();
    }

    fn on_game_created(&mut self, info: GameInfo) {
        info!("Created game {}", info.id);
        self.session.game_id = Some(info.id);
        self.session.position = info.position;
        self.session.mode = info.mode;
        self.phase = ClientPhase::ChoosingMode;
    }

    fn on_game_found(&mut self, info: GameInfo) {
        // The location may point past the end of the game: never ask for a future position.
        let position = match self.options.location.position {
            Some(requested) => requested.min(info.position),
            None => info.position,
        };
        self.session.position = position;
        self.session.mode = info.mode;
        let Some(game_id) = self.session.game_id.clone() else {
            return;
        };
        match (self.debug_side, info.mode) {
            (_, None) => self.phase = ClientPhase::ChoosingMode,
            (Some(side), Some(_)) => {
                info!("Debug mode: requesting {:?}", side);
                self.send(ApiRequest::SetSide { game_id, side });
                self.phase = ClientPhase::Negotiating;
            }
            (None, Some(_)) => {
                self.send(ApiRequest::GetSide { game_id });
                self.phase = ClientPhase::Negotiating;
            }
        }
    }

    fn on_side_known(&mut self, side: PlayerSide) -> Result<(), EventError> {
        match side {
            PlayerSide::Unselected => {
                if self.session.mode.is_none() {
                    self.phase = ClientPhase::ChoosingMode;
                    Ok(())
                } else {
                    self.negotiate_side()
                }
            }
            PlayerSide::Viewer => {
                self.session.side = side;
                self.alert(VIEWER_ONLY_MESSAGE.to_owned());
                self.load();
                Ok(())
            }
            PlayerSide::White | PlayerSide::Black => {
                self.session.side = side;
                self.load();
                Ok(())
            }
        }
    }

    // Mode is known; figure out the side. One client moves both sides in SINGLE mode.
    fn negotiate_side(&mut self) -> Result<(), EventError> {
        let side = if self.session.mode == Some(GameMode::Single) {
            Some(PlayerSide::White)
        } else {
            self.debug_side
        };
        match side {
            Some(side) => self.register_side(side).map_err(|err| {
                EventError::CannotApplyEvent(format!("Cannot register side: {}", err))
            }),
            None => {
                self.phase = ClientPhase::ChoosingSide;
                Ok(())
            }
        }
    }

    fn register_side(&mut self, side: PlayerSide) -> Result<(), CommandError> {
        let game_id = self.game_id()?;
        info!("Registering as {:?}", side);
        self.send(ApiRequest::SetSide { game_id, side });
        self.phase = ClientPhase::Negotiating;
        Ok(())
    }

    fn load(&mut self) {
        let Some(game_id) = self.session.game_id.clone() else {
            return;
        };
        self.send(ApiRequest::GetArrangement { game_id, position: self.session.position });
        self.phase = ClientPhase::Loading;
    }

    fn on_initial_arrangement(&mut self, arrangement: Arrangement) -> Result<(), EventError> {
        if self.phase != ClientPhase::Loading {
            return Err(EventError::CannotApplyEvent(format!(
                "Got initial arrangement in phase {:?}",
                self.phase
            )));
        }
        apply_arrangement(&mut self.session, &mut self.board, arrangement);
        self.session.game_started = true;
        self.phase = ClientPhase::Playing;
        info!(
            "Game {:?} started at position {} as {:?}",
            self.session.game_id, self.session.position, self.session.side
        );
        self.notable_event_queue.push_back(NotableEvent::GameStarted);
        self.push_location();
        if self.session.wants_polling() {
            self.poller.start();
        }
        Ok(())
    }

    fn attempt_move(&mut self, from: Point, to: Point) -> ClickOutcome {
        if self.submitter.is_in_flight() {
            return ClickOutcome::Ignored;
        }
        let Some(piece) = self.board.piece(from) else {
            return ClickOutcome::Ignored;
        };
        if is_promotion_move(piece, to) {
            let resolver = self.promotion.start(PendingPromotion { from, to, side: piece.side });
            self.notable_event_queue.push_back(NotableEvent::PromotionRequested(resolver));
            return ClickOutcome::PromotionRequested;
        }
        if self.submit_move(from, to, None) {
            ClickOutcome::MoveSubmitted
        } else {
            ClickOutcome::Ignored
        }
    }

    fn submit_move(
        &mut self, from: Point, to: Point, promotion: Option<PromotionPiece>,
    ) -> bool {
        let Some(game_id) = self.session.game_id.clone() else {
            return false;
        };
        match self.submitter.submit(game_id, from, to, promotion) {
            Some(request) => {
                info!("Submitting move {} -> {}", from, to);
                self.send(request);
                true
            }
            None => false,
        }
    }

    // Moves and polls may race. A stale poll must not overwrite a fresher own-move result,
    // see `SessionContext::judge_poll`.
    fn sync_arrangement(
        &mut self, arrangement: Arrangement, verdict: ArrangementVerdict, event: NotableEvent,
    ) {
        match verdict {
            ArrangementVerdict::Apply => self.replace_state(arrangement, event),
            ArrangementVerdict::Rewind => {
                info!(
                    "Server went back from position {} to {}",
                    self.session.position, arrangement.position
                );
                self.replace_state(arrangement, NotableEvent::RolledBack);
            }
            ArrangementVerdict::Duplicate => {}
            ArrangementVerdict::Stale => debug!(
                "Dropping stale arrangement at position {} (have {})",
                arrangement.position, self.session.position
            ),
        }
    }

    fn replace_state(&mut self, arrangement: Arrangement, event: NotableEvent) {
        // The pending promotion refers to the old board.
        self.promotion.abandon();
        self.selection.invalidate();
        apply_arrangement(&mut self.session, &mut self.board, arrangement);
        self.notable_event_queue.push_back(event);
        self.push_location();
    }

    fn push_location(&mut self) {
        if let Some(path) = self.session.location_path() {
            self.notable_event_queue.push_back(NotableEvent::LocationChanged(path));
        }
    }

    fn ensure_playing(&self) -> Result<(), EventError> {
        if self.phase == ClientPhase::Playing {
            Ok(())
        } else {
            Err(EventError::CannotApplyEvent(format!(
                "Got game reply in phase {:?}",
                self.phase
            )))
        }
    }

    fn game_id(&self) -> Result<GameId, CommandError> {
        self.session.game_id.clone().ok_or(CommandError::NoGameInProgress)
    }

    fn playing_game_id(&self) -> Result<GameId, CommandError> {
        if self.phase != ClientPhase::Playing {
            return Err(CommandError::NoGameInProgress);
        }
        self.game_id()
    }

    fn alert(&mut self, message: String) {
        self.notable_event_queue.push_back(NotableEvent::Alert(message));
    }

    fn send(&mut self, request: ApiRequest) { self.outgoing_requests.push_back(request); }
}
