use log::debug;

use crate::api::ApiRequest;
use crate::board::BoardModel;
use crate::coord::Point;
use crate::session::SessionContext;


#[must_use]
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ClickAction {
    // Click on the selected cell, or on nothing this client may touch while nothing is selected.
    Ignore,
    // Click on a highlighted destination.
    Move { from: Point, to: Point },
    // A piece was picked up. Its destinations must be fetched with the given request.
    Select(ApiRequest),
    // Click on an empty cell or on a piece that cannot move now. Drops any selection.
    Deselect,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct DestinationQuery {
    from: Point,
    position: u32,
}

// Selected cell plus the destinations fetched for it. The board carries the matching
// `selected` / `available` flags for rendering; this is the bookkeeping that keeps them honest.
//
// Invariant: `available` is non-empty only if `selected` holds a piece of the side to move.
#[derive(Clone, Debug, Default)]
pub struct SelectionEngine {
    selected: Option<Point>,
    available: Vec<Point>,
    query: Option<DestinationQuery>,
}

impl SelectionEngine {
    pub fn new() -> Self { Self::default() }

    pub fn selected(&self) -> Option<Point> { self.selected }
    pub fn available_points(&self) -> &[Point] { &self.available }
    pub fn is_awaiting_destinations(&self) -> bool { self.query.is_some() }

    pub fn handle_click(
        &mut self, board: &mut BoardModel, session: &SessionContext, point: Point,
    ) -> ClickAction {
        if session.is_viewer() {
            return ClickAction::Ignore;
        }
        let cell = &board[point];
        if cell.selected {
            return ClickAction::Ignore;
        }
        if cell.available {
            if let Some(from) = self.selected {
                return ClickAction::Move { from, to: point };
            }
        }
        match self.select_cell(board, session, point) {
            Some(request) => ClickAction::Select(request),
            None => ClickAction::Deselect,
        }
    }

    // Drops the current selection and picks up the piece at `point` if this client may move it.
    // Returns the destination query to send on success.
    pub fn select_cell(
        &mut self, board: &mut BoardModel, session: &SessionContext, point: Point,
    ) -> Option<ApiRequest> {
        self.deselect(board);
        let game_id = session.game_id.clone()?;
        let piece = board.piece(point)?;
        if !session.may_move(piece.side) {
            return None;
        }
        board[point].selected = true;
        self.selected = Some(point);
        self.query = Some(DestinationQuery { from: point, position: session.position });
        Some(ApiRequest::GetAvailableMoves {
            game_id,
            from: point,
            position: session.position,
        })
    }

    // Highlights the destinations returned for (`from`, `position`). Replies for a selection that
    // has since changed, or for an older position, are dropped. Returns whether anything changed.
    pub fn apply_available_points(
        &mut self, board: &mut BoardModel, session: &SessionContext, from: Point, position: u32,
        points: Vec<Point>,
    ) -> bool {
        let query = DestinationQuery { from, position };
        if self.query != Some(query) || session.position != position {
            debug!("Dropping stale destinations for {} at position {}", from, position);
            return false;
        }
        self.query = None;
        self.clear_available_points(board);
        for &point in &points {
            board[point].available = true;
        }
        self.available = points;
        true
    }

    // The query failed: keep the selection, show no destinations.
    pub fn destination_query_failed(&mut self, from: Point, position: u32) {
        if self.query == Some(DestinationQuery { from, position }) {
            self.query = None;
        }
    }

    pub fn clear_available_points(&mut self, board: &mut BoardModel) {
        for point in self.available.drain(..) {
            board[point].available = false;
        }
    }

    pub fn deselect(&mut self, board: &mut BoardModel) {
        self.clear_available_points(board);
        if let Some(point) = self.selected.take() {
            board[point].selected = false;
        }
        self.query = None;
    }

    // The board was replaced wholesale, so the flags are gone already. Forget what they meant.
    pub fn invalidate(&mut self) {
        self.selected = None;
        self.available.clear();
        self.query = None;
    }
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::piece::{Piece, PieceKind};
    use crate::session::{GameId, GameMode, PlayerSide};
    use crate::side::Side;

    const WHITE_PAWN: Point = Point::new(6, 3);
    const BLACK_PAWN: Point = Point::new(1, 3);

    fn setup() -> (BoardModel, SessionContext) {
        let board = BoardModel::from_pieces([
            (WHITE_PAWN, Piece::new(PieceKind::Pawn, Side::White)),
            (BLACK_PAWN, Piece::new(PieceKind::Pawn, Side::Black)),
        ]);
        let session = SessionContext {
            game_id: Some(GameId::new("1")),
            position: 4,
            mode: Some(GameMode::Pvp),
            side: PlayerSide::White,
            game_started: true,
            ..SessionContext::new()
        };
        (board, session)
    }

    #[test]
    fn select_and_highlight() {
        let (mut board, session) = setup();
        let mut selection = SelectionEngine::new();
        let action = selection.handle_click(&mut board, &session, WHITE_PAWN);
        assert_eq!(
            action,
            ClickAction::Select(ApiRequest::GetAvailableMoves {
                game_id: GameId::new("1"),
                from: WHITE_PAWN,
                position: 4,
            })
        );
        assert_eq!(board.selected_points(), [WHITE_PAWN]);

        let destinations = vec![Point::new(5, 3), Point::new(4, 3)];
        assert!(selection.apply_available_points(
            &mut board,
            &session,
            WHITE_PAWN,
            4,
            destinations.clone()
        ));
        assert_eq!(board.available_points(), [Point::new(4, 3), Point::new(5, 3)]);
        assert_eq!(selection.available_points(), destinations);

        assert_eq!(
            selection.handle_click(&mut board, &session, Point::new(4, 3)),
            ClickAction::Move { from: WHITE_PAWN, to: Point::new(4, 3) }
        );
    }

    #[test]
    fn clicking_selected_cell_is_noop() {
        let (mut board, session) = setup();
        let mut selection = SelectionEngine::new();
        let _ = selection.handle_click(&mut board, &session, WHITE_PAWN);
        assert_eq!(selection.handle_click(&mut board, &session, WHITE_PAWN), ClickAction::Ignore);
        assert_eq!(selection.selected(), Some(WHITE_PAWN));
    }

    #[test]
    fn wrong_side_or_empty_cell_deselects() {
        let (mut board, session) = setup();
        let mut selection = SelectionEngine::new();
        let _ = selection.handle_click(&mut board, &session, WHITE_PAWN);
        assert!(selection.apply_available_points(
            &mut board,
            &session,
            WHITE_PAWN,
            4,
            vec![Point::new(5, 3)]
        ));

        assert_eq!(selection.handle_click(&mut board, &session, BLACK_PAWN), ClickAction::Deselect);
        assert!(board.selected_points().is_empty());
        assert!(board.available_points().is_empty());

        let _ = selection.handle_click(&mut board, &session, WHITE_PAWN);
        assert_eq!(
            selection.handle_click(&mut board, &session, Point::new(3, 3)),
            ClickAction::Deselect
        );
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn out_of_turn() {
        let (mut board, mut session) = setup();
        session.position = 5;
        let mut selection = SelectionEngine::new();
        assert_eq!(selection.handle_click(&mut board, &session, WHITE_PAWN), ClickAction::Deselect);
        // Black to move, but this client plays white.
        assert_eq!(selection.handle_click(&mut board, &session, BLACK_PAWN), ClickAction::Deselect);

        session.mode = Some(GameMode::Single);
        assert!(matches!(
            selection.handle_click(&mut board, &session, BLACK_PAWN),
            ClickAction::Select(_)
        ));
    }

    #[test]
    fn viewer_cannot_select() {
        let (mut board, mut session) = setup();
        session.side = PlayerSide::Viewer;
        let mut selection = SelectionEngine::new();
        assert_eq!(selection.handle_click(&mut board, &session, WHITE_PAWN), ClickAction::Ignore);
        assert!(board.selected_points().is_empty());
    }

    #[test]
    fn stale_destinations_are_dropped() {
        let (mut board, mut session) = setup();
        let mut selection = SelectionEngine::new();
        let _ = selection.handle_click(&mut board, &session, WHITE_PAWN);

        // Abandoned selection.
        let _ = selection.handle_click(&mut board, &session, Point::new(3, 3));
        assert!(!selection.apply_available_points(
            &mut board,
            &session,
            WHITE_PAWN,
            4,
            vec![Point::new(5, 3)]
        ));
        assert!(board.available_points().is_empty());

        // Position moved on while the query was in flight.
        let _ = selection.handle_click(&mut board, &session, WHITE_PAWN);
        session.position = 6;
        assert!(!selection.apply_available_points(
            &mut board,
            &session,
            WHITE_PAWN,
            4,
            vec![Point::new(5, 3)]
        ));
        assert!(board.available_points().is_empty());
    }

    #[test]
    fn only_latest_destinations_are_highlighted() {
        let (mut board, session) = setup();
        let other_pawn = Point::new(6, 4);
        board[other_pawn].piece = Some(Piece::new(PieceKind::Pawn, Side::White));
        let mut selection = SelectionEngine::new();

        let _ = selection.handle_click(&mut board, &session, WHITE_PAWN);
        assert!(selection.apply_available_points(
            &mut board,
            &session,
            WHITE_PAWN,
            4,
            vec![Point::new(5, 3), Point::new(4, 3)]
        ));
        let _ = selection.handle_click(&mut board, &session, other_pawn);
        assert!(board.available_points().is_empty());
        assert!(selection.apply_available_points(
            &mut board,
            &session,
            other_pawn,
            4,
            vec![Point::new(5, 4)]
        ));
        assert_eq!(board.available_points(), [Point::new(5, 4)]);
        assert_eq!(board.selected_points(), [other_pawn]);
    }
}
