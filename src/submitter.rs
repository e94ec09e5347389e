use log::info;

use crate::api::{ApiRequest, Arrangement, MoveBody};
use crate::board::BoardModel;
use crate::coord::Point;
use crate::dirty::Dirty;
use crate::piece::PromotionPiece;
use crate::session::{GameId, SessionContext};


// Sends confirmed moves. Moves are never applied optimistically: the board changes only when
// the server answers with an arrangement, so a rejected move leaves nothing to undo.
#[derive(Clone, Debug, Default)]
pub struct MoveSubmitter {
    in_flight: Option<MoveBody>,
}

impl MoveSubmitter {
    pub fn new() -> Self { Self::default() }

    pub fn in_flight(&self) -> Option<&MoveBody> { self.in_flight.as_ref() }
    pub fn is_in_flight(&self) -> bool { self.in_flight.is_some() }

    // Returns `None` while another move awaits its reply.
    pub fn submit(
        &mut self, game_id: GameId, from: Point, to: Point, promotion: Option<PromotionPiece>,
    ) -> Option<ApiRequest> {
        if self.is_in_flight() {
            info!("Ignoring move {} -> {}: previous move not confirmed yet", from, to);
            return None;
        }
        let body = MoveBody {
            from,
            to,
            piece_from_pawn: promotion.map(Into::into),
        };
        self.in_flight = Some(body.clone());
        Some(ApiRequest::SubmitMove { game_id, body })
    }

    pub fn register_reply(&mut self) -> Option<MoveBody> { self.in_flight.take() }
}

// Wholesale replacement of local state by an authoritative snapshot. No merging: the matrix,
// the position and the check state all come from the server.
pub fn apply_arrangement(
    session: &mut SessionContext, board: &mut Dirty<BoardModel>, arrangement: Arrangement,
) {
    let Arrangement { position, mut cells_matrix, under_check_side } = arrangement;
    cells_matrix.clear_ui_flags();
    session.position = position;
    session.under_check_side = under_check_side;
    board.replace(cells_matrix);
}
