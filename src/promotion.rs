// Pawn promotion chooser. The state machine keeps the receiving half of a one-shot channel and
// hands the sending half (`PromotionResolver`) to whoever draws the chooser.

use async_std::channel::{self, Receiver, Sender, TryRecvError};
use log::info;

use crate::coord::{NUM_ROWS, Point};
use crate::piece::{Piece, PieceKind, PromotionPiece};
use crate::side::Side;


// Literal board rows, regardless of which side the pawn belongs to.
pub fn is_promotion_row(row_index: u8) -> bool { row_index == 0 || row_index == NUM_ROWS - 1 }

pub fn is_promotion_move(piece: Piece, to: Point) -> bool {
    piece.kind == PieceKind::Pawn && is_promotion_row(to.row_index())
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PromotionChoice {
    Promote(PromotionPiece),
    Cancel,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PendingPromotion {
    pub from: Point,
    pub to: Point,
    pub side: Side,
}

// Resolves the pending promotion. Only the first answer counts. Dropping all clones without
// answering cancels the promotion.
#[derive(Clone, Debug)]
pub struct PromotionResolver {
    side: Side,
    tx: Sender<PromotionChoice>,
}

impl PromotionResolver {
    // Side of the promoting pawn; the chooser shows pieces of this color.
    pub fn side(&self) -> Side { self.side }

    // Returns false if the promotion has already been resolved or abandoned.
    pub fn choose(&self, piece: PromotionPiece) -> bool {
        self.tx.try_send(PromotionChoice::Promote(piece)).is_ok()
    }

    pub fn cancel(&self) -> bool { self.tx.try_send(PromotionChoice::Cancel).is_ok() }

    pub fn is_open(&self) -> bool { !self.tx.is_closed() && self.tx.is_empty() }
}

#[derive(Debug, Default)]
pub struct PromotionFlow {
    pending: Option<(PendingPromotion, Receiver<PromotionChoice>)>,
}

impl PromotionFlow {
    pub fn new() -> Self { Self::default() }

    pub fn pending(&self) -> Option<&PendingPromotion> { self.pending.as_ref().map(|(p, _)| p) }
    pub fn is_pending(&self) -> bool { self.pending.is_some() }

    // Opens the chooser. There is at most one pending promotion: a previous one is abandoned.
    pub fn start(&mut self, promotion: PendingPromotion) -> PromotionResolver {
        self.abandon();
        let (tx, rx) = channel::bounded(1);
        self.pending = Some((promotion, rx));
        PromotionResolver { side: promotion.side, tx }
    }

    // Checks whether the chooser has been resolved. Never blocks.
    pub fn poll(&mut self) -> Option<(PendingPromotion, PromotionChoice)> {
        let (_, rx) = self.pending.as_ref()?;
        let choice = match rx.try_recv() {
            Ok(choice) => choice,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => PromotionChoice::Cancel,
        };
        let (promotion, _) = self.pending.take()?;
        Some((promotion, choice))
    }

    // Closes the channel, so late answers from the chooser go nowhere.
    pub fn abandon(&mut self) -> Option<PendingPromotion> {
        let (promotion, rx) = self.pending.take()?;
        rx.close();
        info!("Abandoned promotion {} -> {}", promotion.from, promotion.to);
        Some(promotion)
    }
}
