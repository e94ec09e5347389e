use chess_client::board::{BoardModel, Cell};
use chess_client::client::ClientPhase;
use chess_client::coord::NUM_ROWS;
use chess_client::piece::piece_to_pictogram;
use chess_client::session::{PlayerSide, SessionContext};
use chess_client::side::Side;
use console::Style;
use itertools::Itertools;


fn render_cell(cell: &Cell) -> String {
    let point = cell.point();
    let text = match cell.piece {
        Some(piece) => format!(" {} ", piece_to_pictogram(piece.kind, piece.side)),
        None if cell.available => " · ".to_owned(),
        None => "   ".to_owned(),
    };
    let is_light = (point.row_index() + point.column_index()) % 2 == 1;
    let style = if cell.selected {
        Style::new().color256(232).on_color256(220)
    } else if cell.available {
        Style::new().color256(232).on_color256(114)
    } else if is_light {
        Style::new().color256(232).on_color256(180)
    } else {
        Style::new().color256(232).on_color256(137)
    };
    style.apply_to(text).to_string()
}

// Black sees row 0 at the top; everybody else (white, viewers) sees row 7 at the top.
fn row_order(side: PlayerSide) -> Vec<u8> {
    match side {
        PlayerSide::Black => (0..NUM_ROWS).collect_vec(),
        PlayerSide::White | PlayerSide::Viewer | PlayerSide::Unselected => {
            (0..NUM_ROWS).rev().collect_vec()
        }
    }
}

pub fn render_board(board: &BoardModel, side: PlayerSide) -> String {
    let col_labels =
        board.row(0).iter().map(|cell| format!(" {} ", cell.point().col_name())).join("");
    let rows = row_order(side)
        .into_iter()
        .map(|row_index| {
            let cells = board.row(row_index).iter().map(render_cell).join("");
            format!("{} {} {}", row_index + 1, cells, row_index + 1)
        })
        .join("\n");
    format!("  {}\n{}\n  {}", col_labels, rows, col_labels)
}

pub fn render_status(phase: ClientPhase, session: &SessionContext) -> String {
    match phase {
        ClientPhase::Uninitialized | ClientPhase::Negotiating => "Connecting...".to_owned(),
        ClientPhase::ChoosingMode => "Choose game mode: /mode pvp|ai|single".to_owned(),
        ClientPhase::ChoosingSide => "Choose side: /side white|black|viewer".to_owned(),
        ClientPhase::Loading => "Loading...".to_owned(),
        ClientPhase::Closed => "Bye".to_owned(),
        ClientPhase::Playing => {
            let mut status = format!(
                "Position {}, {:?} to move, you are {:?}",
                session.position,
                session.side_to_move(),
                session.side
            );
            if let Some(mode) = session.mode {
                status.push_str(&format!(" ({:?})", mode));
            }
            if let Some(side) = session.under_check_side {
                let check = format!("{:?} is in check", side);
                status.push_str(&format!("\n{}", Style::new().red().apply_to(check)));
            }
            status
        }
    }
}

pub fn promotion_prompt(side: Side) -> String {
    format!("Promote {:?} pawn: q / r / b / n, or /cancel", side)
}
