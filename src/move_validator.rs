use log::trace;

use crate::{
    board::{Board, PieceKind, Side, Square},
    moves::{Move, MoveRollback},
};

/// True when every square strictly between `from` and `to` is empty. The endpoints are not
/// inspected. Squares that are not on a shared rank, file or diagonal are never clear.
pub fn is_path_clear(board: &Board, from: Square, to: Square) -> bool {
    let row_delta = to.row - from.row;
    let col_delta = to.col - from.col;

    if from == to {
        return false;
    }
    if row_delta != 0 && col_delta != 0 && row_delta.abs() != col_delta.abs() {
        return false;
    }

    let row_step = row_delta.signum();
    let col_step = col_delta.signum();
    let mut current = from.offset(row_step, col_step);
    while current != to {
        if !board.is_empty(current) {
            return false;
        }
        current = current.offset(row_step, col_step);
    }

    true
}

fn is_straight(r#move: &Move) -> bool {
    r#move.from.row == r#move.to.row || r#move.from.col == r#move.to.col
}

fn is_diagonal(r#move: &Move) -> bool {
    let (dr, dc) = r#move.abs_deltas();
    dr == dc
}

/// Checks piece geometry and path clearance for `side` moving `from` to `to`.
/// Whether the move leaves `side`'s own king attacked is not considered.
pub fn is_pseudo_legal(board: &Board, r#move: &Move, side: Side) -> bool {
    let Move { from, to } = *r#move;

    if from == to {
        trace!("is_pseudo_legal: from == to");
        return false;
    }
    if !to.is_on_board() {
        trace!("is_pseudo_legal: to {to:?} is out of bounds");
        return false;
    }

    let piece = match board.piece_at(from) {
        Some(p) if p.side == side => p,
        other => {
            trace!("is_pseudo_legal: piece {other:?} at {from} does not belong to {side}");
            return false;
        }
    };

    let target = board.piece_at(to);
    if target.is_some_and(|t| t.side == side) {
        trace!("is_pseudo_legal: target square {to} holds own piece for {side}");
        return false;
    }

    let (dr, dc) = r#move.abs_deltas();
    let valid = match piece.kind {
        PieceKind::Pawn => {
            let direction = side.pawn_direction();
            let forward = to.row - from.row;

            if to.col == from.col && forward == direction && target.is_none() {
                trace!("is_pseudo_legal: {side} pawn single move valid");
                true
            } else if to.col == from.col
                && from.row == side.pawn_start_row()
                && forward == 2 * direction
                && target.is_none()
                && board.is_empty(from.offset(direction, 0))
            {
                trace!("is_pseudo_legal: {side} pawn two square initial move valid");
                true
            } else if dc == 1 && forward == direction && target.is_some() {
                // Own pieces were rejected above so the target is an opponent piece
                trace!("is_pseudo_legal: {side} pawn capture valid");
                true
            } else {
                trace!("is_pseudo_legal: pawn move invalid by pawn rules");
                false
            }
        }
        PieceKind::Knight => (dr == 1 && dc == 2) || (dr == 2 && dc == 1),
        PieceKind::Bishop => is_diagonal(r#move) && is_path_clear(board, from, to),
        PieceKind::Rook => is_straight(r#move) && is_path_clear(board, from, to),
        PieceKind::Queen => (is_straight(r#move) || is_diagonal(r#move)) && is_path_clear(board, from, to),
        PieceKind::King => dr <= 1 && dc <= 1,
    };

    if piece.kind != PieceKind::Pawn {
        if valid {
            trace!("is_pseudo_legal: {:?} move valid", piece.kind);
        } else {
            trace!("is_pseudo_legal: no {:?} rule matched", piece.kind);
        }
    }

    valid
}

/// Pseudo-legal and, once played, does not leave `side`'s king in check.
///
/// The board is simulated in place and restored before returning.
pub fn is_legal(board: &mut Board, r#move: &Move, side: Side) -> bool {
    if !is_pseudo_legal(board, r#move, side) {
        return false;
    }

    let mut rollback = MoveRollback::default();
    board.make_move(r#move, &mut rollback);
    let result = !board.is_in_check(side);
    board.unmake_move(r#move, &mut rollback);

    result
}
