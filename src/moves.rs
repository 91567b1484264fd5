use crate::board::{Board, Piece, Square};

#[derive(PartialEq, Eq, Copy, Clone, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Move {
        Move { from, to }
    }

    /// Row and column distance covered by the move, both non-negative.
    pub fn abs_deltas(&self) -> (i8, i8) {
        ((self.to.row - self.from.row).abs(), (self.to.col - self.from.col).abs())
    }

    pub fn pretty_print(&self, board: Option<&Board>) -> String {
        let (piece_name, capture_char) = match board {
            Some(b) => (
                b.piece_at(self.from).map_or('?', |p| p.to_char().to_ascii_uppercase()),
                if b.is_empty(self.to) { '-' } else { 'x' },
            ),
            None => ('?', '-'),
        };

        format!("{piece_name}{}{capture_char}{}", self.from, self.to)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

impl std::fmt::Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Move from: {:?} to: {:?}", self.from, self.to)
    }
}

#[derive(Debug, Default)]
pub struct MoveRollback {
    // Pushed for every move, None when nothing was captured
    pub captured_pieces: Vec<Option<Piece>>,
}

impl MoveRollback {
    pub fn is_empty(&self) -> bool {
        self.captured_pieces.is_empty()
    }
}

impl Board {
    /// Moves the piece on `from` to `to`, saving whatever stood on `to`, and passes the turn.
    /// Promotion is not applied here.
    pub fn make_move(&mut self, r#move: &Move, rollback: &mut MoveRollback) {
        let moved_piece = self.piece_at(r#move.from);
        rollback.captured_pieces.push(self.piece_at(r#move.to));

        self.write_piece(moved_piece, r#move.to);
        self.write_piece(None, r#move.from);
        self.side_to_move = self.side_to_move.opponent();
    }

    pub fn unmake_move(&mut self, r#move: &Move, rollback: &mut MoveRollback) {
        let captured_piece = rollback
            .captured_pieces
            .pop()
            .expect("unmake_move called without a matching make_move");

        let moved_piece = self.piece_at(r#move.to);
        self.write_piece(moved_piece, r#move.from);
        self.write_piece(captured_piece, r#move.to);
        self.side_to_move = self.side_to_move.opponent();
    }
}
