use clap::ValueEnum;
use log::debug;

use crate::board::{Board, Piece, PieceKind, Side, Square};

/// Kinds a pawn may become.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash, ValueEnum)]
pub enum PromotionKind {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionKind {
    pub const ALL: [PromotionKind; 4] = [
        PromotionKind::Queen,
        PromotionKind::Rook,
        PromotionKind::Bishop,
        PromotionKind::Knight,
    ];

    pub fn piece_kind(self) -> PieceKind {
        match self {
            PromotionKind::Queen => PieceKind::Queen,
            PromotionKind::Rook => PieceKind::Rook,
            PromotionKind::Bishop => PieceKind::Bishop,
            PromotionKind::Knight => PieceKind::Knight,
        }
    }

    pub fn from_piece_kind(kind: PieceKind) -> Option<PromotionKind> {
        PromotionKind::ALL.into_iter().find(|k| k.piece_kind() == kind)
    }

    pub fn from_char(c: char) -> Option<PromotionKind> {
        match c.to_ascii_lowercase() {
            'q' => Some(PromotionKind::Queen),
            'r' => Some(PromotionKind::Rook),
            'b' => Some(PromotionKind::Bishop),
            'n' => Some(PromotionKind::Knight),
            _ => None,
        }
    }
}

/// Supplies the piece a pawn becomes. May block until a choice is made.
pub trait PromotionChooser {
    fn request_promotion_choice(&mut self, side: Side) -> PromotionKind;
}

/// Always answers with the same kind, without asking anyone.
#[derive(Copy, Clone, Debug)]
pub struct FixedPromotion(pub PromotionKind);

impl PromotionChooser for FixedPromotion {
    fn request_promotion_choice(&mut self, _side: Side) -> PromotionKind {
        self.0
    }
}

/// True when the piece on `square` is a pawn of `side` standing on its far row.
pub fn needs_promotion(board: &Board, square: Square, side: Side) -> bool {
    board.piece_at(square) == Some(Piece::new(PieceKind::Pawn, side)) && square.row == side.far_row()
}

/// Replaces a pawn of `side` that just arrived on its far row with the piece `chooser` picks.
/// Returns false and leaves the board alone for anything else.
pub fn try_promote<C: PromotionChooser + ?Sized>(board: &mut Board, square: Square, side: Side, chooser: &mut C) -> bool {
    if !needs_promotion(board, square, side) {
        return false;
    }

    let kind = chooser.request_promotion_choice(side);
    debug!("Promoting {side} pawn on {square} to {kind:?}");
    board.write_piece(Some(Piece::new(kind.piece_kind(), side)), square);

    true
}

#[cfg(test)]
mod promotion_tests {
    use super::*;

    struct CountingChooser {
        kind: PromotionKind,
        calls: usize,
    }

    impl PromotionChooser for CountingChooser {
        fn request_promotion_choice(&mut self, _side: Side) -> PromotionKind {
            self.calls += 1;
            self.kind
        }
    }

    fn board() -> Board {
        Board::from_rows(
            &[
                "...P...k",
                "........",
                "........",
                "........",
                "........",
                "........",
                "P.......",
                ".p..K...",
            ],
            Side::White,
        )
        .unwrap()
    }

    #[test]
    pub fn white_pawn_on_row_zero_promotes() {
        let mut board = board();
        let mut chooser = CountingChooser { kind: PromotionKind::Knight, calls: 0 };

        assert!(try_promote(&mut board, Square::new(0, 3), Side::White, &mut chooser));
        assert_eq!(Some(Piece::new(PieceKind::Knight, Side::White)), board.piece_at(Square::new(0, 3)));
        assert_eq!(1, chooser.calls);
    }

    #[test]
    pub fn black_pawn_on_row_seven_promotes() {
        let mut board = board();

        assert!(try_promote(&mut board, Square::new(7, 1), Side::Black, &mut FixedPromotion(PromotionKind::Queen)));
        assert_eq!(Some(Piece::new(PieceKind::Queen, Side::Black)), board.piece_at(Square::new(7, 1)));
    }

    #[test]
    pub fn other_squares_are_untouched() {
        let mut board = board();
        let before = board.clone();
        let mut chooser = CountingChooser { kind: PromotionKind::Queen, calls: 0 };

        // Pawn not on its far row
        assert!(!try_promote(&mut board, Square::new(6, 0), Side::White, &mut chooser));
        // King on the far row
        assert!(!try_promote(&mut board, Square::new(0, 7), Side::Black, &mut chooser));
        // Wrong side for the pawn
        assert!(!try_promote(&mut board, Square::new(0, 3), Side::Black, &mut chooser));
        // Empty square
        assert!(!try_promote(&mut board, Square::new(0, 0), Side::White, &mut chooser));

        assert_eq!(before, board);
        assert_eq!(0, chooser.calls);
    }

    #[test]
    pub fn promotion_letters() {
        assert_eq!(Some(PromotionKind::Queen), PromotionKind::from_char('Q'));
        assert_eq!(Some(PromotionKind::Knight), PromotionKind::from_char('n'));
        assert_eq!(None, PromotionKind::from_char('k'));
        assert_eq!(None, PromotionKind::from_char('p'));
    }
}
