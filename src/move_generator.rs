use log::{debug, error};

use crate::{
    board::{Board, Side, Square},
    move_validator::is_pseudo_legal,
    moves::{Move, MoveRollback},
};

/// Compare the board against a copy after every unmake. On for test builds
pub const ENABLE_UNMAKE_MOVE_TEST: bool = cfg!(test);

impl Board {
    /// True when some piece of the opponent could pseudo-legally move onto `side`'s king.
    /// A board without a king for `side` is reported as not in check.
    pub fn is_in_check(&self, side: Side) -> bool {
        let king = match self.find_king(side) {
            Some(sq) => sq,
            None => {
                debug!("is_in_check: no {side} king on the board");
                return false;
            }
        };

        self.attacker_of(king, side.opponent()).is_some()
    }

    /// First square holding a piece of `attacker` that could pseudo-legally move to `target`.
    pub fn attacker_of(&self, target: Square, attacker: Side) -> Option<Square> {
        self.squares_of(attacker)
            .find(|from| is_pseudo_legal(self, &Move::new(*from, target), attacker))
    }

    /// Every pseudo-legal move of `side` that does not leave its own king in check.
    ///
    /// Each candidate is played on the board and taken back before the next one is tried, so the
    /// board is unchanged once this returns.
    pub fn generate_legal_moves(&mut self, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut rollback = MoveRollback::default();
        let board_copy = if ENABLE_UNMAKE_MOVE_TEST { Some(self.clone()) } else { None };

        let origins: Vec<Square> = self.squares_of(side).collect();
        for from in origins {
            for to in Square::all() {
                let r#move = Move::new(from, to);
                if !is_pseudo_legal(self, &r#move, side) {
                    continue;
                }

                self.make_move(&r#move, &mut rollback);
                if !self.is_in_check(side) {
                    moves.push(r#move);
                }
                self.unmake_move(&r#move, &mut rollback);

                if let Some(copy) = board_copy.as_ref() {
                    if copy != &*self {
                        error!("unmake move did not properly undo move {:?}", r#move);
                        assert_eq!(copy, &*self);
                    }
                }
            }
        }

        moves
    }

    pub fn has_legal_move(&mut self, side: Side) -> bool {
        !self.generate_legal_moves(side).is_empty()
    }
}
