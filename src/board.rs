use std::fmt::{Debug, Display};
use std::str::FromStr;

pub const BOARD_SIZE: i8 = 8;

/// Back rank (row 0) for black, row 7 for white. White pawns advance toward row 0.
#[rustfmt::skip]
static STARTING_ROWS: [&str; 8] = [
    "rnbqkbnr",
    "pppppppp",
    "........",
    "........",
    "........",
    "........",
    "PPPPPPPP",
    "RNBQKBNR",
];

#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Row delta of a single pawn step.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Side::White => -1,
            Side::Black => 1,
        }
    }

    pub fn pawn_start_row(self) -> i8 {
        match self {
            Side::White => 6,
            Side::Black => 1,
        }
    }

    /// Row a pawn of this side promotes on.
    pub fn far_row(self) -> i8 {
        match self {
            Side::White => 0,
            Side::Black => BOARD_SIZE - 1,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub const fn new(kind: PieceKind, side: Side) -> Piece {
        Piece { kind, side }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let side = if c.is_ascii_uppercase() { Side::White } else { Side::Black };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };

        Some(Piece { kind, side })
    }

    /// Uppercase for white, lowercase for black.
    pub fn to_char(self) -> char {
        let c = match self.kind {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };

        match self.side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }
}

/// A (row, column) pair. Row 0 is black's back rank and is printed as rank 8.
///
/// Coordinates are signed so that a square stepped off the edge can still be represented;
/// [`Square::is_on_board`] tells the two apart.
#[derive(PartialEq, Eq, Copy, Clone, Hash)]
pub struct Square {
    pub row: i8,
    pub col: i8,
}

impl Square {
    pub const fn new(row: i8, col: i8) -> Square {
        Square { row, col }
    }

    pub fn is_on_board(&self) -> bool {
        (0..BOARD_SIZE).contains(&self.row) && (0..BOARD_SIZE).contains(&self.col)
    }

    pub fn offset(&self, row_delta: i8, col_delta: i8) -> Square {
        Square::new(self.row + row_delta, self.col + col_delta)
    }

    /// All 64 squares, row by row.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Square::new(row, col)))
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_on_board() {
            return write!(f, "({}, {})", self.row, self.col);
        }

        write!(f, "{}{}", (b'a' + self.col as u8) as char, BOARD_SIZE - self.row)
    }
}

impl Debug for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self, self.row, self.col)
    }
}

impl FromStr for Square {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() != 2 {
            return Err(format!("Expected square name to have 2 characters but it had {}. Value: '{s}'", chars.len()));
        }

        let col = match chars[0] {
            'a'..='h' => chars[0] as u8 - b'a',
            _ => return Err(format!("Encountered unexpected file character '{}'", chars[0])),
        };

        let row = match chars[1] {
            '1'..='8' => BOARD_SIZE as u8 - (chars[1] as u8 - b'0'),
            _ => return Err(format!("Encountered unexpected rank character '{}'", chars[1])),
        };

        Ok(Square::new(row as i8, col as i8))
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
    pub side_to_move: Side,
}

impl Board {
    pub fn empty() -> Board {
        Board {
            squares: [[None; 8]; 8],
            side_to_move: Side::White,
        }
    }

    /// Standard starting position, white to move.
    pub fn starting_position() -> Board {
        match Board::from_rows(&STARTING_ROWS, Side::White) {
            Ok(board) => board,
            Err(e) => unreachable!("starting rows are malformed: {e}"),
        }
    }

    /// Builds a board from 8 rows of 8 characters, row 0 first. Pieces use the usual letters,
    /// uppercase for white; `.` or a space marks an empty square.
    pub fn from_rows(rows: &[&str], side_to_move: Side) -> Result<Board, String> {
        if rows.len() != BOARD_SIZE as usize {
            return Err(format!("Expected 8 rows but got {}", rows.len()));
        }

        let mut board = Board::empty();
        board.side_to_move = side_to_move;

        for (row, text) in rows.iter().enumerate() {
            let chars: Vec<char> = text.chars().collect();
            if chars.len() != BOARD_SIZE as usize {
                return Err(format!(
                    "Expected row {row} to have 8 squares but it had {}. Value: '{text}'",
                    chars.len()
                ));
            }

            for (col, c) in chars.into_iter().enumerate() {
                let piece = match c {
                    '.' | ' ' => None,
                    _ => match Piece::from_char(c) {
                        Some(p) => Some(p),
                        None => {
                            return Err(format!(
                                "Encountered unexpected character '{c}' at row {row} column {col}"
                            ));
                        }
                    },
                };
                board.squares[row][col] = piece;
            }
        }

        Ok(board)
    }

    /// Contents of `square`; off-board squares read as empty.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        if !square.is_on_board() {
            return None;
        }

        self.squares[square.row as usize][square.col as usize]
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    pub fn write_piece(&mut self, piece: Option<Piece>, square: Square) {
        debug_assert!(square.is_on_board(), "write to off-board square {square:?}");
        self.squares[square.row as usize][square.col as usize] = piece;
    }

    pub fn is_owned_by(&self, square: Square, side: Side) -> bool {
        self.piece_at(square).is_some_and(|p| p.side == side)
    }

    /// Squares holding a piece of `side`, row by row.
    pub fn squares_of(&self, side: Side) -> impl Iterator<Item = Square> + '_ {
        Square::all().filter(move |sq| self.is_owned_by(*sq, side))
    }

    /// First square holding `side`'s king, or `None` on a board without one.
    pub fn find_king(&self, side: Side) -> Option<Square> {
        let king = Piece::new(PieceKind::King, side);
        Square::all().find(|sq| self.piece_at(*sq) == Some(king))
    }

    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.squares
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting_position()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, pieces) in self.squares.iter().enumerate() {
            write!(f, "{} ", BOARD_SIZE as usize - row)?;
            for piece in pieces {
                write!(f, " {}", piece.map_or('.', |p| p.to_char()))?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("squares", &"See end value")
            .field("side_to_move", &self.side_to_move)
            .finish()?;

        writeln!(f, "\nsquares: \n{self}")
    }
}
