use std::fmt::Display;

use clap::ValueEnum;
use log::{debug, info, warn};
use rand::{Rng, seq::SliceRandom};

use crate::{
    board::{Board, Piece, Side, Square},
    move_validator::is_pseudo_legal,
    moves::{Move, MoveRollback},
    promotion::{FixedPromotion, PromotionChooser, PromotionKind, try_promote},
};

pub const MESSAGE_KING_IN_CHECK: &str = "Invalid move: King is in check!";
pub const MESSAGE_PROMOTED: &str = "Pawn Promoted!";
pub const MESSAGE_CHECK: &str = "Check!";

#[derive(PartialEq, Eq, Copy, Clone, Debug, ValueEnum)]
pub enum PlayerKind {
    Human,
    /// Plays a uniformly random legal move
    Random,
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum GameResult {
    Checkmate { winner: Side },
    Stalemate,
}

impl Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::Checkmate { winner: Side::White } => write!(f, "Checkmate! White wins!"),
            GameResult::Checkmate { winner: Side::Black } => write!(f, "Checkmate! Black wins!"),
            GameResult::Stalemate => write!(f, "Stalemate!"),
        }
    }
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum TurnState {
    AwaitingSelection(Side),
    AwaitingDestination(Side, Square),
    Terminal(GameResult),
}

/// What a square input did to the game.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum InputOutcome {
    Ignored,
    Selected(Square),
    Deselected,
    /// Not a move the selected piece can make; the selection is kept
    KeptSelection,
    /// Would have left the mover's king in check and was taken back
    Rejected,
    Moved(Move),
}

/// The rendering and input layer the controller talks back to.
pub trait Frontend: PromotionChooser {
    fn notify(&mut self, message: &str);
}

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct PlayedMove {
    pub r#move: Move,
    pub side: Side,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<PromotionKind>,
}

impl Display for PlayedMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let capture_char = if self.captured.is_some() { 'x' } else { '-' };
        write!(
            f,
            "{}{}{capture_char}{}",
            self.piece.to_char().to_ascii_uppercase(),
            self.r#move.from,
            self.r#move.to
        )?;
        if let Some(kind) = self.promotion {
            write!(f, "={}", Piece::new(kind.piece_kind(), Side::White).to_char())?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug)]
pub struct GameConfig {
    pub white: PlayerKind,
    pub black: PlayerKind,
    /// Used by random players, which never ask the frontend
    pub auto_promotion: PromotionKind,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            white: PlayerKind::Human,
            black: PlayerKind::Random,
            auto_promotion: PromotionKind::Queen,
        }
    }
}

pub struct Game<R: Rng> {
    board: Board,
    state: TurnState,
    config: GameConfig,
    history: Vec<PlayedMove>,
    rng: R,
}

impl<R: Rng> Game<R> {
    pub fn new(config: GameConfig, rng: R) -> Game<R> {
        Game::from_board(Board::starting_position(), config, rng)
    }

    /// Starts from an arbitrary position with `board.side_to_move` to play. The game may already
    /// be over.
    pub fn from_board(board: Board, config: GameConfig, rng: R) -> Game<R> {
        let side = board.side_to_move;
        let mut game = Game {
            board,
            state: TurnState::AwaitingSelection(side),
            config,
            history: Vec::new(),
            rng,
        };
        game.state = game.enter_turn(side);
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    pub fn side_to_move(&self) -> Side {
        self.board.side_to_move
    }

    pub fn selected_square(&self) -> Option<Square> {
        match self.state {
            TurnState::AwaitingDestination(_, selected) => Some(selected),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<GameResult> {
        match self.state {
            TurnState::Terminal(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.result().is_some()
    }

    pub fn player(&self, side: Side) -> PlayerKind {
        match side {
            Side::White => self.config.white,
            Side::Black => self.config.black,
        }
    }

    /// True when it is an automated side's turn and [`Game::tick`] has work to do.
    pub fn awaiting_automated_move(&self) -> bool {
        matches!(self.state, TurnState::AwaitingSelection(side) if self.player(side) != PlayerKind::Human)
    }

    pub fn legal_moves(&mut self) -> Vec<Move> {
        if self.is_over() {
            return Vec::new();
        }

        let side = self.board.side_to_move;
        self.board.generate_legal_moves(side)
    }

    /// Routes a square input to [`Game::select_square`] or [`Game::choose_destination`]
    /// depending on the current state.
    pub fn click(&mut self, square: Square, frontend: &mut dyn Frontend) -> InputOutcome {
        match self.state {
            TurnState::AwaitingSelection(_) => self.select_square(square),
            TurnState::AwaitingDestination(_, _) => self.choose_destination(square, frontend),
            TurnState::Terminal(_) => InputOutcome::Ignored,
        }
    }

    pub fn select_square(&mut self, square: Square) -> InputOutcome {
        match self.state {
            TurnState::AwaitingSelection(side)
                if self.player(side) == PlayerKind::Human && self.board.is_owned_by(square, side) =>
            {
                debug!("{side} selected {square}");
                self.state = TurnState::AwaitingDestination(side, square);
                InputOutcome::Selected(square)
            }
            _ => InputOutcome::Ignored,
        }
    }

    pub fn choose_destination(&mut self, square: Square, frontend: &mut dyn Frontend) -> InputOutcome {
        let (side, selected) = match self.state {
            TurnState::AwaitingDestination(side, selected) => (side, selected),
            _ => return InputOutcome::Ignored,
        };

        if square == selected {
            self.state = TurnState::AwaitingSelection(side);
            return InputOutcome::Deselected;
        }

        if self.board.is_owned_by(square, side) {
            debug!("{side} reselected {square}");
            self.state = TurnState::AwaitingDestination(side, square);
            return InputOutcome::Selected(square);
        }

        let r#move = Move::new(selected, square);
        if !is_pseudo_legal(&self.board, &r#move, side) {
            debug!("{side} tried {} which the piece cannot make", r#move);
            return InputOutcome::KeptSelection;
        }

        let piece = self.board.piece_at(selected);
        let mut rollback = MoveRollback::default();
        self.board.make_move(&r#move, &mut rollback);

        if self.board.is_in_check(side) {
            self.board.unmake_move(&r#move, &mut rollback);
            info!("Rejected {} for {side}: king would be in check", r#move);
            frontend.notify(MESSAGE_KING_IN_CHECK);
            return InputOutcome::Rejected;
        }

        let captured = rollback.captured_pieces.pop().flatten();
        self.complete_move(r#move, side, piece, captured, frontend);

        InputOutcome::Moved(r#move)
    }

    /// Plays one random legal move if an automated side is to move. Returns the move played.
    pub fn tick(&mut self, frontend: &mut dyn Frontend) -> Option<Move> {
        let side = match self.state {
            TurnState::AwaitingSelection(side) if self.player(side) != PlayerKind::Human => side,
            _ => return None,
        };

        let moves = self.board.generate_legal_moves(side);
        let r#move = match moves.choose(&mut self.rng) {
            Some(m) => *m,
            None => {
                self.state = self.terminal_state(side);
                self.announce_result(frontend);
                return None;
            }
        };

        debug!("{side} picked {} out of {} legal moves", r#move, moves.len());
        let piece = self.board.piece_at(r#move.from);
        let mut rollback = MoveRollback::default();
        self.board.make_move(&r#move, &mut rollback);
        let captured = rollback.captured_pieces.pop().flatten();
        self.complete_move(r#move, side, piece, captured, frontend);

        Some(r#move)
    }

    /// Ticks until the game ends, a human is to move, or `max_plies` moves have been played in
    /// total.
    pub fn play_out(&mut self, max_plies: usize, frontend: &mut dyn Frontend) -> Option<GameResult> {
        while self.history.len() < max_plies && self.tick(frontend).is_some() {}

        if !self.is_over() && self.history.len() >= max_plies {
            warn!("Stopping after {max_plies} plies without a result");
        }

        self.result()
    }

    fn complete_move(
        &mut self,
        r#move: Move,
        side: Side,
        piece: Option<Piece>,
        captured: Option<Piece>,
        frontend: &mut dyn Frontend,
    ) {
        let promoted = match self.player(side) {
            PlayerKind::Human => try_promote(&mut self.board, r#move.to, side, frontend),
            PlayerKind::Random => try_promote(
                &mut self.board,
                r#move.to,
                side,
                &mut FixedPromotion(self.config.auto_promotion),
            ),
        };
        let promotion = if promoted {
            frontend.notify(MESSAGE_PROMOTED);
            self.board
                .piece_at(r#move.to)
                .and_then(|p| PromotionKind::from_piece_kind(p.kind))
        } else {
            None
        };

        let played = PlayedMove {
            r#move,
            side,
            piece: piece.unwrap_or_else(|| unreachable!("moved from an empty square {}", r#move.from)),
            captured,
            promotion,
        };
        info!("{side} played {played}");
        self.history.push(played);

        let next = self.board.side_to_move;
        self.state = self.enter_turn(next);
        match self.state {
            TurnState::Terminal(_) => self.announce_result(frontend),
            TurnState::AwaitingSelection(next) if self.board.is_in_check(next) => frontend.notify(MESSAGE_CHECK),
            _ => {}
        }
    }

    fn enter_turn(&mut self, side: Side) -> TurnState {
        if self.board.has_legal_move(side) {
            TurnState::AwaitingSelection(side)
        } else {
            self.terminal_state(side)
        }
    }

    fn terminal_state(&self, side: Side) -> TurnState {
        if self.board.is_in_check(side) {
            TurnState::Terminal(GameResult::Checkmate { winner: side.opponent() })
        } else {
            TurnState::Terminal(GameResult::Stalemate)
        }
    }

    fn announce_result(&self, frontend: &mut dyn Frontend) {
        if let TurnState::Terminal(result) = self.state {
            info!("Game over after {} plies: {result}", self.history.len());
            frontend.notify(&result.to_string());
        }
    }
}

#[cfg(test)]
mod game_tests {
    use rand::{SeedableRng, rngs::StdRng};

    use crate::board::PieceKind;

    use super::*;

    #[derive(Default)]
    struct RecordingFrontend {
        messages: Vec<String>,
        promotion_requests: usize,
    }

    impl PromotionChooser for RecordingFrontend {
        fn request_promotion_choice(&mut self, _side: Side) -> PromotionKind {
            self.promotion_requests += 1;
            PromotionKind::Knight
        }
    }

    impl Frontend for RecordingFrontend {
        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn hot_seat() -> GameConfig {
        GameConfig {
            white: PlayerKind::Human,
            black: PlayerKind::Human,
            auto_promotion: PromotionKind::Queen,
        }
    }

    fn seeded(config: GameConfig) -> Game<StdRng> {
        Game::new(config, StdRng::seed_from_u64(7))
    }

    #[test]
    pub fn selection_needs_own_piece() {
        let mut game = seeded(hot_seat());
        let mut ui = RecordingFrontend::default();

        assert_eq!(InputOutcome::Ignored, game.click(sq("e4"), &mut ui));
        assert_eq!(InputOutcome::Ignored, game.click(sq("e7"), &mut ui));
        assert_eq!(TurnState::AwaitingSelection(Side::White), game.state());

        assert_eq!(InputOutcome::Selected(sq("e2")), game.click(sq("e2"), &mut ui));
        assert_eq!(Some(sq("e2")), game.selected_square());
    }

    #[test]
    pub fn deselect_and_reselect() {
        let mut game = seeded(hot_seat());
        let mut ui = RecordingFrontend::default();

        game.click(sq("e2"), &mut ui);
        assert_eq!(InputOutcome::Deselected, game.click(sq("e2"), &mut ui));
        assert_eq!(TurnState::AwaitingSelection(Side::White), game.state());

        game.click(sq("e2"), &mut ui);
        assert_eq!(InputOutcome::Selected(sq("g1")), game.click(sq("g1"), &mut ui));
        assert_eq!(TurnState::AwaitingDestination(Side::White, sq("g1")), game.state());
    }

    #[test]
    pub fn impossible_destination_keeps_selection() {
        let mut game = seeded(hot_seat());
        let mut ui = RecordingFrontend::default();
        let before = game.board().clone();

        game.click(sq("e2"), &mut ui);
        assert_eq!(InputOutcome::KeptSelection, game.click(sq("e5"), &mut ui));
        assert_eq!(TurnState::AwaitingDestination(Side::White, sq("e2")), game.state());
        assert_eq!(&before, game.board());
        assert!(ui.messages.is_empty());
    }

    #[test]
    pub fn human_move_switches_side() {
        let mut game = seeded(hot_seat());
        let mut ui = RecordingFrontend::default();

        game.click(sq("e2"), &mut ui);
        let outcome = game.click(sq("e4"), &mut ui);

        assert_eq!(InputOutcome::Moved(Move::new(sq("e2"), sq("e4"))), outcome);
        assert_eq!(TurnState::AwaitingSelection(Side::Black), game.state());
        assert_eq!(Side::Black, game.side_to_move());
        assert!(game.board().is_empty(sq("e2")));
        assert_eq!(1, game.history().len());
        assert_eq!("Pe2-e4", game.history()[0].to_string());
    }

    #[test]
    pub fn random_side_answers_on_tick() {
        let mut game = seeded(GameConfig::default());
        let mut ui = RecordingFrontend::default();

        assert_eq!(None, game.tick(&mut ui));
        game.click(sq("d2"), &mut ui);
        game.click(sq("d4"), &mut ui);
        assert!(game.awaiting_automated_move());

        // Human input is ignored while the random side is to move
        assert_eq!(InputOutcome::Ignored, game.click(sq("e7"), &mut ui));

        let reply = game.tick(&mut ui).unwrap();
        assert!(game.board().is_owned_by(reply.to, Side::Black));
        assert_eq!(TurnState::AwaitingSelection(Side::White), game.state());
        assert_eq!(2, game.history().len());
        assert_eq!(None, game.tick(&mut ui));
    }

    #[test]
    pub fn move_into_check_is_rejected() {
        let board = Board::from_rows(
            &[
                "....r..k",
                "........",
                "........",
                "........",
                "........",
                "........",
                "....B...",
                "....K...",
            ],
            Side::White,
        )
        .unwrap();
        let mut game = Game::from_board(board.clone(), hot_seat(), StdRng::seed_from_u64(1));
        let mut ui = RecordingFrontend::default();

        game.click(sq("e2"), &mut ui);
        assert_eq!(InputOutcome::Rejected, game.click(sq("d3"), &mut ui));

        assert_eq!(&board, game.board());
        assert_eq!(TurnState::AwaitingDestination(Side::White, sq("e2")), game.state());
        assert_eq!(vec![MESSAGE_KING_IN_CHECK.to_string()], ui.messages);
        assert!(game.history().is_empty());
    }

    #[test]
    pub fn human_promotion_asks_frontend() {
        let board = Board::from_rows(
            &[
                ".......k",
                "P.......",
                "........",
                "........",
                "........",
                "........",
                "........",
                "....K...",
            ],
            Side::White,
        )
        .unwrap();
        let mut game = Game::from_board(board, hot_seat(), StdRng::seed_from_u64(1));
        let mut ui = RecordingFrontend::default();

        game.click(sq("a7"), &mut ui);
        game.click(sq("a8"), &mut ui);

        assert_eq!(Some(Piece::new(PieceKind::Knight, Side::White)), game.board().piece_at(sq("a8")));
        assert_eq!(1, ui.promotion_requests);
        assert!(ui.messages.contains(&MESSAGE_PROMOTED.to_string()));
        assert_eq!(Some(PromotionKind::Knight), game.history()[0].promotion);
        assert_eq!("Pa7-a8=N", game.history()[0].to_string());
    }

    #[test]
    pub fn random_side_promotes_without_asking() {
        // Black's only legal move is b2-b1
        let board = Board::from_rows(
            &[
                ".......k",
                ".....Q..",
                "........",
                "........",
                "........",
                "....K...",
                ".p......",
                "........",
            ],
            Side::Black,
        )
        .unwrap();
        let config = GameConfig {
            white: PlayerKind::Human,
            black: PlayerKind::Random,
            auto_promotion: PromotionKind::Rook,
        };
        let mut game = Game::from_board(board, config, StdRng::seed_from_u64(3));
        let mut ui = RecordingFrontend::default();

        assert_eq!(Some(Move::new(sq("b2"), sq("b1"))), game.tick(&mut ui));

        assert_eq!(Some(Piece::new(PieceKind::Rook, Side::Black)), game.board().piece_at(sq("b1")));
        assert_eq!(0, ui.promotion_requests);
        assert_eq!(Some(PromotionKind::Rook), game.history()[0].promotion);
        assert_eq!(TurnState::AwaitingSelection(Side::White), game.state());
    }

    #[test]
    pub fn fools_mate_ends_the_game() {
        let mut game = seeded(hot_seat());
        let mut ui = RecordingFrontend::default();

        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            game.click(sq(from), &mut ui);
            assert_eq!(InputOutcome::Moved(Move::new(sq(from), sq(to))), game.click(sq(to), &mut ui));
        }

        assert_eq!(Some(GameResult::Checkmate { winner: Side::Black }), game.result());
        assert_eq!(Some(&"Checkmate! Black wins!".to_string()), ui.messages.last());
        assert_eq!(InputOutcome::Ignored, game.click(sq("e1"), &mut ui));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    pub fn check_is_announced() {
        let mut game = seeded(hot_seat());
        let mut ui = RecordingFrontend::default();

        for (from, to) in [("e2", "e4"), ("f7", "f6"), ("d1", "h5")] {
            game.click(sq(from), &mut ui);
            game.click(sq(to), &mut ui);
        }

        assert_eq!(vec![MESSAGE_CHECK.to_string()], ui.messages);
        assert_eq!(TurnState::AwaitingSelection(Side::Black), game.state());
    }

    #[test]
    pub fn stalemating_move_ends_the_game() {
        let board = Board::from_rows(
            &[
                "k.......",
                "........",
                "........",
                "..Q.....",
                "........",
                "........",
                "........",
                ".......K",
            ],
            Side::White,
        )
        .unwrap();
        let mut game = Game::from_board(board, GameConfig::default(), StdRng::seed_from_u64(1));
        let mut ui = RecordingFrontend::default();

        game.click(sq("c5"), &mut ui);
        game.click(sq("b6"), &mut ui);

        assert_eq!(Some(GameResult::Stalemate), game.result());
        assert_eq!(vec!["Stalemate!".to_string()], ui.messages);
        assert_eq!(None, game.tick(&mut ui));
    }

    #[test]
    pub fn game_over_detected_on_start() {
        let board = Board::from_rows(
            &[
                "R.....k.",
                ".....ppp",
                "........",
                "........",
                "........",
                "........",
                "........",
                "......K.",
            ],
            Side::Black,
        )
        .unwrap();
        let game = Game::from_board(board, hot_seat(), StdRng::seed_from_u64(1));

        assert_eq!(TurnState::Terminal(GameResult::Checkmate { winner: Side::White }), game.state());
    }

    #[test]
    pub fn self_play_respects_ply_cap() {
        let config = GameConfig {
            white: PlayerKind::Random,
            black: PlayerKind::Random,
            auto_promotion: PromotionKind::Queen,
        };
        let mut game = seeded(config);
        let mut ui = RecordingFrontend::default();

        let result = game.play_out(40, &mut ui);

        assert!(game.history().len() <= 40);
        assert!(result.is_some() || game.history().len() == 40);
        assert_eq!(0, ui.promotion_requests);
        assert!(game.board().find_king(Side::White).is_some());
        assert!(game.board().find_king(Side::Black).is_some());
    }

    #[test]
    pub fn seeded_games_repeat() {
        let config = GameConfig {
            white: PlayerKind::Random,
            black: PlayerKind::Random,
            auto_promotion: PromotionKind::Queen,
        };
        let mut first = seeded(config);
        let mut second = seeded(config);
        let mut ui = RecordingFrontend::default();

        first.play_out(20, &mut ui);
        second.play_out(20, &mut ui);

        assert_eq!(first.history(), second.history());
        assert_eq!(first.board(), second.board());
    }
}
