use std::{
    io::{self, BufRead, Write},
    sync::LazyLock,
};

use log::{debug, error, info, warn};
use rand::Rng;
use regex::Regex;

use crate::{
    board::{BOARD_SIZE, Board, Side, Square},
    game::{Frontend, Game, InputOutcome},
    promotion::{PromotionChooser, PromotionKind},
};

static COMMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(select|move)\s+)?([a-h][1-8])(?:\s*-?\s*([a-h][1-8]))?$").expect("command pattern is valid")
});

#[derive(PartialEq, Eq, Debug)]
pub enum Command {
    /// A bare square, interpreted by the current state
    Click(Square),
    Select(Square),
    Destination(Square),
    /// `e2e4`: select then move
    Move(Square, Square),
    Board,
    Moves,
    History,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let text = line.trim().to_ascii_lowercase();
    match text.as_str() {
        "board" | "b" => return Ok(Command::Board),
        "moves" | "m" => return Ok(Command::Moves),
        "history" | "h" => return Ok(Command::History),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        _ => {}
    }

    let captures = match COMMAND_PATTERN.captures(&text) {
        Some(c) => c,
        None => return Err(format!("Unrecognized command '{}'. Type 'help' for a list.", line.trim())),
    };

    let first: Square = captures[2].parse()?;
    let second = match captures.get(3) {
        Some(m) => Some(m.as_str().parse::<Square>()?),
        None => None,
    };

    match (captures.get(1).map(|m| m.as_str()), second) {
        (None, None) => Ok(Command::Click(first)),
        (None, Some(to)) => Ok(Command::Move(first, to)),
        (Some("select"), None) => Ok(Command::Select(first)),
        (Some("move"), None) => Ok(Command::Destination(first)),
        (Some(word), Some(_)) => Err(format!("'{word}' takes a single square")),
        (Some(word), None) => Err(format!("Unrecognized command '{word}'")),
    }
}

/// Draws the board with row 0 on top. The selected square, if any, is bracketed.
pub fn render_board(board: &Board, selected: Option<Square>) -> String {
    let mut out = String::new();
    for row in 0..BOARD_SIZE {
        out.push_str(&format!("{} ", BOARD_SIZE - row));
        for col in 0..BOARD_SIZE {
            let square = Square::new(row, col);
            let c = board.piece_at(square).map_or('.', |p| p.to_char());
            if selected == Some(square) {
                out.push_str(&format!("[{c}]"));
            } else {
                out.push_str(&format!(" {c} "));
            }
        }
        out.push('\n');
    }
    out.push_str("   a  b  c  d  e  f  g  h");
    out
}

const HELP: &str = "\
Commands:
  <square>          select a piece, or move the selected piece there (e.g. e2)
  <from><to>        select and move in one go (e.g. e2e4)
  select <square>   select a piece
  move <square>     move the selected piece
  moves             list legal moves for the side to move
  board             redraw the board
  history           list the moves played so far
  help              show this text
  quit              leave the game
Pieces: uppercase white, lowercase black.";

/// Text frontend reading commands from `input` and writing to `output`.
pub struct TerminalFrontend<I: BufRead, O: Write> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> TerminalFrontend<I, O> {
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> O {
        self.output
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Runs a game with at least one human side until it ends, the input is exhausted or the
    /// user quits.
    pub fn run<R: Rng>(&mut self, game: &mut Game<R>) -> io::Result<()> {
        writeln!(self.output, "Type 'help' for commands.")?;
        loop {
            while game.awaiting_automated_move() {
                let side = game.side_to_move();
                if let Some(r#move) = game.tick(self) {
                    writeln!(self.output, "{side} plays {}", r#move)?;
                }
            }

            writeln!(self.output, "{}", render_board(game.board(), game.selected_square()))?;
            if game.is_over() {
                break;
            }

            write!(self.output, "{} to move> ", game.side_to_move())?;
            self.output.flush()?;

            let line = match self.read_line()? {
                Some(l) => l,
                None => {
                    info!("Input closed, leaving the game");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_command(&line) {
                Ok(command) => {
                    if !self.process_command(command, game)? {
                        break;
                    }
                }
                Err(err_msg) => writeln!(self.output, "{err_msg}")?,
            }
        }

        Ok(())
    }

    /// Plays a game between two automated sides and prints the outcome.
    pub fn run_self_play<R: Rng>(&mut self, game: &mut Game<R>, max_plies: usize) -> io::Result<()> {
        let result = game.play_out(max_plies, self);

        self.print_history(game)?;
        writeln!(self.output, "{}", render_board(game.board(), None))?;
        match result {
            Some(r) => writeln!(self.output, "{r}")?,
            None => writeln!(self.output, "No result after {} plies", game.history().len())?,
        }

        Ok(())
    }

    /// Returns false when the user asked to leave.
    fn process_command<R: Rng>(&mut self, command: Command, game: &mut Game<R>) -> io::Result<bool> {
        debug!("Processing terminal command {command:?}");
        let outcome = match command {
            Command::Click(square) => game.click(square, self),
            Command::Select(square) => game.select_square(square),
            Command::Destination(square) => game.choose_destination(square, self),
            Command::Move(from, to) => {
                match game.selected_square() {
                    None => {
                        game.select_square(from);
                    }
                    // Only switch the selection; `from` must never be played as a destination
                    Some(selected) if selected != from && game.board().is_owned_by(from, game.side_to_move()) => {
                        game.choose_destination(from, self);
                    }
                    Some(_) => {}
                }
                if game.selected_square() == Some(from) {
                    game.choose_destination(to, self)
                } else {
                    InputOutcome::Ignored
                }
            }
            Command::Board => return Ok(true),
            Command::Moves => {
                let moves = game.legal_moves();
                let names: Vec<String> = moves.iter().map(|m| m.pretty_print(Some(game.board()))).collect();
                writeln!(self.output, "{} legal moves: {}", names.len(), names.join(" "))?;
                return Ok(true);
            }
            Command::History => {
                self.print_history(game)?;
                return Ok(true);
            }
            Command::Help => {
                writeln!(self.output, "{HELP}")?;
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        };

        match outcome {
            InputOutcome::Ignored => writeln!(self.output, "Select one of your own pieces.")?,
            InputOutcome::KeptSelection => writeln!(self.output, "That piece cannot move there.")?,
            _ => {}
        }

        Ok(true)
    }

    fn print_history<R: Rng>(&mut self, game: &Game<R>) -> io::Result<()> {
        for (i, pair) in game.history().chunks(2).enumerate() {
            let moves: Vec<String> = pair.iter().map(|m| m.to_string()).collect();
            writeln!(self.output, "{}. {}", i + 1, moves.join(" "))?;
        }
        Ok(())
    }
}

impl<I: BufRead, O: Write> PromotionChooser for TerminalFrontend<I, O> {
    fn request_promotion_choice(&mut self, side: Side) -> PromotionKind {
        loop {
            if let Err(e) = write!(self.output, "Promote {side} pawn to (q/r/b/n): ").and_then(|_| self.output.flush()) {
                error!("Failed to write promotion prompt: {e}");
            }

            let line = match self.read_line() {
                Ok(Some(l)) => l,
                Ok(None) => {
                    warn!("Input closed during promotion choice, using queen");
                    return PromotionKind::Queen;
                }
                Err(e) => {
                    error!("Failed to read promotion choice: {e}, using queen");
                    return PromotionKind::Queen;
                }
            };

            let mut chars = line.trim().chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if let Some(kind) = PromotionKind::from_char(c) {
                    return kind;
                }
            }
        }
    }
}

impl<I: BufRead, O: Write> Frontend for TerminalFrontend<I, O> {
    fn notify(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "*** {message} ***") {
            error!("Failed to write message '{message}': {e}");
        }
    }
}
