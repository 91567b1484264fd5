use std::time::Instant;

use log::info;
use num_format::{Locale, ToFormattedString};

use crate::{
    board::{Board, PieceKind},
    moves::{Move, MoveRollback},
};

impl Board {
    /// Counts move paths of length `depth` from this position, the side to move playing first.
    /// With `divide` the count below each root move is printed.
    pub fn start_perft(&mut self, depth: u8, divide: bool) -> PerftStats {
        let mut rollback = MoveRollback::default();
        let mut stats = PerftStats::default();

        let start_time = Instant::now();
        do_perft(depth, 1, self, &mut rollback, &mut stats, divide);
        let elapsed = start_time.elapsed();

        if divide {
            println!("\n{}", stats.nodes);
        }

        let nps = stats.nodes as f64 / elapsed.as_secs_f64();
        info!(
            "depth {depth} in {elapsed:#?}. Nodes: {}. Nodes per second: {}",
            stats.nodes.to_formatted_string(&Locale::en),
            (nps as u64).to_formatted_string(&Locale::en)
        );
        info!("{:?}", stats);
        assert!(rollback.is_empty());

        stats
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PerftStats {
    pub nodes: u64,
    pub captures: u64,
    pub promotions: u64,
    pub checks: u64,
    /// Positions short of the requested depth where the side to move has no legal move
    pub dead_ends: u64,
}

// Code referenced from https://www.chessprogramming.org/Perft
fn do_perft(draft: u8, ply: u8, board: &mut Board, rollback: &mut MoveRollback, stats: &mut PerftStats, divide: bool) {
    if draft == 0 {
        stats.nodes += 1;
        return;
    }

    let side = board.side_to_move;
    let moves = board.generate_legal_moves(side);
    if moves.is_empty() {
        stats.dead_ends += 1;
    }

    for r#move in moves {
        if draft == 1 {
            check_perft_stats(&r#move, board, stats);
        }

        board.make_move(&r#move, rollback);

        if draft == 1 && board.is_in_check(board.side_to_move) {
            stats.checks += 1;
        }

        let start_nodes = stats.nodes;
        do_perft(draft - 1, ply + 1, board, rollback, stats, divide);

        if divide && ply == 1 {
            println!("{} {}", r#move, stats.nodes - start_nodes)
        }

        board.unmake_move(&r#move, rollback);
    }
}

fn check_perft_stats(r#move: &Move, board: &Board, stats: &mut PerftStats) {
    if !board.is_empty(r#move.to) {
        stats.captures += 1;
    }

    let side = board.side_to_move;
    if let Some(piece) = board.piece_at(r#move.from) {
        if piece.kind == PieceKind::Pawn && r#move.to.row == side.far_row() {
            stats.promotions += 1;
        }
    }
}
