//! The 1858-entry move index of 112-plane policy heads.
//!
//! Entries are listed from the mover's point of view (mirrored for Black):
//! for every from-square a1..h8, each queen-line and knight destination in
//! ascending square order, then the underpromotion block. Knight
//! promotions share the index of the plain pawn move.

use std::collections::HashMap;
use std::sync::OnceLock;

use chess_core::{to_standard_castling, Board, Color, Move, Piece};

/// Length of the policy vector.
pub const POLICY_SIZE: usize = 1858;

const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const PROMOTION_PIECES: [Piece; 3] = [Piece::Queen, Piece::Rook, Piece::Bishop];

type MoveKey = (u8, u8, Option<Piece>);

struct PolicyTable {
    index: HashMap<MoveKey, u16>,
}

fn offset(square: u8, df: i8, dr: i8) -> Option<u8> {
    let file = (square % 8) as i8 + df;
    let rank = (square / 8) as i8 + dr;
    ((0..8).contains(&file) && (0..8).contains(&rank)).then(|| (rank * 8 + file) as u8)
}

impl PolicyTable {
    fn build() -> Self {
        let mut keys: Vec<MoveKey> = Vec::with_capacity(POLICY_SIZE);

        for from in 0..64u8 {
            let mut targets = Vec::with_capacity(35);
            for (df, dr) in QUEEN_DIRECTIONS {
                let mut current = from;
                while let Some(next) = offset(current, df, dr) {
                    targets.push(next);
                    current = next;
                }
            }
            targets.extend(KNIGHT_JUMPS.iter().filter_map(|&(df, dr)| offset(from, df, dr)));
            targets.sort_unstable();
            keys.extend(targets.into_iter().map(|to| (from, to, None)));
        }

        // Seventh-rank pawn to the eighth rank: left capture, push, right capture.
        for file in 0..8u8 {
            let from = 48 + file;
            for df in [-1i8, 0, 1] {
                if let Some(to) = offset(from, df, 1) {
                    keys.extend(PROMOTION_PIECES.iter().map(|&p| (from, to, Some(p))));
                }
            }
        }

        let index = keys
            .into_iter()
            .enumerate()
            .map(|(i, key)| (key, i as u16))
            .collect();
        Self { index }
    }
}

fn table() -> &'static PolicyTable {
    static TABLE: OnceLock<PolicyTable> = OnceLock::new();
    TABLE.get_or_init(PolicyTable::build)
}

/// Policy index of a legal move of `board`, if the index space has one.
///
/// Castling may be given in either king-takes-rook or two-square form.
pub fn policy_index(board: &Board, mv: Move) -> Option<usize> {
    let mv = to_standard_castling(board, mv);
    let flip = if board.side_to_move() == Color::Black { 56 } else { 0 };
    let from = mv.from as u8 ^ flip;
    let to = mv.to as u8 ^ flip;
    let promotion = mv.promotion.filter(|&p| p != Piece::Knight);
    table()
        .index
        .get(&(from, to, promotion))
        .map(|&i| usize::from(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::{legal_moves, parse_uci_move, Game};
    use std::collections::HashSet;

    fn index_of(fen: &str, uci: &str) -> Option<usize> {
        let game = Game::from_fen(fen).unwrap();
        let mv = parse_uci_move(game.board(), uci).unwrap();
        policy_index(game.board(), mv)
    }

    #[test]
    fn test_table_size() {
        assert_eq!(table().index.len(), POLICY_SIZE);
    }

    #[test]
    fn test_known_indices() {
        let start = chess_core::STARTPOS_FEN;
        // a1b1 opens the table; b1 knight jumps and pawn pushes follow the
        // ascending-square layout
        assert_eq!(index_of("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", "a1b1"), Some(0));
        assert_eq!(index_of(start, "b1a3"), Some(34));
        assert_eq!(index_of(start, "e2e4"), Some(322));
        assert_eq!(index_of(start, "g1f3"), Some(159));
    }

    #[test]
    fn test_promotion_block() {
        let fen = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(index_of(fen, "a7a8q"), Some(1792));
        assert_eq!(index_of(fen, "a7a8r"), Some(1793));
        assert_eq!(index_of(fen, "a7a8b"), Some(1794));
        assert_eq!(index_of(fen, "a7b8q"), Some(1795));
        // Knight promotion uses the plain move's slot
        assert_eq!(index_of(fen, "a7a8n"), Some(1401));

        let fen = "4k1n1/7P/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(index_of(fen, "h7g8b"), Some(1854));
        assert_eq!(index_of(fen, "h7h8b"), Some(1857));
    }

    #[test]
    fn test_black_moves_are_mirrored() {
        // 1...e5 maps to the same slot as 1. e4
        let black = index_of(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
            "e7e5",
        );
        assert_eq!(black, index_of(chess_core::STARTPOS_FEN, "e2e4"));
    }

    #[test]
    fn test_castling_uses_king_two_square_slot() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let game = Game::from_fen(fen).unwrap();
        let internal = parse_uci_move(game.board(), "e1h1").unwrap();
        let standard = index_of(fen, "e1g1");
        assert!(standard.is_some());
        assert_eq!(policy_index(game.board(), internal), standard);
        assert_ne!(index_of(fen, "e1c1"), standard);
    }

    #[test]
    fn test_every_legal_move_has_a_distinct_index() {
        for fen in [
            chess_core::STARTPOS_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
            "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
        ] {
            let game = Game::from_fen(fen).unwrap();
            let moves = legal_moves(game.board());
            let mut seen = HashSet::new();
            for mv in &moves {
                let idx = policy_index(game.board(), *mv)
                    .unwrap_or_else(|| panic!("{mv} has no index in {fen}"));
                assert!(idx < POLICY_SIZE);
                // Knight and queen promotions of one pawn move may share a
                // slot, everything else must be unique
                if mv.promotion != Some(Piece::Knight) {
                    assert!(seen.insert(idx), "duplicate index for {mv} in {fen}");
                }
            }
        }
    }
}
