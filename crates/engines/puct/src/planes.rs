//! Input planes for 112-plane policy/value networks.
//!
//! Layout (plane index, each plane 8x8, row = rank 1..8, col = file a..h):
//!
//! ```text
//!   0..104  8 history frames x 13 planes
//!             0..6   own-colour P N B R Q K   (white after orientation)
//!             6..12  opponent P N B R Q K
//!             12     repetition count (always zero)
//!   104..108  castling: white short, white long, black short, black long
//!   108       side to move (1 when Black is to move)
//!   109..111  zero
//!   111       all ones
//! ```
//!
//! Positions with Black to move are mirrored first, so the network always
//! sees the mover as White. Only the current position is known, so it fills
//! every history frame.

use chess_core::{mirror, Board, Color, Piece, RulesError};

pub const HISTORY_FRAMES: usize = 8;
pub const PLANES_PER_FRAME: usize = 13;
pub const NUM_PLANES: usize = 112;

/// `[planes, ranks, files]` of a single encoded position.
pub const INPUT_SHAPE: [usize; 3] = [NUM_PLANES, 8, 8];

const PLANE_SIZE: usize = 64;
const CASTLING_PLANE: usize = HISTORY_FRAMES * PLANES_PER_FRAME;
const SIDE_TO_MOVE_PLANE: usize = CASTLING_PLANE + 4;
const ONES_PLANE: usize = NUM_PLANES - 1;

/// A dense `[112, 8, 8]` float tensor in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPosition {
    data: Vec<f32>,
}

impl EncodedPosition {
    pub fn shape(&self) -> [usize; 3] {
        INPUT_SHAPE
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// The 64 cells of one plane, a1 first.
    pub fn plane(&self, plane: usize) -> &[f32] {
        &self.data[plane * PLANE_SIZE..(plane + 1) * PLANE_SIZE]
    }

    pub fn get(&self, plane: usize, rank: usize, file: usize) -> f32 {
        self.data[plane * PLANE_SIZE + rank * 8 + file]
    }

    fn fill(&mut self, plane: usize, value: f32) {
        self.data[plane * PLANE_SIZE..(plane + 1) * PLANE_SIZE].fill(value);
    }
}

/// Encode `board` from the perspective of its side to move.
pub fn encode_position(board: &Board) -> Result<EncodedPosition, RulesError> {
    let black_to_move = board.side_to_move() == Color::Black;
    let oriented = if black_to_move {
        mirror(board)?
    } else {
        board.clone()
    };

    let mut encoded = EncodedPosition {
        data: vec![0.0; NUM_PLANES * PLANE_SIZE],
    };

    for (color_idx, color) in [Color::White, Color::Black].into_iter().enumerate() {
        for (piece_idx, piece) in Piece::ALL.into_iter().enumerate() {
            let plane = color_idx * 6 + piece_idx;
            for sq in oriented.colored_pieces(color, piece) {
                encoded.data[plane * PLANE_SIZE + sq as usize] = 1.0;
            }
        }
    }

    // No move history is kept: repeat the current frame.
    let frame_len = PLANES_PER_FRAME * PLANE_SIZE;
    for frame in 1..HISTORY_FRAMES {
        encoded.data.copy_within(0..frame_len, frame * frame_len);
    }

    let castling = [
        oriented.castle_rights(Color::White).short.is_some(),
        oriented.castle_rights(Color::White).long.is_some(),
        oriented.castle_rights(Color::Black).short.is_some(),
        oriented.castle_rights(Color::Black).long.is_some(),
    ];
    for (offset, allowed) in castling.into_iter().enumerate() {
        if allowed {
            encoded.fill(CASTLING_PLANE + offset, 1.0);
        }
    }

    if black_to_move {
        encoded.fill(SIDE_TO_MOVE_PLANE, 1.0);
    }
    encoded.fill(ONES_PLANE, 1.0);

    Ok(encoded)
}

#[cfg(test)]
#[path = "planes_tests.rs"]
mod planes_tests;
