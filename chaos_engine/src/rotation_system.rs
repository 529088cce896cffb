/*!
This module handles rotation of [`Piece`]s in play.
*/

use crate::{Board, Orientation, Piece, Tetromino};

/// Handles the logic of how to rotate a tetromino in play.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RotationSystem {
    /// The right-handed variant of the classic, kick-less rotation system.
    #[default]
    Classic,
}

impl RotationSystem {
    /// Tries to rotate a piece with the chosen `RotationSystem`.
    ///
    /// This will return `None` if the rotation is not possible, and `Some(p)`
    /// if the rotation succeeded with `p` as the new state of the piece.
    /// `ghost` relaxes collision against regular blocks.
    pub fn rotate(
        &self,
        piece: &Piece,
        board: &Board,
        right_turns: i8,
        ghost: bool,
    ) -> Option<Piece> {
        match self {
            RotationSystem::Classic => classic_rotate(piece, board, right_turns, ghost),
        }
    }
}

#[rustfmt::skip]
fn classic_rotate(piece: &Piece, board: &Board, right_turns: i8, ghost: bool) -> Option<Piece> {
    let left_rotation = match right_turns.rem_euclid(4) {
        // No rotation occurred.
        0 => return Some(*piece),
        // One right rotation.
        1 => false,
        // Classic didn't define 180 rotation, just check if the "default" 180 rotation fits.
        2 => {
            return piece.fits_at_reoriented(board, (0, 0), 2, ghost);
        }
        // One left rotation.
        3 => true,
        _ => unreachable!(),
    };
    use Orientation::*;
    let kick = match piece.shape {
        Tetromino::O => (0, 0), // ⠶
        Tetromino::I => match piece.orientation {
            N | S => (2, -1), // ⠤⠤ -> ⡇
            E | W => (-2, 1), // ⡇  -> ⠤⠤
        },
        Tetromino::S | Tetromino::Z => match piece.orientation {
            N | S => (1, 0),  // ⠴⠂ -> ⠳  // ⠲⠄ -> ⠞
            E | W => (-1, 0), // ⠳  -> ⠴⠂ // ⠞  -> ⠲⠄
        },
        Tetromino::T | Tetromino::L | Tetromino::J => match piece.orientation {
            N => if left_rotation { ( 0,-1) } else { ( 1,-1) }, // ⠺  <- ⠴⠄ -> ⠗  // ⠹  <- ⠤⠆ -> ⠧  // ⠼  <- ⠦⠄ -> ⠏
            E => if left_rotation { (-1, 1) } else { (-1, 0) }, // ⠴⠄ <- ⠗  -> ⠲⠂ // ⠤⠆ <- ⠧  -> ⠖⠂ // ⠦⠄ <- ⠏  -> ⠒⠆
            S => if left_rotation { ( 1, 0) } else { ( 0, 0) }, // ⠗  <- ⠲⠂ -> ⠺  // ⠧  <- ⠖⠂ -> ⠹  // ⠏  <- ⠒⠆ -> ⠼
            W => if left_rotation { ( 0, 0) } else { ( 0, 1) }, // ⠲⠂ <- ⠺  -> ⠴⠄ // ⠖⠂ <- ⠹  -> ⠤⠆ // ⠒⠆ <- ⠼  -> ⠦⠄
        },
    };
    piece.fits_at_reoriented(board, kick, right_turns, ghost)
}
