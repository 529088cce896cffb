/*!
This module handles random generation of [`Tetromino`]s.
*/

use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    Rng,
};

use crate::Tetromino;

/// Handles the information of which pieces to spawn during a game.
///
/// To actually generate [`Tetromino`]s, the [`TetrominoGenerator::with_rng`]
/// method needs to be used to yield a [`WithRng`] that implements
/// [`Iterator`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TetrominoGenerator {
    /// Uniformly random piece generator.
    #[default]
    Uniform,
    /// Standard 7-bag generator.
    ///
    /// Works by stocking one copy of each [`Tetromino`] type and uniformly
    /// randomly handing them out until the bag is empty, then restocking.
    Bag {
        /// The number of each piece type left in the bag.
        pieces_left: [u32; 7],
    },
}

impl TetrominoGenerator {
    /// Initialize an instance of the [`TetrominoGenerator::Uniform`] variant.
    pub const fn uniform() -> Self {
        Self::Uniform
    }

    /// Initialize an instance of the [`TetrominoGenerator::Bag`] variant.
    pub const fn bag() -> Self {
        Self::Bag {
            pieces_left: [1; 7],
        }
    }

    /// Method that allows `TetrominoGenerator` to be used as [`Iterator`].
    pub fn with_rng<'a, 'b, R: Rng>(&'a mut self, rng: &'b mut R) -> WithRng<'a, 'b, R> {
        WithRng {
            tetromino_generator: self,
            rng,
        }
    }
}

/// Struct produced from [`TetrominoGenerator::with_rng`] which implements [`Iterator`].
pub struct WithRng<'a, 'b, R: Rng> {
    /// Selected tetromino generator to use as information source.
    pub tetromino_generator: &'a mut TetrominoGenerator,
    /// Random number generator as raw source of randomness.
    pub rng: &'b mut R,
}

impl<R: Rng> Iterator for WithRng<'_, '_, R> {
    type Item = Tetromino;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.tetromino_generator {
            TetrominoGenerator::Uniform => {
                Some(Tetromino::VARIANTS[self.rng.random_range(0..=6)])
            }
            TetrominoGenerator::Bag { pieces_left } => {
                let weights = pieces_left.iter();
                // SAFETY: Struct invariant, the bag is never fully empty.
                let idx = WeightedIndex::new(weights).unwrap().sample(&mut self.rng);
                // Update individual tetromino number and maybe replenish bag (ensuring invariant).
                pieces_left[idx] -= 1;
                if pieces_left.iter().sum::<u32>() == 0 {
                    *pieces_left = [1; 7];
                }
                // SAFETY: 0 <= idx <= 6.
                Some(Tetromino::VARIANTS[idx])
            }
        }
    }
}
