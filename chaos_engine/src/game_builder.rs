/*!
This module provides the builder used to initialize a [`Game`].
*/

use std::collections::VecDeque;

use rand::SeedableRng;

use crate::{
    Board, Configuration, Game, GameRng, GameTime, Phase, State, StateInitialization, Tetromino,
    TetrominoGenerator,
};

/// Compact builder for a [`Game`].
///
/// All values are optional; `GameBuilder::default().build()` yields a standard
/// round with a randomly chosen seed and an empty board.
///
/// # Reproducibility
/// Two games built with identical settings and the same explicit seed play
/// out identically under identical `(target_time, command)` update sequences.
#[derive(PartialEq, Clone, Default, Debug)]
pub struct GameBuilder {
    config: Configuration,
    seed: Option<u64>,
    tetromino_generator: TetrominoGenerator,
    board: Option<Board>,
    next_pieces: Vec<Tetromino>,
}

impl GameBuilder {
    /// Set the seed of the game's internal PRNG.
    ///
    /// If this is not set, a seed is chosen randomly at build time (and stays
    /// readable through [`Game::state_init`]).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the method of tetromino generation to use.
    pub fn tetromino_generator(mut self, tetromino_generator: TetrominoGenerator) -> Self {
        self.tetromino_generator = tetromino_generator;
        self
    }

    /// Start the game from a pre-filled board instead of an empty one.
    pub fn board(mut self, board: Board) -> Self {
        self.board = Some(board);
        self
    }

    /// Queue pieces to be spawned first, ahead of the generator.
    pub fn next_pieces(mut self, pieces: impl IntoIterator<Item = Tetromino>) -> Self {
        self.next_pieces.extend(pieces);
        self
    }

    /// Override the entire game configuration.
    pub fn configuration(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    /// Set how long a piece takes to fall one cell.
    pub fn fall_delay(mut self, fall_delay: GameTime) -> Self {
        self.config.fall_delay = fall_delay;
        self
    }

    /// Set the probability that a clear event spawns a power-up cell.
    pub fn power_up_chance(mut self, chance: f64) -> Self {
        self.config.power_up_chance = chance;
        self
    }

    /// Set the probability that crossing the line interval spawns an obstacle.
    pub fn obstacle_chance(mut self, chance: f64) -> Self {
        self.config.obstacle_chance = chance;
        self
    }

    /// Initialize the [`Game`].
    pub fn build(self) -> Game {
        let GameBuilder {
            config,
            seed,
            tetromino_generator,
            board,
            next_pieces,
        } = self;

        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = GameRng::seed_from_u64(seed);

        let mut piece_generator = tetromino_generator;
        let mut next_pieces: VecDeque<Tetromino> = next_pieces.into();
        // Always stock at least one upcoming piece, even with preview disabled.
        let missing = config
            .piece_preview_count
            .max(1)
            .saturating_sub(next_pieces.len());
        next_pieces.extend(piece_generator.with_rng(&mut rng).take(missing));

        let state = State {
            time: GameTime::ZERO,
            rng,
            piece_generator,
            next_pieces,
            board: board.unwrap_or_default(),
            lines_cleared: 0,
            pieces_locked: [0; Tetromino::VARIANTS.len()],
            score: 0,
            combo: None,
            modifiers: Default::default(),
        };

        Game {
            config,
            state_init: StateInitialization {
                seed,
                tetromino_generator,
            },
            state,
            phase: Phase::Spawning {
                spawn_time: GameTime::ZERO,
            },
        }
    }
}
