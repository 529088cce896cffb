/*!
# Chaos Engine

`chaos_engine` is an implementation of a falling-block puzzle engine extended
with power-ups, indestructible obstacles, per-column cascade gravity and a
timed combo-scoring system.

The engine is purely logical: it consumes abstract [`Command`]s, keeps a
consistent [`Board`], and emits [`Feedback`] messages that a front end can
turn into rendering and audio. All randomness flows through one seeded PRNG,
which makes entire rounds reproducible.

# Examples

```
use chaos_engine::*;
use std::time::Duration;

// Starting up a game - note that in-game time starts at 0.0s.
let mut game = Game::builder()
    .seed(42)
    /* ...Further optional configuration possible... */
    .build();

// Updating the game with the info that 'left' was input at second 5.0;
// If a piece is in play, it will try to move left.
game.update(Duration::from_secs(5), Some(Command::MoveLeft)).unwrap();

// Updating the game with the info that no input occurred up to second 7.0;
// This advances the game, e.g. pieces fall and timers expire.
game.update(Duration::from_secs(7), None).unwrap();

// Read most recent game state;
// This is how a UI can know how to render the board, etc.
let State { board, .. } = game.state();
```
*/

#![warn(missing_docs)]

mod combo;
mod game_builder;
mod game_update;
pub mod line_clearing;
mod obstacles;
mod power_ups;
pub mod rotation_system;
pub mod tetromino_generator;

use std::{collections::VecDeque, fmt, ops, time::Duration};

use rand_chacha::ChaCha12Rng;

pub use combo::ComboState;
pub use game_builder::GameBuilder;
pub use rotation_system::RotationSystem;
pub use tetromino_generator::TetrominoGenerator;

/// The type of horizontal lines of the playing grid.
pub type Line = [Cell; Game::WIDTH];
/// The type of the entire two-dimensional playing grid.
pub type Board = [Line; Game::HEIGHT];
/// Coordinates conventionally used to index into the [`Board`], starting in the bottom left.
pub type Coord = (usize, usize);
/// Coordinate offsets that can be [`add`]ed to [`Coord`]inates.
pub type Offset = (isize, isize);

/// The type used to identify points in time in a game's internal timeline.
pub type GameTime = Duration;
/// The internal RNG used by a game.
pub type GameRng = ChaCha12Rng;

/// Convenient type alias to denote a [`Feedback`] associated with some [`GameTime`].
pub type FeedbackMsg = (GameTime, Feedback);
/// Convenient type alias to denote a collection of [`FeedbackMsg`]s.
pub type FeedbackMessages = Vec<FeedbackMsg>;

/// Represents one of the seven "Tetrominos";
///
/// A *tetromino* is a two-dimensional, geometric shape made by
/// connecting four squares (orthogonally / along the edges).
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tetromino {
    /// 'O'-Tetromino.
    /// Four squares connected as one big square; `⠶`, `██`.
    O = 0,
    /// 'I'-Tetromino.
    /// Four squares connected as one straight line; `⡇`, `▄▄▄▄`.
    I = 1,
    /// 'S'-Tetromino.
    /// Four squares connected in an 'S'-snaking manner; `⠳`, `▄█▀`.
    S = 2,
    /// 'Z'-Tetromino:
    /// Four squares connected in a 'Z'-snaking manner; `⠞`, `▀█▄`.
    Z = 3,
    /// 'T'-Tetromino:
    /// Four squares connected in a 'T'-junction shape; `⠗`, `▄█▄`.
    T = 4,
    /// 'L'-Tetromino:
    /// Four squares connected in an 'L'-shape; `⠧`, `▄▄█`.
    L = 5,
    /// 'J'-Tetromino:
    /// Four squares connected in a 'J'-shape; `⠼`, `█▄▄`.
    J = 6,
}

/// Represents the orientation an active piece can be in.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// North.
    N = 0,
    /// East.
    E,
    /// South.
    S,
    /// West.
    W,
}

/// The kind of bonus effect a special board cell grants when touched by the
/// active piece.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerUpKind {
    /// Detonates around the pickup cell, destroying everything in a square radius.
    Bomb = 0,
    /// Temporarily multiplies the fall interval, slowing the game down.
    Slowdown,
    /// Lets the active piece pass through regular blocks for a few placements.
    Ghost,
    /// Suspends falling and lets the player pick one entire row to destroy.
    Hammer,
    /// Resolves into one of the other four effects, chosen uniformly at random.
    Random,
}

/// One cell of the playing grid.
///
/// Every cell is in exactly one of these states at all times.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    /// Nothing here.
    #[default]
    Empty,
    /// A regular, fixed block left behind by a locked piece.
    /// Carries the tetromino kind it came from (which determines its color).
    Block(Tetromino),
    /// An indestructible cell; survives normal line clears, falls in cascades,
    /// and is only destroyed by the Bomb and Hammer effects.
    Obstacle,
    /// A collectible power-up waiting on the board.
    PowerUp(PowerUpKind),
}

/// An active tetromino in play.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    /// Type of tetromino the active piece is.
    pub shape: Tetromino,
    /// In which way the tetromino is re-oriented.
    pub orientation: Orientation,
    /// The position of the active piece on the playing grid.
    pub position: Coord,
}

/// Represents an abstract game input, as produced by an (external) input
/// collaborator.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Moves the piece once to the left.
    MoveLeft,
    /// Moves the piece once to the right.
    MoveRight,
    /// Rotate the piece by +90° (clockwise).
    RotateCw,
    /// Rotate the piece by -90° (counter-clockwise).
    RotateCcw,
    /// Drop the piece down by one cell, locking it if it sits on a surface.
    SoftDrop,
    /// Drop the piece all the way down and lock it there immediately.
    HardDrop,
    /// Pick the n-th visible row from the bottom (`1..=9`) to destroy.
    /// Only meaningful while a Hammer effect awaits its line selection.
    SelectLine(u8),
}

/// A logical audio cue emitted for an (external) audio collaborator;
/// The engine itself never plays sound.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SoundCue {
    /// The per-shape note played when a piece locks down.
    PieceNote(Tetromino),
    /// The cue played when a power-up is collected.
    PowerUpCue(PowerUpKind),
    /// The short melody played when lines clear.
    LineClearMelody,
    /// The descending melody played when the game ends.
    GameOver,
}

/// Represents how a game can end.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameOver {
    /// A new piece was unable to spawn due to pre-existing board cells
    /// blocking one or several of the spawn cells.
    SpawnBlocked,
}

/// Timed effect state owned by the game and mutated only through power-up
/// collection and the update loop.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveModifiers {
    /// How many more piece placements the Ghost effect lasts for.
    /// While positive, regular blocks are passable for the active piece.
    pub ghost_turns_remaining: u32,
    /// Until when the Slowdown effect multiplies the fall interval.
    pub slowdown_until: Option<GameTime>,
}

/// Configuration options of the game, which can be modified without hurting
/// internal invariants.
///
/// # Reproducibility
/// Modifying a [`Game`]'s configuration after it was created might not make
/// it easily reproducible anymore.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    /// How many pieces should be pre-generated and accessible/visible in the game state.
    pub piece_preview_count: usize,
    /// The method of tetromino rotation used.
    pub rotation_system: RotationSystem,
    /// How long the game should take to spawn a new piece.
    pub spawn_delay: Duration,
    /// The base duration a piece takes to fall one cell.
    pub fall_delay: Duration,
    /// How long the game lingers after clearing lines before spawning again.
    pub line_clear_delay: Duration,
    /// By how much the Slowdown effect multiplies the fall interval while active.
    pub slowdown_factor: u32,
    /// How long one Slowdown pickup lasts. Re-picking refreshes, never stacks.
    pub slowdown_duration: Duration,
    /// For how many piece placements one Ghost pickup lasts. Re-picking refreshes.
    pub ghost_turns: u32,
    /// How long the game waits for a Hammer line selection before cancelling
    /// the effect and resuming the fall.
    pub line_select_window: Duration,
    /// How long after a line clear the next clear must happen to keep a combo running.
    pub combo_window: Duration,
    /// Probability that a clear event spawns a power-up cell.
    pub power_up_chance: f64,
    /// Probability that crossing the obstacle line interval spawns an obstacle cell.
    pub obstacle_chance: f64,
    /// Every how many cumulatively cleared lines an obstacle spawn is attempted.
    pub obstacle_line_interval: u32,
    /// Chebyshev radius of the Bomb effect.
    pub bomb_radius: usize,
    /// How many random cells are tried when placing an obstacle or power-up
    /// before the attempt is skipped. Placement never blocks game progress.
    pub placement_retries: u32,
}

/// Some values that were used to help initialize the game.
///
/// Used for game reproducibility.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateInitialization {
    /// The value to seed the game's PRNG with.
    pub seed: u64,
    /// The method (and internal state) of tetromino generation used.
    pub tetromino_generator: TetrominoGenerator,
}

/// Struct storing internal game state that changes over the course of play.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    /// Current in-game time.
    pub time: GameTime,
    /// The internal pseudo random number generator used.
    pub rng: GameRng,
    /// The method (and internal state) of tetromino generation used.
    pub piece_generator: TetrominoGenerator,
    /// Upcoming pieces to be played.
    pub next_pieces: VecDeque<Tetromino>,
    /// The main playing grid.
    pub board: Board,
    /// The total number of lines that have been cleared.
    pub lines_cleared: u32,
    /// Tallies of how many pieces of each type have been played so far.
    pub pieces_locked: [u32; Tetromino::VARIANTS.len()],
    /// The current total score the player has achieved in this round of play.
    pub score: u32,
    /// The running combo, if one is active.
    pub combo: Option<ComboState>,
    /// Currently active timed power-up effects.
    pub modifiers: ActiveModifiers,
}

/// The phase the game controller is currently in.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// The state of the game "taking its time" to spawn a piece.
    Spawning {
        /// The in-game time at which the game moves on to the next `Phase`.
        spawn_time: GameTime,
    },
    /// The state of the game having an active piece in play, which can be
    /// controlled by the player and falls autonomously.
    Falling {
        /// The active piece.
        piece: Piece,
        /// The in-game time at which the piece next falls (or locks).
        next_fall_time: GameTime,
    },
    /// The state of a collected Hammer effect awaiting its line selection.
    /// Falling is suspended; the update loop keeps servicing input and the
    /// selection timeout.
    SelectingLine {
        /// The active piece, frozen in place until selection or timeout.
        piece: Piece,
        /// The in-game time at which the effect is cancelled and falling resumes.
        deadline: GameTime,
    },
    /// The state of the game lingering after lines were cleared.
    /// The board is already fully resolved when this state is entered.
    Clearing {
        /// The in-game time at which the game moves on to spawning.
        finish_time: GameTime,
    },
    /// The state of the game being irreversibly over, and not playable anymore.
    GameEnded {
        /// How the game ended.
        reason: GameOver,
    },
}

/// A number of feedback events emitted by the game.
///
/// These can be used by render/audio collaborators to reconstruct what
/// happened between two [`Game::update`] calls.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    /// A new piece entered play.
    PieceSpawned {
        /// The piece in its spawn configuration.
        piece: Piece,
    },
    /// The active piece moved, rotated or fell.
    PieceMoved {
        /// The new state of the piece.
        piece: Piece,
    },
    /// A piece was locked down in a certain configuration.
    PieceLocked {
        /// Information about the [`Piece`] that was locked.
        piece: Piece,
    },
    /// Lines were cleared in one clear-and-cascade pass.
    ///
    /// Simultaneously cleared rows arrive in a single message.
    LinesCleared {
        /// Height coordinates of the cleared rows, at scan time, ascending.
        rows: Vec<usize>,
        /// The combo multiplier that was applied to this clear's score.
        combo_multiplier: u32,
    },
    /// A power-up cell appeared on the board.
    PowerUpSpawned {
        /// Which effect the cell carries.
        kind: PowerUpKind,
        /// Where it was placed.
        coord: Coord,
    },
    /// The active piece touched a power-up cell and collected it.
    PowerUpCollected {
        /// Which effect was collected.
        kind: PowerUpKind,
        /// Where the cell was.
        coord: Coord,
    },
    /// An indestructible obstacle cell appeared on the board.
    ObstacleSpawned {
        /// Where it was placed.
        coord: Coord,
    },
    /// A logical audio cue; see [`SoundCue`].
    SoundCue(SoundCue),
    /// Message that the game has ended.
    GameEnded {
        /// The final score.
        score: u32,
        /// The total number of lines cleared over the round.
        lines_cleared: u32,
    },
}

/// An error that can be thrown by [`Game::update`].
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
pub enum UpdateGameError {
    /// Error variant caused by an attempt to update the game with a requested
    /// target time that lies in the game's past (`< game.state().time`).
    TargetTimeInPast,
    /// Error variant caused by an attempt to update a game that has ended.
    GameEnded,
}

/// Main game struct representing a round of play.
#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Game {
    /// Some internal configuration options of the `Game`.
    ///
    /// # Reproducibility
    /// Modifying a `Game`'s configuration after it was created might not make
    /// it easily reproducible anymore.
    pub config: Configuration,
    pub(crate) state_init: StateInitialization,
    pub(crate) state: State,
    pub(crate) phase: Phase,
}

impl Tetromino {
    /// All `Tetromino` enum variants in order.
    ///
    /// Note that `Tetromino::VARIANTS[t as usize] == t` always holds.
    pub const VARIANTS: [Self; 7] = {
        use Tetromino::*;
        [O, I, S, Z, T, L, J]
    };

    /// Returns the mino offsets of a tetromino shape, given an orientation.
    pub const fn minos(&self, oriented: Orientation) -> [Coord; 4] {
        use Orientation::*;
        match self {
            Tetromino::O => [(0, 0), (1, 0), (0, 1), (1, 1)], // ⠶
            Tetromino::I => match oriented {
                N | S => [(0, 0), (1, 0), (2, 0), (3, 0)], // ⠤⠤
                E | W => [(0, 0), (0, 1), (0, 2), (0, 3)], // ⡇
            },
            Tetromino::S => match oriented {
                N | S => [(0, 0), (1, 0), (2, 1), (1, 1)], // ⠴⠂
                E | W => [(1, 0), (0, 1), (1, 1), (0, 2)], // ⠳
            },
            Tetromino::Z => match oriented {
                N | S => [(1, 0), (2, 0), (0, 1), (1, 1)], // ⠲⠄
                E | W => [(0, 0), (1, 1), (0, 1), (1, 2)], // ⠞
            },
            Tetromino::T => match oriented {
                N => [(0, 0), (1, 0), (2, 0), (1, 1)], // ⠴⠄
                E => [(0, 0), (1, 1), (0, 1), (0, 2)], // ⠗
                S => [(1, 0), (0, 1), (2, 1), (1, 1)], // ⠲⠂
                W => [(1, 0), (0, 1), (1, 1), (1, 2)], // ⠺
            },
            Tetromino::L => match oriented {
                N => [(0, 0), (1, 0), (2, 0), (2, 1)], // ⠤⠆
                E => [(0, 0), (1, 0), (0, 1), (0, 2)], // ⠧
                S => [(0, 0), (1, 1), (2, 1), (0, 1)], // ⠖⠂
                W => [(1, 0), (0, 2), (1, 1), (1, 2)], // ⠹
            },
            Tetromino::J => match oriented {
                N => [(0, 0), (1, 0), (2, 0), (0, 1)], // ⠦⠄
                E => [(0, 0), (1, 2), (0, 1), (0, 2)], // ⠏
                S => [(2, 0), (0, 1), (1, 1), (2, 1)], // ⠒⠆
                W => [(0, 0), (1, 0), (1, 1), (1, 2)], // ⠼
            },
        }
    }
}

impl Orientation {
    /// All `Orientation` enum variants in order.
    ///
    /// Note that `Orientation::VARIANTS[o as usize] == o` always holds.
    pub const VARIANTS: [Self; 4] = {
        use Orientation::*;
        [N, E, S, W]
    };

    /// Find a new direction by turning right some number of times.
    ///
    /// This accepts negative values to allow for left rotation.
    pub const fn reorient_right(&self, right_turns: i8) -> Self {
        Orientation::VARIANTS[((*self as i8 + right_turns) as usize).rem_euclid(4)]
    }
}

impl PowerUpKind {
    /// All `PowerUpKind` enum variants in order.
    ///
    /// Note that `PowerUpKind::VARIANTS[k as usize] == k` always holds.
    pub const VARIANTS: [Self; 5] = {
        use PowerUpKind::*;
        [Bomb, Slowdown, Ghost, Hammer, Random]
    };
}

impl Cell {
    /// Whether nothing occupies this cell.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Whether the active piece may occupy this cell.
    ///
    /// Empty and power-up cells are always passable. With the Ghost effect
    /// active, regular blocks become passable too; obstacles never are.
    pub const fn passable(&self, ghost: bool) -> bool {
        match self {
            Cell::Empty | Cell::PowerUp(_) => true,
            Cell::Block(_) => ghost,
            Cell::Obstacle => false,
        }
    }
}

impl Piece {
    /// Returns the board coordinates covered by the piece.
    pub fn tiles(&self) -> [Coord; 4] {
        let Self {
            shape,
            orientation,
            position: (x, y),
        } = self;
        shape.minos(*orientation).map(|(dx, dy)| (x + dx, y + dy))
    }

    /// Checks whether the piece fits at its current location onto the board.
    ///
    /// `ghost` relaxes the check to let regular blocks be passed through.
    pub fn fits(&self, board: &Board, ghost: bool) -> bool {
        self.tiles()
            .iter()
            .all(|&(x, y)| x < Game::WIDTH && y < Game::HEIGHT && board[y][x].passable(ghost))
    }

    /// Checks whether the piece fits a given offset from its current location
    /// onto the board.
    pub fn fits_at(&self, board: &Board, offset: Offset, ghost: bool) -> Option<Piece> {
        let mut new_piece = *self;
        new_piece.position = add(self.position, offset)?;
        new_piece.fits(board, ghost).then_some(new_piece)
    }

    /// Checks whether the piece fits a given offset from its current location
    /// onto the board, with its rotation changed by some number of right turns.
    pub fn fits_at_reoriented(
        &self,
        board: &Board,
        offset: Offset,
        right_turns: i8,
        ghost: bool,
    ) -> Option<Piece> {
        let mut new_piece = *self;
        new_piece.orientation = new_piece.orientation.reorient_right(right_turns);
        new_piece.position = add(self.position, offset)?;
        new_piece.fits(board, ghost).then_some(new_piece)
    }

    /// Returns the position the piece would hit if it kept moving at `offset` steps.
    /// For offset `(0,0)` this function returns immediately.
    pub fn teleported(&self, board: &Board, offset: Offset, ghost: bool) -> Piece {
        let mut piece = *self;
        if offset != (0, 0) {
            // Move piece as far as possible.
            while let Some(new_piece) = piece.fits_at(board, offset, ghost) {
                piece = new_piece;
            }
        }
        piece
    }

    /// The spawn configuration for a given tetromino at the top of the board.
    pub const fn spawned(shape: Tetromino) -> Piece {
        let position = match shape {
            Tetromino::O => (4, Game::HEIGHT - 2),
            Tetromino::I => (3, Game::HEIGHT - 1),
            _ => (3, Game::HEIGHT - 2),
        };
        Piece {
            shape,
            orientation: Orientation::N,
            position,
        }
    }
}

impl<T> ops::Index<Tetromino> for [T; Tetromino::VARIANTS.len()] {
    type Output = T;

    fn index(&self, idx: Tetromino) -> &Self::Output {
        &self[idx as usize]
    }
}

impl<T> ops::IndexMut<Tetromino> for [T; Tetromino::VARIANTS.len()] {
    fn index_mut(&mut self, idx: Tetromino) -> &mut Self::Output {
        &mut self[idx as usize]
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            piece_preview_count: 1,
            rotation_system: RotationSystem::default(),
            spawn_delay: Duration::from_millis(50),
            fall_delay: Duration::from_millis(500),
            line_clear_delay: Duration::from_millis(200),
            slowdown_factor: 2,
            slowdown_duration: Duration::from_secs(10),
            ghost_turns: 3,
            line_select_window: Duration::from_secs(10),
            combo_window: Duration::from_secs(3),
            power_up_chance: 0.4,
            obstacle_chance: 0.3,
            obstacle_line_interval: 5,
            bomb_radius: 2,
            placement_retries: 10,
        }
    }
}

impl ActiveModifiers {
    /// Whether the Ghost effect currently applies to the active piece.
    pub const fn ghost_active(&self) -> bool {
        self.ghost_turns_remaining > 0
    }

    /// Whether the Slowdown effect is active at the given time.
    pub fn slowdown_active(&self, now: GameTime) -> bool {
        self.slowdown_until.is_some_and(|until| now < until)
    }
}

impl Phase {
    /// Read accessor to a `Phase`'s possible [`Piece`].
    pub const fn piece(&self) -> Option<&Piece> {
        match self {
            Phase::Falling { piece, .. } | Phase::SelectingLine { piece, .. } => Some(piece),
            _ => None,
        }
    }

    /// Whether a Hammer effect is waiting for its line selection.
    pub const fn awaits_line_selection(&self) -> bool {
        matches!(self, Phase::SelectingLine { .. })
    }
}

impl Game {
    /// The game field width.
    pub const WIDTH: usize = 10;
    /// The game field height.
    pub const HEIGHT: usize = 20;
    /// The number of topmost rows kept free of injected obstacles, so that
    /// spawn cells are never walled off by the injector.
    pub const SPAWN_ZONE_HEIGHT: usize = 2;

    /// Creates a blank new template representing a yet-to-be-started [`Game`]
    /// ready for configuration.
    pub fn builder() -> GameBuilder {
        GameBuilder::default()
    }

    /// Read accessor for the game's initial values.
    pub const fn state_init(&self) -> &StateInitialization {
        &self.state_init
    }

    /// Read accessor for the current game state.
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Read accessor for the current game phase.
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether (and how) the game has ended.
    pub const fn over(&self) -> Option<GameOver> {
        match self.phase {
            Phase::GameEnded { reason } => Some(reason),
            _ => None,
        }
    }

    /// Retrieve when the next *autonomous* in-game update is scheduled.
    /// I.e., compute the next time the game would change state assuming no
    /// further commands.
    ///
    /// Returns `None` when the game has ended.
    pub const fn peek_next_update_time(&self) -> Option<GameTime> {
        match self.phase {
            Phase::GameEnded { .. } => None,
            Phase::Spawning { spawn_time } => Some(spawn_time),
            Phase::Falling { next_fall_time, .. } => Some(next_fall_time),
            Phase::SelectingLine { deadline, .. } => Some(deadline),
            Phase::Clearing { finish_time } => Some(finish_time),
        }
    }
}

impl fmt::Display for UpdateGameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateGameError::TargetTimeInPast => {
                "attempt to update game to timestamp it already passed"
            }
            UpdateGameError::GameEnded => "attempt to update game after it ended",
        };
        write!(f, "{s}")
    }
}

impl std::error::Error for UpdateGameError {}

/// Adds an offset to a board coordinate, failing if the result is negative
/// in either direction.
pub fn add((x, y): Coord, (dx, dy): Offset) -> Option<Coord> {
    Some((x.checked_add_signed(dx)?, y.checked_add_signed(dy)?))
}
