/*!
This module handles power-up cells: spawning them onto the board, collecting
them with the active piece, and executing their effects.
*/

use rand::Rng;

use crate::{
    line_clearing, Board, Cell, Configuration, Coord, Feedback, FeedbackMessages, Game, GameTime,
    Piece, PowerUpKind, SoundCue, State,
};

/// Points awarded per cell destroyed by a Bomb.
const BOMB_CELL_BONUS: u32 = 10;
/// Points awarded for smashing a row with the Hammer.
const HAMMER_ROW_BONUS: u32 = 50;

/// Hook invoked once per clear event; draws one Bernoulli trial and, on
/// success, places a power-up of uniformly random kind on a random empty
/// cell. Bounded retries; a crowded board simply skips the spawn.
pub(crate) fn maybe_spawn(
    state: &mut State,
    config: &Configuration,
    active: Option<&Piece>,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) {
    if !state.rng.random_bool(config.power_up_chance) {
        return;
    }
    let kind = PowerUpKind::VARIANTS[state.rng.random_range(0..PowerUpKind::VARIANTS.len())];
    let piece_tiles = active.map(|piece| piece.tiles());

    for _ in 0..config.placement_retries {
        let x = state.rng.random_range(0..Game::WIDTH);
        let y = state.rng.random_range(0..Game::HEIGHT);
        if !state.board[y][x].is_empty() {
            continue;
        }
        if piece_tiles.is_some_and(|tiles| tiles.contains(&(x, y))) {
            continue;
        }
        state.board[y][x] = Cell::PowerUp(kind);
        msgs.push((now, Feedback::PowerUpSpawned { kind, coord: (x, y) }));
        return;
    }
}

/// Collects every power-up cell the piece currently covers and applies the
/// effects immediately.
///
/// Returns `true` if one of the collected effects was a Hammer (possibly via
/// Random), i.e. the game must suspend falling and await a line selection.
pub(crate) fn collect_at_piece(
    state: &mut State,
    config: &Configuration,
    piece: &Piece,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) -> bool {
    let mut hammer_pending = false;
    for (x, y) in piece.tiles() {
        if let Cell::PowerUp(kind) = state.board[y][x] {
            state.board[y][x] = Cell::Empty;
            msgs.push((now, Feedback::PowerUpCollected { kind, coord: (x, y) }));
            msgs.push((now, Feedback::SoundCue(SoundCue::PowerUpCue(kind))));
            if apply_effect(state, config, kind, (x, y), piece, now, msgs) {
                hammer_pending = true;
            }
        }
    }
    hammer_pending
}

/// Executes one power-up effect at its pickup coordinate.
///
/// Returns `true` if the effect requires a pending line selection (Hammer).
/// Slowdown and Ghost refresh rather than stack when re-acquired while
/// already active.
fn apply_effect(
    state: &mut State,
    config: &Configuration,
    kind: PowerUpKind,
    coord: Coord,
    piece: &Piece,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) -> bool {
    match kind {
        PowerUpKind::Bomb => {
            let destroyed = detonate(&mut state.board, coord, config.bomb_radius);
            state.score += destroyed * BOMB_CELL_BONUS;
            line_clearing::cascade_settle(&mut state.board);
            line_clearing::resolve_clears(state, config, now, Some(piece), msgs);
            false
        }
        PowerUpKind::Slowdown => {
            state.modifiers.slowdown_until = Some(now + config.slowdown_duration);
            false
        }
        PowerUpKind::Ghost => {
            state.modifiers.ghost_turns_remaining = config.ghost_turns;
            false
        }
        PowerUpKind::Hammer => true,
        PowerUpKind::Random => {
            // Re-entrant; a re-rolled Hammer still needs its line input.
            let rolled = [
                PowerUpKind::Bomb,
                PowerUpKind::Slowdown,
                PowerUpKind::Ghost,
                PowerUpKind::Hammer,
            ][state.rng.random_range(0..4)];
            apply_effect(state, config, rolled, coord, piece, now, msgs)
        }
    }
}

/// Clears every cell within the given Chebyshev radius of `center`,
/// obstacles and waiting power-ups included. Returns how many cells were
/// destroyed (cells outside the board don't exist and don't count).
pub(crate) fn detonate(board: &mut Board, (cx, cy): Coord, radius: usize) -> u32 {
    let mut destroyed = 0;
    for y in cy.saturating_sub(radius)..=(cy + radius).min(Game::HEIGHT - 1) {
        for x in cx.saturating_sub(radius)..=(cx + radius).min(Game::WIDTH - 1) {
            if !board[y][x].is_empty() {
                board[y][x] = Cell::Empty;
                destroyed += 1;
            }
        }
    }
    destroyed
}

/// Applies a pending Hammer to the `n`-th visible row from the bottom.
///
/// Returns `false` (leaving the board untouched) if `n` is out of the `1..=9`
/// digit range or the addressed row holds nothing visible to smash. A valid
/// selection destroys the entire row unconditionally, obstacles included,
/// and resolves any follow-up clears.
pub(crate) fn select_line(
    state: &mut State,
    config: &Configuration,
    piece: &Piece,
    n: u8,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) -> bool {
    if !(1..=9).contains(&n) {
        return false;
    }
    let y = usize::from(n) - 1;
    if state.board[y].iter().all(Cell::is_empty) {
        return false;
    }

    state.board[y] = [Cell::Empty; Game::WIDTH];
    state.score += HAMMER_ROW_BONUS;
    msgs.push((
        now,
        Feedback::SoundCue(SoundCue::PowerUpCue(PowerUpKind::Hammer)),
    ));
    line_clearing::cascade_settle(&mut state.board);
    line_clearing::resolve_clears(state, config, now, Some(piece), msgs);
    true
}
