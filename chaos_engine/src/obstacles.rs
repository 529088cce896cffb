/*!
This module handles periodic injection of indestructible obstacle cells.
*/

use rand::Rng;

use crate::{
    Cell, Configuration, Feedback, FeedbackMessages, Game, GameTime, Piece, State,
};

/// How many times a line-interval boundary was crossed by going from
/// `before` to `after` cumulatively cleared lines.
///
/// Each crossing earns one independent spawn trial, so a multi-line clear
/// that jumps over a boundary (e.g. 4 -> 6 with interval 5) still triggers
/// exactly once.
pub(crate) fn interval_crossings(before: u32, after: u32, interval: u32) -> u32 {
    if interval == 0 {
        return 0;
    }
    after / interval - before / interval
}

/// Hook invoked once per clear event with the cumulative line counter.
///
/// For every crossed interval boundary, one Bernoulli trial decides whether
/// an obstacle cell is injected.
pub(crate) fn on_lines_cleared(
    state: &mut State,
    config: &Configuration,
    lines_before: u32,
    active: Option<&Piece>,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) {
    let trials = interval_crossings(lines_before, state.lines_cleared, config.obstacle_line_interval);
    for _ in 0..trials {
        if state.rng.random_bool(config.obstacle_chance) {
            try_place(state, config, active, now, msgs);
        }
    }
}

/// Tries a bounded number of random empty cells and turns the first suitable
/// one into an obstacle. Rows holding the active piece and the topmost spawn
/// rows are avoided; if no pick succeeds, the cycle is skipped so that
/// injection never blocks game progress.
fn try_place(
    state: &mut State,
    config: &Configuration,
    active: Option<&Piece>,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) {
    let blocked_rows: Vec<usize> = active
        .map(|piece| piece.tiles().iter().map(|&(_, y)| y).collect())
        .unwrap_or_default();

    for _ in 0..config.placement_retries {
        let x = state.rng.random_range(0..Game::WIDTH);
        let y = state
            .rng
            .random_range(0..Game::HEIGHT - Game::SPAWN_ZONE_HEIGHT);
        if !state.board[y][x].is_empty() || blocked_rows.contains(&y) {
            continue;
        }
        state.board[y][x] = Cell::Obstacle;
        msgs.push((now, Feedback::ObstacleSpawned { coord: (x, y) }));
        return;
    }
}
