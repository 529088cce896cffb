/*!
This module handles full-row detection, row clearing and the per-column
cascade gravity that settles the board afterwards.

Clearing is resolved to a *fixed point*: settling the board can complete new
rows, which are then cleared and settled again, until a pass produces no
further clears.
*/

use crate::{
    combo, obstacles, power_ups, Board, Cell, Configuration, Feedback, FeedbackMessages, Game,
    GameTime, Piece, SoundCue, State,
};

/// Whether a row counts as complete.
///
/// A row is full iff it contains no empty and no power-up cell, and at least
/// one regular block. Power-up cells block clearing until collected or
/// overwritten; requiring one block keeps a row of pure obstacles (which
/// normal clears cannot destroy) from counting forever.
pub fn row_full(line: &[Cell; Game::WIDTH]) -> bool {
    line.iter()
        .all(|cell| !matches!(cell, Cell::Empty | Cell::PowerUp(_)))
        && line.iter().any(|cell| matches!(cell, Cell::Block(_)))
}

/// Returns the height coordinates of all currently full rows, ascending.
pub fn full_rows(board: &Board) -> Vec<usize> {
    (0..Game::HEIGHT).filter(|&y| row_full(&board[y])).collect()
}

/// Clears the regular blocks out of one row. Obstacle cells survive and are
/// left in place for the following cascade.
fn clear_row_blocks(board: &mut Board, y: usize) {
    for cell in &mut board[y] {
        if matches!(cell, Cell::Block(_)) {
            *cell = Cell::Empty;
        }
    }
}

/// Settles the board by per-column free-fall gravity.
///
/// Every column is compacted independently: all non-empty cells sink to the
/// bottom, preserving their relative order, leaving the vacated cells at the
/// top. Obstacles and uncollected power-ups fall like any other cell; nothing
/// is anchored. Floating groups separated by gaps therefore land at the
/// lowest available position, unlike classic row-shift gravity.
pub fn cascade_settle(board: &mut Board) {
    for x in 0..Game::WIDTH {
        let mut write = 0;
        for y in 0..Game::HEIGHT {
            if !board[y][x].is_empty() {
                let cell = board[y][x];
                board[y][x] = Cell::Empty;
                board[write][x] = cell;
                write += 1;
            }
        }
    }
}

/// Runs the clear-and-cascade fixed point and, if anything cleared, the
/// follow-up hooks in their fixed order: obstacle injection, power-up spawn,
/// then combo and score updates per clear pass.
///
/// `active` is the piece currently in flight, if any; placement hooks avoid
/// it. Returns the total number of lines cleared across all passes.
pub(crate) fn resolve_clears(
    state: &mut State,
    config: &Configuration,
    now: GameTime,
    active: Option<&Piece>,
    msgs: &mut FeedbackMessages,
) -> u32 {
    let lines_before = state.lines_cleared;

    // Fixed point: each pass removes at least one block, so this terminates.
    let mut passes: Vec<Vec<usize>> = Vec::new();
    loop {
        let full = full_rows(&state.board);
        if full.is_empty() {
            break;
        }
        for &y in &full {
            clear_row_blocks(&mut state.board, y);
        }
        cascade_settle(&mut state.board);
        passes.push(full);
    }

    let total = passes.iter().map(|rows| rows.len() as u32).sum::<u32>();
    if total == 0 {
        return 0;
    }
    state.lines_cleared += total;

    obstacles::on_lines_cleared(state, config, lines_before, active, now, msgs);
    power_ups::maybe_spawn(state, config, active, now, msgs);

    for rows in passes {
        let multiplier = combo::bump(&mut state.combo, now, config.combo_window);
        state.score += base_line_score(rows.len()) * multiplier;
        msgs.push((
            now,
            Feedback::LinesCleared {
                rows,
                combo_multiplier: multiplier,
            },
        ));
    }
    msgs.push((now, Feedback::SoundCue(SoundCue::LineClearMelody)));

    total
}

/// The unmultiplied score awarded for clearing `n` lines in one pass.
fn base_line_score(n: usize) -> u32 {
    match n {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 500,
        _ => 800,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PowerUpKind, Tetromino};

    fn block() -> Cell {
        Cell::Block(Tetromino::T)
    }

    #[test]
    fn settled_board_is_a_fixed_point_of_cascade() {
        let mut board = Board::default();
        board[0] = [block(); Game::WIDTH];
        board[0][3] = Cell::Empty;
        board[1][5] = Cell::Obstacle;
        board[0][7] = Cell::PowerUp(PowerUpKind::Bomb);

        let before = board;
        cascade_settle(&mut board);
        assert_eq!(board, before);

        // And running it again still changes nothing.
        cascade_settle(&mut board);
        assert_eq!(board, before);
    }

    #[test]
    fn cascade_leaves_no_cell_floating() {
        let mut board = Board::default();
        // Scatter a column with gaps: cells at heights 3, 7, 15.
        board[3][2] = block();
        board[7][2] = Cell::Obstacle;
        board[15][2] = Cell::PowerUp(PowerUpKind::Ghost);
        board[10][9] = block();

        cascade_settle(&mut board);

        for x in 0..Game::WIDTH {
            for y in 1..Game::HEIGHT {
                if !board[y][x].is_empty() {
                    assert!(
                        !board[y - 1][x].is_empty(),
                        "cell at ({x},{y}) floats above an empty cell"
                    );
                }
            }
        }
        // Relative order within the column is preserved.
        assert_eq!(board[0][2], block());
        assert_eq!(board[1][2], Cell::Obstacle);
        assert_eq!(board[2][2], Cell::PowerUp(PowerUpKind::Ghost));
    }

    #[test]
    fn row_with_power_up_is_never_full() {
        let mut line = [block(); Game::WIDTH];
        assert!(row_full(&line));

        for kind in PowerUpKind::VARIANTS {
            let mut with_power_up = line;
            with_power_up[4] = Cell::PowerUp(kind);
            assert!(!row_full(&with_power_up));
        }

        line[0] = Cell::Empty;
        assert!(!row_full(&line));
    }

    #[test]
    fn row_of_pure_obstacles_is_not_full() {
        let line = [Cell::Obstacle; Game::WIDTH];
        assert!(!row_full(&line));

        let mut mixed = line;
        mixed[0] = block();
        assert!(row_full(&mixed));
    }

    #[test]
    fn obstacles_survive_a_clear_and_fall() {
        let mut board = Board::default();
        board[1] = [block(); Game::WIDTH];
        board[1][4] = Cell::Obstacle;

        assert_eq!(full_rows(&board), vec![1]);
        clear_row_blocks(&mut board, 1);
        cascade_settle(&mut board);

        assert_eq!(board[0][4], Cell::Obstacle);
        for x in (0..Game::WIDTH).filter(|&x| x != 4) {
            assert!(board[0][x].is_empty());
        }
    }

    #[test]
    fn chain_reaches_fixed_point() {
        // Bottom row full; the row above holds a floating block over the gap
        // column of row 2, which completes row 0's replacement after settling.
        let mut board = Board::default();
        board[0] = [block(); Game::WIDTH];
        for x in 0..Game::WIDTH - 1 {
            board[1][x] = block();
        }
        board[2][Game::WIDTH - 1] = block();

        let mut passes = 0;
        loop {
            let full = full_rows(&board);
            if full.is_empty() {
                break;
            }
            for &y in &full {
                clear_row_blocks(&mut board, y);
            }
            cascade_settle(&mut board);
            passes += 1;
        }

        assert_eq!(passes, 2);
        assert_eq!(board, Board::default());
    }
}
