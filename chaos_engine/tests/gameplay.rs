/*!
Full-round integration tests driving [`Game::update`] with scripted
`(time, command)` sequences on prepared boards.
*/

use std::time::Duration;

use chaos_engine::*;

fn ms(n: u64) -> GameTime {
    Duration::from_millis(n)
}

fn block() -> Cell {
    Cell::Block(Tetromino::T)
}

/// A builder with all random board events disabled, so that scripted
/// scenarios stay fully predictable.
fn quiet_builder() -> GameBuilder {
    Game::builder()
        .seed(0)
        .power_up_chance(0.0)
        .obstacle_chance(0.0)
}

/// Applies the scripted updates in order and returns all feedback.
fn drive(game: &mut Game, steps: &[(u64, Option<Command>)]) -> FeedbackMessages {
    let mut msgs = FeedbackMessages::new();
    for &(t, cmd) in steps {
        msgs.extend(game.update(ms(t), cmd).expect("scripted update failed"));
    }
    msgs
}

#[test]
fn simultaneous_double_clear_is_one_message() {
    let mut board = Board::default();
    for x in 0..=7 {
        board[0][x] = block();
        board[1][x] = block();
    }
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    // Walk the O-piece to the right wall and slam it into the two prepared rows.
    let msgs = drive(
        &mut game,
        &[
            (0, None),
            (10, Some(Command::MoveRight)),
            (20, Some(Command::MoveRight)),
            (30, Some(Command::MoveRight)),
            (40, Some(Command::MoveRight)),
            (50, Some(Command::HardDrop)),
        ],
    );

    let clears: Vec<_> = msgs
        .iter()
        .filter_map(|(_, fb)| match fb {
            Feedback::LinesCleared {
                rows,
                combo_multiplier,
            } => Some((rows.clone(), *combo_multiplier)),
            _ => None,
        })
        .collect();
    assert_eq!(clears, vec![(vec![0, 1], 1)]);
    assert_eq!(game.state().lines_cleared, 2);
    assert_eq!(game.state().score, 300);
    assert_eq!(game.state().board, Board::default());
    assert!(matches!(game.phase(), Phase::Clearing { .. }));
}

#[test]
fn back_to_back_clears_build_a_combo() {
    let mut board = Board::default();
    for x in 0..=7 {
        board[0][x] = block();
    }
    for x in 0..=5 {
        board[1][x] = block();
    }
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 3])
        .build();

    // First piece completes row 0 at the right wall; the cascade drops the
    // survivors of row 1, leaving row 0 short exactly columns 6 and 7, which
    // the second piece fills well inside the combo window.
    let msgs = drive(
        &mut game,
        &[
            (0, None),
            (10, Some(Command::MoveRight)),
            (20, Some(Command::MoveRight)),
            (30, Some(Command::MoveRight)),
            (40, Some(Command::MoveRight)),
            (50, Some(Command::HardDrop)),
            (310, Some(Command::MoveRight)),
            (320, Some(Command::MoveRight)),
            (330, Some(Command::HardDrop)),
        ],
    );

    let multipliers: Vec<_> = msgs
        .iter()
        .filter_map(|(_, fb)| match fb {
            Feedback::LinesCleared {
                combo_multiplier, ..
            } => Some(*combo_multiplier),
            _ => None,
        })
        .collect();
    assert_eq!(multipliers, vec![1, 2]);
    assert_eq!(game.state().score, 100 + 200);
    assert_eq!(game.state().combo.map(|c| c.count), Some(2));

    // With no further clears the combo lapses once its window runs out.
    game.update(ms(4000), None).unwrap();
    assert_eq!(game.state().combo, None);
}

#[test]
fn fifth_cleared_line_triggers_an_obstacle() {
    let mut board = Board::default();
    for y in 0..5 {
        for x in 0..=8 {
            board[y][x] = block();
        }
    }
    let mut game = quiet_builder()
        .obstacle_chance(1.0)
        .board(board)
        .next_pieces([Tetromino::I; 3])
        .build();

    // Stand the I-piece up against the right wall and drop it into the
    // empty column: four lines clear at once, one short of the interval.
    let i_into_right_column = |base: u64| {
        [
            (base, None),
            (base + 10, Some(Command::SoftDrop)),
            (base + 20, Some(Command::SoftDrop)),
            (base + 30, Some(Command::RotateCw)),
            (base + 40, Some(Command::MoveRight)),
            (base + 50, Some(Command::MoveRight)),
            (base + 60, Some(Command::MoveRight)),
            (base + 70, Some(Command::MoveRight)),
            (base + 80, Some(Command::HardDrop)),
        ]
    };
    let msgs = drive(&mut game, &i_into_right_column(0));
    assert_eq!(game.state().lines_cleared, 4);
    assert!(!msgs
        .iter()
        .any(|(_, fb)| matches!(fb, Feedback::ObstacleSpawned { .. })));

    // The second drop clears the fifth line and crosses the interval.
    let msgs = drive(&mut game, &i_into_right_column(330));
    assert_eq!(game.state().lines_cleared, 5);
    let spawned: Vec<_> = msgs
        .iter()
        .filter_map(|(_, fb)| match fb {
            Feedback::ObstacleSpawned { coord } => Some(*coord),
            _ => None,
        })
        .collect();
    assert_eq!(spawned.len(), 1);
    let (x, y) = spawned[0];
    assert_eq!(game.state().board[y][x], Cell::Obstacle);
}

#[test]
fn falling_onto_a_power_up_collects_it() {
    let mut board = Board::default();
    board[10][4] = Cell::PowerUp(PowerUpKind::Slowdown);
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    // The O-piece falls straight down column 4/5 and first overlaps the
    // cell at height 10 once its lower row reaches it, at t = 4.0s.
    let msgs = drive(&mut game, &[(4000, None)]);
    assert!(msgs.iter().any(|(t, fb)| *t == ms(4000)
        && matches!(
            fb,
            Feedback::PowerUpCollected {
                kind: PowerUpKind::Slowdown,
                coord: (4, 10),
            }
        )));
    assert!(game.state().board[10][4].is_empty());
    assert_eq!(game.state().modifiers.slowdown_until, Some(ms(14000)));

    // The fall interval is doubled while the effect lasts.
    assert_eq!(game.peek_next_update_time(), Some(ms(5000)));
}

#[test]
fn hard_drop_passes_over_power_ups() {
    let mut board = Board::default();
    board[10][4] = Cell::PowerUp(PowerUpKind::Bomb);
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    let msgs = drive(&mut game, &[(0, None), (10, Some(Command::HardDrop))]);
    assert!(!msgs
        .iter()
        .any(|(_, fb)| matches!(fb, Feedback::PowerUpCollected { .. })));
    assert_eq!(game.state().board[10][4], Cell::PowerUp(PowerUpKind::Bomb));
    assert_eq!(game.state().board[0][4], Cell::Block(Tetromino::O));
}

#[test]
fn bomb_detonates_around_the_pickup_cell() {
    let mut board = Board::default();
    board[10][4] = Cell::PowerUp(PowerUpKind::Bomb);
    board[8][2] = block();
    board[12][6] = block();
    board[9][3] = Cell::Obstacle;
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    drive(&mut game, &[(4000, None)]);

    assert_eq!(game.state().score, 30);
    assert!(game.state().board[8][2].is_empty());
    assert!(game.state().board[12][6].is_empty());
    assert!(game.state().board[9][3].is_empty());
    assert!(!game.phase().awaits_line_selection());
}

#[test]
fn hammer_waits_for_a_valid_line_selection() {
    let mut board = Board::default();
    board[10][4] = Cell::PowerUp(PowerUpKind::Hammer);
    for x in 0..=3 {
        board[0][x] = block();
    }
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    drive(&mut game, &[(4000, None)]);
    assert!(game.phase().awaits_line_selection());

    // Selecting an empty row is rejected and keeps the selection pending.
    drive(&mut game, &[(4100, Some(Command::SelectLine(5)))]);
    assert!(game.phase().awaits_line_selection());
    assert_eq!(game.state().score, 0);
    assert_eq!(game.state().board[0][0], block());

    // Selecting the occupied bottom row smashes it and resumes the fall.
    drive(&mut game, &[(4200, Some(Command::SelectLine(1)))]);
    assert!(!game.phase().awaits_line_selection());
    assert_eq!(game.state().score, 50);
    assert!(game.state().board[0].iter().all(Cell::is_empty));
    assert!(matches!(game.phase(), Phase::Falling { .. }));
}

#[test]
fn hammer_is_forfeited_on_timeout() {
    let mut board = Board::default();
    board[10][4] = Cell::PowerUp(PowerUpKind::Hammer);
    for x in 0..=3 {
        board[0][x] = block();
    }
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    drive(&mut game, &[(4000, None)]);
    assert!(game.phase().awaits_line_selection());

    // The default selection window is 10s; at its end the effect is lost.
    game.update(ms(14000), None).unwrap();
    assert!(!game.phase().awaits_line_selection());
    assert_eq!(game.state().score, 0);
    assert_eq!(game.state().board[0][0], block());

    // A late selection is just ignored.
    drive(&mut game, &[(14100, Some(Command::SelectLine(1)))]);
    assert_eq!(game.state().board[0][0], block());
}

#[test]
fn ghost_piece_falls_through_blocks() {
    let mut board = Board::default();
    board[17][4] = Cell::PowerUp(PowerUpKind::Ghost);
    board[10][4] = block();
    board[10][5] = block();
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    // First fall step overlaps the Ghost cell; the subsequent hard drop
    // phases straight through the blocks at height 10 down to the floor.
    drive(&mut game, &[(500, None), (600, Some(Command::HardDrop))]);

    assert_eq!(game.state().board[0][4], Cell::Block(Tetromino::O));
    assert_eq!(game.state().board[1][4], Cell::Block(Tetromino::O));
    assert_eq!(game.state().board[10][4], block());
    // One of the three charges was spent on the placement.
    assert_eq!(game.state().modifiers.ghost_turns_remaining, 2);
}

#[test]
fn blocked_spawn_ends_the_game() {
    let mut board = Board::default();
    for x in 3..=6 {
        board[18][x] = Cell::Obstacle;
        board[19][x] = Cell::Obstacle;
    }
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O])
        .build();

    let msgs = drive(&mut game, &[(0, None)]);
    assert_eq!(game.over(), Some(GameOver::SpawnBlocked));
    assert!(msgs.iter().any(|(_, fb)| matches!(
        fb,
        Feedback::GameEnded {
            score: 0,
            lines_cleared: 0,
        }
    )));
    assert!(msgs
        .iter()
        .any(|(_, fb)| matches!(fb, Feedback::SoundCue(SoundCue::GameOver))));
    assert_eq!(
        game.update(ms(100), None).unwrap_err(),
        UpdateGameError::GameEnded
    );
    assert_eq!(game.peek_next_update_time(), None);
}

#[test]
fn rewinding_time_is_an_error() {
    let mut game = quiet_builder().next_pieces([Tetromino::O; 2]).build();
    game.update(ms(100), None).unwrap();
    assert_eq!(
        game.update(ms(50), None).unwrap_err(),
        UpdateGameError::TargetTimeInPast
    );
}

#[test]
fn same_seed_same_round() {
    let play = || {
        let mut game = Game::builder().seed(7).build();
        drive(
            &mut game,
            &[
                (0, None),
                (100, Some(Command::HardDrop)),
                (1000, None),
                (1100, Some(Command::MoveLeft)),
                (1200, Some(Command::HardDrop)),
                (2000, None),
            ],
        );
        game
    };
    let (a, b) = (play(), play());
    // Whole-game comparison, configuration included.
    assert_eq!(a, b);
    assert_eq!(a.state(), b.state());
    assert_eq!(a.phase(), b.phase());
}

#[test]
fn slowdown_re_pickup_refreshes_instead_of_stacking() {
    let mut board = Board::default();
    board[14][4] = Cell::PowerUp(PowerUpKind::Slowdown);
    board[10][4] = Cell::PowerUp(PowerUpKind::Slowdown);
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 2])
        .build();

    // The O-piece reaches the first cell after 8 fall steps of 500ms.
    drive(&mut game, &[(2000, None)]);
    assert_eq!(game.state().modifiers.slowdown_until, Some(ms(12000)));

    // Under the doubled interval it reaches the second cell 4s later.
    // Stacking would push the deadline to 22s; refreshing re-arms it to
    // a full 10s from the second pickup.
    drive(&mut game, &[(6000, None)]);
    assert_eq!(game.state().modifiers.slowdown_until, Some(ms(16000)));
}

#[test]
fn ghost_re_pickup_refreshes_the_charges() {
    let mut board = Board::default();
    board[17][4] = Cell::PowerUp(PowerUpKind::Ghost);
    board[15][4] = Cell::PowerUp(PowerUpKind::Ghost);
    let mut game = quiet_builder()
        .board(board)
        .next_pieces([Tetromino::O; 3])
        .build();

    // First pickup on the first fall step, then one placement spends a charge.
    drive(&mut game, &[(500, None), (600, Some(Command::HardDrop))]);
    assert_eq!(game.state().modifiers.ghost_turns_remaining, 2);

    // The next piece falls onto the second Ghost cell; charges reset to the
    // full count instead of accumulating to 5.
    drive(&mut game, &[(2150, None)]);
    assert_eq!(game.state().modifiers.ghost_turns_remaining, 3);
}

#[test]
fn random_power_up_resolves_to_one_concrete_effect() {
    // The roll depends on the PRNG, so play the same scripted round under
    // many seeds: every round must apply exactly one of the four concrete
    // effects, and across the seeds all four must show up.
    let mut outcomes = [0u32; 4];
    for seed in 0..64 {
        let mut board = Board::default();
        board[10][4] = Cell::PowerUp(PowerUpKind::Random);
        // A marker block inside the blast radius; only a Bomb removes it.
        board[8][2] = block();
        let mut game = Game::builder()
            .seed(seed)
            .power_up_chance(0.0)
            .obstacle_chance(0.0)
            .board(board)
            .next_pieces([Tetromino::O; 2])
            .build();

        let msgs = drive(&mut game, &[(4000, None)]);
        assert!(msgs.iter().any(|(_, fb)| matches!(
            fb,
            Feedback::PowerUpCollected {
                kind: PowerUpKind::Random,
                ..
            }
        )));
        assert!(game.state().board[10][4].is_empty());

        let bombed = game.state().board[8][2].is_empty();
        let slowed = game.state().modifiers.slowdown_until.is_some();
        let ghosted = game.state().modifiers.ghost_active();
        // A re-rolled Hammer still suspends the fall for its line input.
        let hammer_pending = game.phase().awaits_line_selection();

        let applied = [bombed, slowed, ghosted, hammer_pending];
        assert_eq!(
            applied.iter().filter(|effect| **effect).count(),
            1,
            "seed {seed} applied {applied:?}"
        );
        for (count, effect) in outcomes.iter_mut().zip(applied) {
            *count += u32::from(effect);
        }
    }
    assert!(
        outcomes.iter().all(|&count| count > 0),
        "some effect never rolled: {outcomes:?}"
    );
}
