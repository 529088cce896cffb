/*!
This module implements the main [`Game::update`] loop.

The game is advanced by repeatedly handling whichever autonomous event
(spawn, fall, clear linger, line-selection timeout) is scheduled next, in
chronological order, until none is due before the requested target time.
A command, if any, is applied at the target time itself, after all earlier
autonomous events have been processed.
*/

use crate::{
    combo, line_clearing, power_ups, Cell, Command, Configuration, Feedback, FeedbackMessages,
    Game, GameOver, GameTime, Phase, Piece, SoundCue, State, UpdateGameError,
};

impl Game {
    /// Advances the game's state to the given in-game time, applying an
    /// optional command at that moment.
    ///
    /// `update_target_time` must be monotonically increasing across calls.
    /// All autonomous events scheduled before it are processed first, in
    /// order, so a round plays out identically no matter how the timeline is
    /// sliced into update calls.
    ///
    /// # Errors
    ///
    /// - [`UpdateGameError::GameEnded`] if the game has already ended.
    /// - [`UpdateGameError::TargetTimeInPast`] if `update_target_time` lies
    ///   before the game's current time.
    pub fn update(
        &mut self,
        update_target_time: GameTime,
        mut command: Option<Command>,
    ) -> Result<FeedbackMessages, UpdateGameError> {
        if matches!(self.phase, Phase::GameEnded { .. }) {
            return Err(UpdateGameError::GameEnded);
        }
        if update_target_time < self.state.time {
            return Err(UpdateGameError::TargetTimeInPast);
        }

        let mut msgs = FeedbackMessages::new();
        loop {
            match self.phase {
                Phase::GameEnded { .. } => return Ok(msgs),

                Phase::Spawning { spawn_time } if spawn_time <= update_target_time => {
                    self.state.time = spawn_time;
                    expire_timers(&mut self.state, spawn_time);
                    self.phase = do_spawn(&mut self.state, &self.config, spawn_time, &mut msgs);
                }

                Phase::Clearing { finish_time } if finish_time <= update_target_time => {
                    self.state.time = finish_time;
                    self.phase = Phase::Spawning {
                        spawn_time: finish_time + self.config.spawn_delay,
                    };
                }

                Phase::Falling {
                    piece,
                    next_fall_time,
                } if next_fall_time <= update_target_time => {
                    self.state.time = next_fall_time;
                    expire_timers(&mut self.state, next_fall_time);
                    self.phase = do_fall(&mut self.state, &self.config, piece, next_fall_time, &mut msgs);
                }

                // Selection window ran out: the Hammer is forfeited and the
                // piece resumes falling on a fresh fall timer.
                Phase::SelectingLine { piece, deadline } if deadline <= update_target_time => {
                    self.state.time = deadline;
                    expire_timers(&mut self.state, deadline);
                    self.phase = Phase::Falling {
                        piece,
                        next_fall_time: deadline + fall_interval(&self.state, &self.config),
                    };
                }

                // No autonomous event due before the target anymore.
                _ => {
                    self.state.time = update_target_time;
                    expire_timers(&mut self.state, update_target_time);
                    match command.take() {
                        Some(cmd) => {
                            self.phase = do_command(
                                &mut self.state,
                                &self.config,
                                self.phase,
                                cmd,
                                update_target_time,
                                &mut msgs,
                            );
                        }
                        None => return Ok(msgs),
                    }
                }
            }
        }
    }
}

/// The current time a piece takes to fall one cell, honoring Slowdown.
fn fall_interval(state: &State, config: &Configuration) -> GameTime {
    if state.modifiers.slowdown_active(state.time) {
        config.fall_delay * config.slowdown_factor
    } else {
        config.fall_delay
    }
}

/// Lapses the combo and the Slowdown timer if their deadlines have passed.
fn expire_timers(state: &mut State, now: GameTime) {
    combo::expire(&mut state.combo, now);
    if state.modifiers.slowdown_until.is_some_and(|until| until <= now) {
        state.modifiers.slowdown_until = None;
    }
}

/// Takes the next piece from the queue (restocking the preview) and puts it
/// into play, or ends the game if its spawn cells are blocked.
fn do_spawn(
    state: &mut State,
    config: &Configuration,
    spawn_time: GameTime,
    msgs: &mut FeedbackMessages,
) -> Phase {
    let State {
        rng,
        piece_generator,
        next_pieces,
        ..
    } = state;
    let restock = (config.piece_preview_count + 1).saturating_sub(next_pieces.len());
    next_pieces.extend(piece_generator.with_rng(rng).take(restock));
    let Some(shape) = next_pieces.pop_front() else {
        // The queue was restocked to at least one piece above.
        unreachable!()
    };

    let piece = Piece::spawned(shape);
    if !piece.fits(&state.board, state.modifiers.ghost_active()) {
        msgs.push((
            spawn_time,
            Feedback::GameEnded {
                score: state.score,
                lines_cleared: state.lines_cleared,
            },
        ));
        msgs.push((spawn_time, Feedback::SoundCue(SoundCue::GameOver)));
        return Phase::GameEnded {
            reason: GameOver::SpawnBlocked,
        };
    }

    msgs.push((spawn_time, Feedback::PieceSpawned { piece }));
    // A power-up may sit in the spawn cells; it is collected immediately.
    let hammer_pending = power_ups::collect_at_piece(state, config, &piece, spawn_time, msgs);
    if hammer_pending {
        Phase::SelectingLine {
            piece,
            deadline: spawn_time + config.line_select_window,
        }
    } else {
        Phase::Falling {
            piece,
            next_fall_time: spawn_time + fall_interval(state, config),
        }
    }
}

/// One autonomous fall step: drop the piece by one cell, or lock it if it
/// rests on a surface.
fn do_fall(
    state: &mut State,
    config: &Configuration,
    piece: Piece,
    fall_time: GameTime,
    msgs: &mut FeedbackMessages,
) -> Phase {
    let ghost = state.modifiers.ghost_active();
    let Some(dropped) = piece.fits_at(&state.board, (0, -1), ghost) else {
        return do_lock(state, config, piece, fall_time, msgs);
    };

    msgs.push((fall_time, Feedback::PieceMoved { piece: dropped }));
    let hammer_pending = power_ups::collect_at_piece(state, config, &dropped, fall_time, msgs);
    if hammer_pending {
        Phase::SelectingLine {
            piece: dropped,
            deadline: fall_time + config.line_select_window,
        }
    } else {
        Phase::Falling {
            piece: dropped,
            next_fall_time: fall_time + fall_interval(state, config),
        }
    }
}

/// Freezes the piece into the board and resolves everything that follows
/// from the placement.
fn do_lock(
    state: &mut State,
    config: &Configuration,
    piece: Piece,
    lock_time: GameTime,
    msgs: &mut FeedbackMessages,
) -> Phase {
    for (x, y) in piece.tiles() {
        state.board[y][x] = Cell::Block(piece.shape);
    }
    state.pieces_locked[piece.shape] += 1;
    msgs.push((lock_time, Feedback::PieceLocked { piece }));
    msgs.push((
        lock_time,
        Feedback::SoundCue(SoundCue::PieceNote(piece.shape)),
    ));
    // One Ghost charge is spent per placement, whether or not it was needed.
    if state.modifiers.ghost_turns_remaining > 0 {
        state.modifiers.ghost_turns_remaining -= 1;
    }

    let cleared = line_clearing::resolve_clears(state, config, lock_time, None, msgs);
    if cleared == 0 {
        Phase::Spawning {
            spawn_time: lock_time + config.spawn_delay,
        }
    } else {
        Phase::Clearing {
            finish_time: lock_time + config.line_clear_delay,
        }
    }
}

/// Applies one player command at `now`, returning the resulting phase.
///
/// Commands that make no sense in the current phase are ignored and leave
/// the game untouched.
fn do_command(
    state: &mut State,
    config: &Configuration,
    phase: Phase,
    cmd: Command,
    now: GameTime,
    msgs: &mut FeedbackMessages,
) -> Phase {
    match (phase, cmd) {
        (
            Phase::Falling {
                piece,
                next_fall_time,
            },
            Command::MoveLeft | Command::MoveRight | Command::RotateCw | Command::RotateCcw,
        ) => {
            let ghost = state.modifiers.ghost_active();
            let moved = match cmd {
                Command::MoveLeft => piece.fits_at(&state.board, (-1, 0), ghost),
                Command::MoveRight => piece.fits_at(&state.board, (1, 0), ghost),
                Command::RotateCw => config.rotation_system.rotate(&piece, &state.board, 1, ghost),
                Command::RotateCcw => {
                    config.rotation_system.rotate(&piece, &state.board, -1, ghost)
                }
                _ => unreachable!(),
            };
            let Some(moved) = moved else {
                return phase;
            };
            msgs.push((now, Feedback::PieceMoved { piece: moved }));
            let hammer_pending = power_ups::collect_at_piece(state, config, &moved, now, msgs);
            if hammer_pending {
                Phase::SelectingLine {
                    piece: moved,
                    deadline: now + config.line_select_window,
                }
            } else {
                // Sideways movement does not reset the fall timer.
                Phase::Falling {
                    piece: moved,
                    next_fall_time,
                }
            }
        }

        (Phase::Falling { piece, .. }, Command::SoftDrop) => {
            let ghost = state.modifiers.ghost_active();
            let Some(dropped) = piece.fits_at(&state.board, (0, -1), ghost) else {
                return do_lock(state, config, piece, now, msgs);
            };
            msgs.push((now, Feedback::PieceMoved { piece: dropped }));
            let hammer_pending = power_ups::collect_at_piece(state, config, &dropped, now, msgs);
            if hammer_pending {
                Phase::SelectingLine {
                    piece: dropped,
                    deadline: now + config.line_select_window,
                }
            } else {
                Phase::Falling {
                    piece: dropped,
                    next_fall_time: now + fall_interval(state, config),
                }
            }
        }

        (Phase::Falling { piece, .. }, Command::HardDrop) => {
            let ghost = state.modifiers.ghost_active();
            let landed = piece.teleported(&state.board, (0, -1), ghost);
            if landed != piece {
                msgs.push((now, Feedback::PieceMoved { piece: landed }));
            }
            // Only the landing cells collect; cells merely passed over don't.
            let hammer_pending = power_ups::collect_at_piece(state, config, &landed, now, msgs);
            if hammer_pending {
                Phase::SelectingLine {
                    piece: landed,
                    deadline: now + config.line_select_window,
                }
            } else {
                do_lock(state, config, landed, now, msgs)
            }
        }

        (Phase::SelectingLine { piece, deadline }, Command::SelectLine(n)) => {
            if power_ups::select_line(state, config, &piece, n, now, msgs) {
                Phase::Falling {
                    piece,
                    next_fall_time: now + fall_interval(state, config),
                }
            } else {
                // Invalid selection; keep waiting until the deadline.
                Phase::SelectingLine { piece, deadline }
            }
        }

        _ => phase,
    }
}
