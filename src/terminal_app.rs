use std::{
    collections::VecDeque,
    io::{self, Write},
    time::{Duration, Instant},
};

use crossterm::{
    cursor::{self, MoveTo},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::{self, Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
    ExecutableCommand,
};

use chaos_engine::{
    Board, Cell, Command, Feedback, Game, GameTime, Phase, PowerUpKind, Tetromino,
    UpdateGameError,
};

/// How many of the latest in-game notices are kept visible in the side panel.
const NOTICE_HISTORY: usize = 5;

/// Upper bound on how long the render loop waits for terminal input.
const FRAME_INTERVAL: Duration = Duration::from_millis(30);

pub struct Application<T: Write> {
    term: T,
    custom_seed: Option<u64>,
    custom_board: Option<String>,
    notices: VecDeque<String>,
}

impl<T: Write> Drop for Application<T> {
    fn drop(&mut self) {
        // (Try to) undo terminal setup.
        let _ = terminal::disable_raw_mode();
        let _ = self.term.execute(style::ResetColor);
        let _ = self.term.execute(cursor::Show);
        let _ = self.term.execute(terminal::LeaveAlternateScreen);
    }
}

impl<T: Write> Application<T> {
    pub const W_MAIN: u16 = 56;
    pub const H_MAIN: u16 = 22;

    pub fn new(mut term: T, custom_seed: Option<u64>, custom_board: Option<String>) -> Self {
        // Console prologue: Initialization.
        let _v = term.execute(terminal::EnterAlternateScreen);
        let _v = term.execute(terminal::SetTitle("Chaos Blocks Terminal User Interface"));
        let _v = term.execute(cursor::Hide);
        let _v = terminal::enable_raw_mode();
        Self {
            term,
            custom_seed,
            custom_board,
            notices: VecDeque::new(),
        }
    }

    fn fetch_main_xy() -> (u16, u16) {
        let (w_console, h_console) = terminal::size().unwrap_or((0, 0));
        (
            w_console.saturating_sub(Self::W_MAIN) / 2,
            h_console.saturating_sub(Self::H_MAIN) / 2,
        )
    }

    pub fn run(&mut self) -> io::Result<()> {
        let mut builder = Game::builder();
        if let Some(seed) = self.custom_seed {
            builder = builder.seed(seed);
        }
        if let Some(encoded) = self.custom_board.as_deref() {
            builder = builder.board(decode_board(encoded));
        }
        let mut game = builder.build();

        // The 'real-life' time at which the round started; in-game time is
        // measured as the duration elapsed since it.
        let time_started = Instant::now();

        loop {
            // Wait for input, but never past the next autonomous game event.
            let now = Instant::now().saturating_duration_since(time_started);
            let timeout = match game.peek_next_update_time() {
                Some(t) => t.saturating_sub(now).min(FRAME_INTERVAL),
                None => FRAME_INTERVAL,
            };

            let mut command = None;
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(KeyEvent {
                        code,
                        modifiers,
                        kind: KeyEventKind::Press,
                        state: _,
                    }) => match (code, modifiers) {
                        // [Esc] or [Ctrl+C]: Abort program.
                        (KeyCode::Esc, _) => break,
                        (KeyCode::Char('c' | 'C'), KeyModifiers::CONTROL) => break,
                        _ => command = map_key(code, game.phase().awaits_line_selection()),
                    },
                    Event::Resize(_, _) => {
                        // Need to redraw screen for proper centering etc.
                        self.term.execute(Clear(ClearType::All))?;
                    }
                    _ => {}
                }
            }

            // Worst case react to player input as quickly as possible now.
            let update_target_time = game
                .state()
                .time
                .max(Instant::now().saturating_duration_since(time_started));

            match game.update(update_target_time, command) {
                Ok(msgs) => self.digest_feedback(&msgs)?,
                // Final frame of an ended round; handled right below.
                Err(UpdateGameError::GameEnded) => {}
                Err(UpdateGameError::TargetTimeInPast) => unreachable!(),
            }

            self.render(&game)?;

            if game.over().is_some() {
                self.render_game_over(&game)?;
                // Leave the final screen up until any key is pressed.
                loop {
                    if let Event::Key(KeyEvent {
                        kind: KeyEventKind::Press,
                        ..
                    }) = event::read()?
                    {
                        break;
                    }
                }
                break;
            }
        }
        Ok(())
    }

    /// Turns engine feedback into side-panel notices and terminal bells.
    fn digest_feedback(&mut self, msgs: &[(GameTime, Feedback)]) -> io::Result<()> {
        for (_, feedback) in msgs {
            let notice = match feedback {
                Feedback::LinesCleared {
                    rows,
                    combo_multiplier,
                } => {
                    if *combo_multiplier > 1 {
                        format!("{} line(s) cleared, combo x{combo_multiplier}!", rows.len())
                    } else {
                        format!("{} line(s) cleared!", rows.len())
                    }
                }
                Feedback::PowerUpCollected { kind, .. } => format!("Collected {kind:?}!"),
                Feedback::PowerUpSpawned { .. } => "A power-up appeared...".to_owned(),
                Feedback::ObstacleSpawned { .. } => "An obstacle appeared!".to_owned(),
                Feedback::GameEnded { .. } => "Game over!".to_owned(),
                Feedback::SoundCue(_) => {
                    // The terminal bell is the best instrument we have.
                    self.term.write_all(b"\x07")?;
                    continue;
                }
                _ => continue,
            };
            self.notices.push_front(notice);
            self.notices.truncate(NOTICE_HISTORY);
        }
        Ok(())
    }

    fn render(&mut self, game: &Game) -> io::Result<()> {
        let (ox, oy) = Self::fetch_main_xy();
        let state = game.state();
        let now = state.time;

        // Playing field, rendered top row first, two columns per cell.
        let piece = game.phase().piece();
        let piece_tiles = piece.map(|p| p.tiles());
        for y in (0..Game::HEIGHT).rev() {
            let term_row = oy + (Game::HEIGHT - 1 - y) as u16;
            queue!(self.term, MoveTo(ox, term_row), ResetColor, Print("|"))?;
            for x in 0..Game::WIDTH {
                let under_piece = piece_tiles.is_some_and(|tiles| tiles.contains(&(x, y)));
                if under_piece {
                    if let Some(piece) = piece {
                        let glyph = if state.modifiers.ghost_active() {
                            "░░"
                        } else {
                            "██"
                        };
                        queue!(
                            self.term,
                            SetForegroundColor(tetromino_color(piece.shape)),
                            Print(glyph)
                        )?;
                        continue;
                    }
                }
                match state.board[y][x] {
                    Cell::Empty => queue!(self.term, ResetColor, Print("  "))?,
                    Cell::Block(shape) => queue!(
                        self.term,
                        SetForegroundColor(tetromino_color(shape)),
                        Print("██")
                    )?,
                    Cell::Obstacle => queue!(
                        self.term,
                        SetForegroundColor(Color::DarkGrey),
                        Print("▓▓")
                    )?,
                    Cell::PowerUp(kind) => queue!(
                        self.term,
                        SetForegroundColor(power_up_color(kind)),
                        Print(power_up_glyph(kind))
                    )?,
                }
            }
            queue!(self.term, ResetColor, Print("|"))?;
        }
        let floor_row = oy + Game::HEIGHT as u16;
        queue!(
            self.term,
            MoveTo(ox, floor_row),
            ResetColor,
            Print(format!("+{}+", "-".repeat(2 * Game::WIDTH)))
        )?;

        // Side panel.
        let px = ox + 2 * Game::WIDTH as u16 + 4;
        let mut panel_row = oy;
        let mut panel_line = |term: &mut T, text: String| -> io::Result<()> {
            queue!(
                term,
                MoveTo(px, panel_row),
                ResetColor,
                Clear(ClearType::UntilNewLine),
                Print(text)
            )?;
            panel_row += 1;
            Ok(())
        };

        let next: String = state
            .next_pieces
            .iter()
            .map(|shape| format!("{shape:?} "))
            .collect();
        panel_line(&mut self.term, format!("next:  {next}"))?;
        panel_line(&mut self.term, format!("score: {}", state.score))?;
        panel_line(&mut self.term, format!("lines: {}", state.lines_cleared))?;
        match state.combo {
            Some(combo) => panel_line(
                &mut self.term,
                format!(
                    "combo: x{} ({:.1}s)",
                    combo.count,
                    combo.deadline.saturating_sub(now).as_secs_f64()
                ),
            )?,
            None => panel_line(&mut self.term, String::new())?,
        }
        if state.modifiers.ghost_active() {
            panel_line(
                &mut self.term,
                format!("ghost: {} placements", state.modifiers.ghost_turns_remaining),
            )?;
        } else {
            panel_line(&mut self.term, String::new())?;
        }
        match state.modifiers.slowdown_until {
            Some(until) => panel_line(
                &mut self.term,
                format!("slow:  {:.1}s", until.saturating_sub(now).as_secs_f64()),
            )?,
            None => panel_line(&mut self.term, String::new())?,
        }
        panel_line(&mut self.term, String::new())?;
        for i in 0..NOTICE_HISTORY {
            let notice = self.notices.get(i).cloned().unwrap_or_default();
            panel_line(&mut self.term, notice)?;
        }

        // Status line under the field: Hammer prompt or keybinds legend.
        let status = if let Phase::SelectingLine { deadline, .. } = game.phase() {
            format!(
                "HAMMER! press 1-9 to smash a row ({:.1}s)",
                deadline.saturating_sub(now).as_secs_f64()
            )
        } else {
            "move: <- -> | rotate: z x | drop: v space | quit: Esc".to_owned()
        };
        queue!(
            self.term,
            MoveTo(ox, floor_row + 1),
            ResetColor,
            Clear(ClearType::UntilNewLine),
            Print(status)
        )?;

        self.term.flush()
    }

    fn render_game_over(&mut self, game: &Game) -> io::Result<()> {
        let (ox, oy) = Self::fetch_main_xy();
        let state = game.state();
        let lines = [
            "##  GAME OVER  ##".to_owned(),
            format!("final score: {}", state.score),
            format!("lines cleared: {}", state.lines_cleared),
            format!("seed: {}", game.state_init().seed),
            "(press any key)".to_owned(),
        ];
        for (i, line) in lines.iter().enumerate() {
            queue!(
                self.term,
                MoveTo(ox + 2, oy + 7 + i as u16),
                ResetColor,
                Clear(ClearType::UntilNewLine),
                Print(line)
            )?;
        }
        self.term.flush()
    }
}

fn map_key(code: KeyCode, awaits_line_selection: bool) -> Option<Command> {
    Some(match code {
        KeyCode::Char(c @ '1'..='9') if awaits_line_selection => {
            Command::SelectLine(c as u8 - b'0')
        }
        KeyCode::Left | KeyCode::Char('h') => Command::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Command::MoveRight,
        KeyCode::Up | KeyCode::Char('x') => Command::RotateCw,
        KeyCode::Char('z') => Command::RotateCcw,
        KeyCode::Down | KeyCode::Char('s') => Command::SoftDrop,
        KeyCode::Char(' ') | KeyCode::Enter => Command::HardDrop,
        _ => return None,
    })
}

fn tetromino_color(shape: Tetromino) -> Color {
    match shape {
        Tetromino::O => Color::Yellow,
        Tetromino::I => Color::Cyan,
        Tetromino::S => Color::Green,
        Tetromino::Z => Color::Red,
        Tetromino::T => Color::Magenta,
        Tetromino::L => Color::DarkYellow,
        Tetromino::J => Color::Blue,
    }
}

fn power_up_color(kind: PowerUpKind) -> Color {
    match kind {
        PowerUpKind::Bomb => Color::Red,
        PowerUpKind::Slowdown => Color::Cyan,
        PowerUpKind::Ghost => Color::White,
        PowerUpKind::Hammer => Color::Yellow,
        PowerUpKind::Random => Color::Magenta,
    }
}

fn power_up_glyph(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Bomb => "B!",
        PowerUpKind::Slowdown => "S!",
        PowerUpKind::Ghost => "G!",
        PowerUpKind::Hammer => "H!",
        PowerUpKind::Random => "?!",
    }
}

/// Decodes a `--board` string into a starting board, topmost row first.
fn decode_board(encoded: &str) -> Board {
    let mut board = Board::default();
    let chars: Vec<char> = encoded.chars().collect();
    for (i, row) in chars.chunks(Game::WIDTH).enumerate() {
        let Some(y) = Game::HEIGHT.checked_sub(i + 1) else {
            break;
        };
        for (x, c) in row.iter().enumerate() {
            board[y][x] = match c {
                ' ' => Cell::Empty,
                'X' => Cell::Obstacle,
                _ => Cell::Block(Tetromino::O),
            };
        }
    }
    board
}
