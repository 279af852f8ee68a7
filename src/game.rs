use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use crossterm::style::Color;
use tracing::{debug, info};

use crate::grid::{Grid, CELL_COLUMNS, CELL_ROWS};
use crate::input::{command_for, Command};
use crate::session::{LossReason, Session, Status, TickOutcome};
use crate::term::{Coords, TermInt, TermManager};

const HUD_ROWS: TermInt = 1;
// Widest possible HUD line: the score never exceeds 300, speed 15, level 6
const HUD_WIDTH: TermInt = 47;
const MIN_GRID_WIDTH: i32 = 10;
const MIN_GRID_HEIGHT: i32 = 5;

const SNAKE_BODY_CHAR: char = '█';
const DEAD_SNAKE_CHAR: char = 'X';
const SNAKE_COLOR: Color = Color::Green;
const DEAD_SNAKE_COLOR: Color = Color::DarkGrey;
const HUD_COLOR: Color = Color::White;

type CellGlyph = ([char; 2], Color);
const EMPTY_CELL: CellGlyph = ([' ', ' '], Color::Reset);

pub struct SnakeGame {
    term: TermManager,
    session: Session,
    paused: bool,
    origin: Coords,
    hud_x: TermInt,
}

/// Deadline of the next simulation step.
struct TickClock {
    next: Instant,
}

impl TickClock {
    fn new(now: Instant, interval: Duration) -> Self {
        TickClock { next: now + interval }
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// True once the deadline has passed; the next one is then set `interval` from `now`.
    fn advance(&mut self, now: Instant, interval: Duration) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + interval;
        true
    }

    fn reset(&mut self, now: Instant, interval: Duration) {
        self.next = now + interval;
    }
}

/// Picks the field size for a `term_width` x `term_height` terminal: at most
/// `max_width` x `max_height` cells, never smaller than the minimum field.
fn fit_grid(term_width: TermInt, term_height: TermInt, max_width: i32, max_height: i32) -> Result<Grid> {
    let fits = Grid::from_display(
        term_width.saturating_sub(2),
        term_height.saturating_sub(2 + HUD_ROWS),
        CELL_COLUMNS,
        CELL_ROWS,
    );
    if term_width < HUD_WIDTH || fits.width() < MIN_GRID_WIDTH || fits.height() < MIN_GRID_HEIGHT {
        return Err(eyre!(
            "Terminal is too small ({}x{}), at least {} columns and a field of {}x{} cells are needed",
            term_width, term_height, HUD_WIDTH, MIN_GRID_WIDTH, MIN_GRID_HEIGHT
        ));
    }

    Ok(Grid::new(
        fits.width().min(max_width.max(MIN_GRID_WIDTH)),
        fits.height().min(max_height.max(MIN_GRID_HEIGHT)),
    ))
}

impl SnakeGame {
    /// Fits a grid of at most `max_width` x `max_height` cells into the terminal.
    pub fn new(max_width: i32, max_height: i32, seed: u64) -> Result<Self> {
        let term = TermManager::new().wrap_err("Could not read the terminal size")?;
        let (w, h) = term.get_terminal_size();

        let grid = fit_grid(w, h, max_width, max_height)?;
        let field_width = grid.width() as TermInt * CELL_COLUMNS + 2;
        let origin = ((w - field_width) / 2, HUD_ROWS);
        let hud_x = origin.0.min(w - HUD_WIDTH);

        Ok(SnakeGame { term, session: Session::new(grid, seed), paused: false, origin, hud_x })
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.term.setup().wrap_err("Could not set up the terminal")?;
        Ok(())
    }

    pub fn restore(&mut self) -> Result<()> {
        self.term.restore().wrap_err("Could not restore the terminal")?;
        Ok(())
    }

    /// Returns `false` if the player chose to quit instead of starting.
    pub fn show_intro(&mut self) -> Result<bool> {
        self.draw_all()?;
        self.term.show_message(&[
            "Eat good fruit, AVOID APPLES!",
            "",
            "Arrow keys or WASD to move",
            "P to pause",
            "Esc, Q or CTRL+C to quit",
            "",
            "Press any key to begin",
        ])?;

        let key = self.term.read_key_blocking()?;
        if command_for(&key) == Some(Command::Quit) {
            return Ok(false);
        }

        self.term.hide_message()?;
        Ok(true)
    }

    /// Runs until the player quits.
    pub fn play(&mut self) -> Result<()> {
        let mut clock = TickClock::new(Instant::now(), self.session.tick_interval());

        loop {
            let timeout = clock.remaining(Instant::now());

            for key_ev in self.term.read_key_events_queue(timeout)? {
                match command_for(&key_ev) {
                    Some(Command::Quit) => {
                        info!(score = self.session.score(), seed = self.session.seed(), "quit");
                        return Ok(());
                    }
                    Some(Command::Turn(dir)) if !self.paused => self.session.change_direction(dir),
                    Some(Command::Pause) => self.toggle_pause()?,
                    Some(Command::Restart) => {
                        if self.restart()? {
                            clock.reset(Instant::now(), self.session.tick_interval());
                        }
                    }
                    _ => {}
                }
            }

            if !clock.advance(Instant::now(), self.session.tick_interval()) {
                continue;
            }

            if self.paused {
                continue;
            }

            let outcome = self.session.tick();
            if outcome == TickOutcome::Idle {
                continue;
            }

            debug!(?outcome, heading = ?self.session.snake().get_direction(), "tick");
            self.draw_all()?;

            match outcome {
                TickOutcome::Lost(reason) => self.game_over(Some(reason))?,
                TickOutcome::Won => self.game_over(None)?,
                _ => {}
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    /// Returns whether a new game was started.
    fn restart(&mut self) -> Result<bool> {
        if !self.session.restart() {
            return Ok(false);
        }
        self.term.clear()?;
        self.draw_all()?;
        Ok(true)
    }

    fn game_over(&mut self, reason: Option<LossReason>) -> Result<()> {
        let (title, detail) = match reason {
            None => ("YOU WIN!", "You completed all levels!"),
            Some(LossReason::Apple) => ("GAME OVER!", "You ate an apple!"),
            Some(LossReason::Wall) => ("GAME OVER!", "You hit the wall!"),
            Some(LossReason::SelfCollision) => ("GAME OVER!", "You bit yourself!"),
        };

        self.term.show_message(&[
            title,
            detail,
            &*format!("Final score: {}", self.session.score()),
            "",
            "Press SPACE to play again,",
            "or Esc to quit.",
        ])?;
        Ok(())
    }

    fn toggle_pause(&mut self) -> Result<()> {
        if self.session.status() != Status::Playing {
            return Ok(());
        }

        if !self.paused {
            self.term.show_message(&["Paused", "Press P to resume", "or Esc to quit"])?;
        } else {
            self.term.hide_message()?;
        }

        self.paused = !self.paused;
        Ok(())
    }

    fn draw_all(&mut self) -> Result<()> {
        let grid = *self.session.grid();
        let size = (
            grid.width() as TermInt * CELL_COLUMNS + 2,
            grid.height() as TermInt * CELL_ROWS + 2,
        );
        self.term.draw_borders(self.origin, size)?;
        self.print_hud()?;
        self.print_field()?;
        self.term.flush()?;
        Ok(())
    }

    fn print_hud(&mut self) -> Result<()> {
        let hud = hud_line(&self.session);
        self.term.print_str_at((self.hud_x, 0), &hud, HUD_COLOR)?;
        Ok(())
    }

    fn print_field(&mut self) -> Result<()> {
        let frame = field_frame(&self.session);
        let width = self.session.grid().width() as usize;

        for (i, (chars, color)) in frame.into_iter().enumerate() {
            let col = (i % width) as TermInt;
            let row = (i / width) as TermInt;
            let x = self.origin.0 + 1 + col * CELL_COLUMNS;
            let y = self.origin.1 + 1 + row * CELL_ROWS;
            for (dx, ch) in chars.iter().enumerate() {
                self.term.print_at((x + dx as TermInt, y), *ch, color)?;
            }
        }

        Ok(())
    }
}

fn hud_line(s: &Session) -> String {
    format!(
        "Score: {:<5} Level: {}  Progress: {}/{}  Speed: {:<2}",
        s.score(),
        s.level(),
        s.fruits_eaten_this_level(),
        s.fruits_needed(),
        s.speed(),
    )
}

/// Builds one glyph pair per grid cell, row by row.
fn field_frame(session: &Session) -> Vec<CellGlyph> {
    let grid = session.grid();
    let mut frame = vec![EMPTY_CELL; grid.cell_count()];
    let index = |col: i32, row: i32| row as usize * grid.width() as usize + col as usize;

    for fruit in session.fruits() {
        let style = fruit.kind().style();
        let pos = fruit.position();
        frame[index(pos.col, pos.row)] = ([style.glyph, ' '], style.color);
    }

    let dead = matches!(session.status(), Status::Lost(_));
    let snake = session.snake();
    for (i, pos) in snake.body().iter().enumerate() {
        if !grid.contains(*pos) {
            continue;
        }
        let glyph = match (dead, i) {
            (true, _) => ([DEAD_SNAKE_CHAR, DEAD_SNAKE_CHAR], DEAD_SNAKE_COLOR),
            (false, 0) => ([snake.head_char(), ' '], SNAKE_COLOR),
            (false, _) => ([SNAKE_BODY_CHAR, SNAKE_BODY_CHAR], SNAKE_COLOR),
        };
        frame[index(pos.col, pos.row)] = glyph;
    }

    frame
}
