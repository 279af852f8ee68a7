use std::io::{stdout, Stdout, Write};
use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyEvent};
use crossterm::style::{self, Color};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue, terminal, Result};

pub type TermInt = u16;
pub type Coords = (TermInt, TermInt);

const BORDER_COLOR: Color = Color::Grey;

#[derive(Copy, Clone, PartialEq)]
struct Glyph {
    ch: char,
    color: Color,
}

const BLANK: Glyph = Glyph { ch: ' ', color: Color::Reset };

/// Owns the terminal for the lifetime of the program. Everything drawn with
/// `print_at` is mirrored in `screen`, so redrawing an unchanged position is
/// a no-op and message boxes can be erased by restoring what was under them.
pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<Glyph>,
    current_msg: Option<Message>,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = stdout();
        let screen = vec![BLANK; width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen, cursor::Hide, cursor::DisableBlinking)?;
        terminal::enable_raw_mode()
    }

    pub fn restore(&mut self) -> Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, style::ResetColor, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    pub fn read_key_blocking(&self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                return Ok(ev);
            }
        }
    }

    /// Waits up to `timeout` for input, then drains whatever else is queued.
    pub fn read_key_events_queue(&self, timeout: Duration) -> Result<Vec<KeyEvent>> {
        let mut events = vec![];

        if !poll(timeout)? {
            return Ok(events);
        }

        loop {
            if let Event::Key(ev) = read()? {
                events.push(ev);
            }
            if !poll(Duration::from_millis(0))? {
                break;
            }
        }

        Ok(events)
    }

    pub fn get_terminal_size(&self) -> Coords {
        (self.width, self.height)
    }

    /// Draws a box whose outer corners are `top_left` and `top_left + size - 1`.
    pub fn draw_borders(&mut self, top_left: Coords, size: Coords) -> Result<()> {
        let (width, height) = size;
        let (x0, y0) = top_left;
        let end_x = x0 + width - 1;
        let end_y = y0 + height - 1;

        for x in x0..=end_x {
            let ch = if x == x0 || x == end_x {'+'} else {'-'};
            self.print_at((x, y0), ch, BORDER_COLOR)?;
            self.print_at((x, end_y), ch, BORDER_COLOR)?;
        }

        for y in y0 + 1..end_y {
            self.print_at((x0, y), '|', BORDER_COLOR)?;
            self.print_at((end_x, y), '|', BORDER_COLOR)?;
        }

        self.flush()
    }

    pub fn show_message(&mut self, lines: &[&str]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 4) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (
            center.0.saturating_sub(msg_width / 2),
            center.1.saturating_sub(msg_height / 2),
        );

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message { top_left, width: msg_width, height: msg_height });
        self.flush()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let (x0, y0) = msg.top_left;

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height {
            for x_diff in 0..msg.width {
                let pos = (x0 + x_diff, y0 + y_diff);
                if let Some(glyph) = self.glyph_at(pos) {
                    self.emit(pos, glyph)?;
                }
            }
        }

        self.flush()
    }

    /// Queues `ch` at `pos` unless the same glyph is already there.
    /// Positions outside the terminal are dropped.
    pub fn print_at(&mut self, pos: Coords, ch: char, color: Color) -> Result<()> {
        let glyph = Glyph { ch, color };
        let idx = match self.index(pos) {
            Some(idx) => idx,
            None => return Ok(()),
        };

        if self.screen[idx] == glyph {
            return Ok(());
        }

        self.screen[idx] = glyph;
        self.emit(pos, glyph)
    }

    pub fn print_str_at(&mut self, pos: Coords, text: &str, color: Color) -> Result<()> {
        for (x_diff, ch) in text.chars().enumerate() {
            self.print_at((pos.0 + x_diff as TermInt, pos.1), ch, color)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![BLANK; self.width as usize * self.height as usize];
        self.current_msg = None;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    ///////////////////////////////////////////////////////////////////////////

    fn index(&self, pos: Coords) -> Option<usize> {
        if pos.0 < self.width && pos.1 < self.height {
            Some(self.width as usize * pos.1 as usize + pos.0 as usize)
        } else {
            None
        }
    }

    fn glyph_at(&self, pos: Coords) -> Option<Glyph> {
        self.index(pos).map(|idx| self.screen[idx])
    }

    fn emit(&mut self, pos: Coords, glyph: Glyph) -> Result<()> {
        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetForegroundColor(glyph.color),
            style::Print(glyph.ch)
        )
    }

    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> Result<()> {
        // To be used for printing messages, where we don't wanna overwrite our
        // local buffer to restore it when the message is hidden
        if self.index(pos).is_none() {
            return Ok(());
        }
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::ResetColor, style::Print(ch))
    }
}
