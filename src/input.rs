use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::grid::Direction::{self, *};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Turn(Direction),
    Restart,
    Pause,
    Quit,
}

/// Maps a key press to a game command. Unbound keys give `None`.
pub fn command_for(ev: &KeyEvent) -> Option<Command> {
    if is_ctrl_c(ev) {
        return Some(Command::Quit);
    }

    let cmd = match ev.code {
        KeyCode::Char('w') | KeyCode::Up => Command::Turn(Up),
        KeyCode::Char('a') | KeyCode::Left => Command::Turn(Left),
        KeyCode::Char('s') | KeyCode::Down => Command::Turn(Down),
        KeyCode::Char('d') | KeyCode::Right => Command::Turn(Right),
        KeyCode::Char(' ') | KeyCode::Enter => Command::Restart,
        KeyCode::Char('p') => Command::Pause,
        KeyCode::Esc | KeyCode::Char('q') => Command::Quit,
        _ => return None,
    };

    Some(cmd)
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
